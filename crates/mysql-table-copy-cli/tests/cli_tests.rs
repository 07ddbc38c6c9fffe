//! CLI integration tests for mysql-table-copy.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for error conditions detected before or while connecting.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::time::Duration;

/// Get a command for the mysql-table-copy binary with credential
/// environment variables cleared.
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("mysql-table-copy").unwrap();
    for var in [
        "SRC_MYSQL_USER",
        "SRC_MYSQL_PASSWORD",
        "TGT_MYSQL_USER",
        "TGT_MYSQL_PASSWORD",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_endpoint_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--src-table"))
        .stdout(predicate::str::contains("--src-socket"))
        .stdout(predicate::str::contains("--tgt-host"))
        .stdout(predicate::str::contains("--tgt-table"))
        .stdout(predicate::str::contains("--where"));
}

#[test]
fn test_help_shows_copy_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--mode"))
        .stdout(predicate::str::contains("--append"))
        .stdout(predicate::str::contains("--ignore"))
        .stdout(predicate::str::contains("--fk-checks"))
        .stdout(predicate::str::contains("--batch-bytes"))
        .stdout(predicate::str::contains("--select-schema"));
}

#[test]
fn test_help_shows_env_fallbacks() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("SRC_MYSQL_USER"))
        .stdout(predicate::str::contains("TGT_MYSQL_PASSWORD"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mysql-table-copy"));
}

#[test]
fn test_log_format_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"));
}

#[test]
fn test_output_json_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"));
}

// =============================================================================
// Exit Code Tests - Usage Errors (Exit Code 2)
// =============================================================================

#[test]
fn test_no_arguments_shows_usage() {
    cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"))
        .stderr(predicate::str::contains("--src-table"));
}

#[test]
fn test_unknown_mode_is_usage_error() {
    cmd()
        .args(["--src-table", "shop.orders", "--mode", "merge"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown copy mode"));
}

#[test]
fn test_mode_conflicts_with_append() {
    cmd()
        .args(["--src-table", "shop.orders", "--mode", "recreate", "--append"])
        .assert()
        .code(2);
}

// =============================================================================
// Exit Code Tests - Config Errors (Exit Code 1)
// =============================================================================

#[test]
fn test_unqualified_table_exits_with_code_1() {
    cmd()
        .args(["--src-table", "orders", "--tgt-host", "db2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_missing_target_host_exits_with_code_1() {
    cmd()
        .args(["--src-host", "db1", "--src-table", "shop.orders"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("target.host"));
}

#[test]
fn test_recreate_onto_source_exits_with_code_1() {
    cmd()
        .args([
            "--src-host",
            "db1",
            "--src-table",
            "shop.orders",
            "--tgt-host",
            "db1",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("same table"));
}

#[test]
fn test_zero_batch_bytes_exits_with_code_1() {
    cmd()
        .args([
            "--src-table",
            "shop.orders",
            "--tgt-host",
            "db2",
            "--batch-bytes",
            "0",
        ])
        .assert()
        .code(1);
}

#[test]
fn test_missing_config_exits_with_code_7() {
    // Missing file is an IO error (code 7), not config error (code 1)
    cmd()
        .args(["--config", "nonexistent_copy_config.yaml"])
        .assert()
        .code(7); // EXIT_IO_ERROR - file not found
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap()])
        .assert()
        .code(1); // EXIT_CONFIG_ERROR
}

#[test]
fn test_config_without_source_table_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "target:").unwrap();
    writeln!(file, "  host: db2").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("source.table"));
}

#[test]
fn test_unknown_yaml_mode_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source:").unwrap();
    writeln!(file, "  table: shop.orders").unwrap();
    writeln!(file, "copy:").unwrap();
    writeln!(file, "  mode: merge").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap()])
        .assert()
        .code(1);
}

// =============================================================================
// Exit Code Tests - Connection Errors (Exit Code 3)
// =============================================================================

#[test]
fn test_unreachable_source_exits_with_code_3() {
    // Nothing listens on port 1; the connection is refused immediately
    cmd()
        .args([
            "--src-host",
            "127.0.0.1",
            "--src-port",
            "1",
            "--src-table",
            "shop.orders",
            "--tgt-host",
            "127.0.0.1",
            "--tgt-port",
            "1",
            "--tgt-table",
            "shop.orders_copy",
        ])
        .timeout(Duration::from_secs(30))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("source"));
}

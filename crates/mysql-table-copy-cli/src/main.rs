//! mysql-table-copy CLI - copy a MySQL table between servers, schemas, or names.

use clap::Parser;
use mysql_table_copy::{
    Config, CopyError, CopyMode, EndpointConfig, ForeignKeyChecks, InterruptContext,
    Orchestrator, SignalAction,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser, Debug)]
#[command(name = "mysql-table-copy")]
#[command(about = "Copy a MySQL table to another server, schema, or table name")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file (command-line values override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source username
    #[arg(long, env = "SRC_MYSQL_USER")]
    src_user: Option<String>,

    /// Source password
    #[arg(long, env = "SRC_MYSQL_PASSWORD", hide_env_values = true)]
    src_password: Option<String>,

    /// Source host
    #[arg(long)]
    src_host: Option<String>,

    /// Source port [default: 3306]
    #[arg(long)]
    src_port: Option<u16>,

    /// Source socket (default /var/lib/mysql/mysql.sock when no host is given)
    #[arg(long)]
    src_socket: Option<String>,

    /// Source table as schema.table
    #[arg(long, required_unless_present = "config")]
    src_table: Option<String>,

    /// Row filter appended to the source query as WHERE <PREDICATE>
    #[arg(long = "where", value_name = "PREDICATE")]
    where_clause: Option<String>,

    /// Target username (defaults to the source username)
    #[arg(long, env = "TGT_MYSQL_USER")]
    tgt_user: Option<String>,

    /// Target password (defaults to the source password)
    #[arg(long, env = "TGT_MYSQL_PASSWORD", hide_env_values = true)]
    tgt_password: Option<String>,

    /// Target host
    #[arg(long)]
    tgt_host: Option<String>,

    /// Target port [default: 3306]
    #[arg(long)]
    tgt_port: Option<u16>,

    /// Target socket
    #[arg(long)]
    tgt_socket: Option<String>,

    /// Target table as schema.table (defaults to the source table)
    #[arg(long)]
    tgt_table: Option<String>,

    /// Target handling: recreate, append, append-ignore [default: recreate]
    #[arg(long)]
    mode: Option<CopyMode>,

    /// Append to the existing target table instead of recreating it
    #[arg(long, conflicts_with = "mode")]
    append: bool,

    /// Append and skip rows that hit a duplicate key (implies --append)
    #[arg(long, conflicts_with = "mode")]
    ignore: bool,

    /// Foreign key check suspension: enabled, transaction, statement [default: transaction]
    #[arg(long)]
    fk_checks: Option<ForeignKeyChecks>,

    /// Flush a batch once its INSERT statement exceeds this many bytes [default: 1048576]
    #[arg(long)]
    batch_bytes: Option<usize>,

    /// Issue USE <target schema> before every batch
    #[arg(long)]
    select_schema: bool,

    /// Log connections, progress markers, and timings
    #[arg(short, long)]
    verbose: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), CopyError> {
    let cli = Cli::parse();
    let start = Instant::now();

    setup_logging(cli.verbose, &cli.log_format);

    let config = build_config(&cli)?;
    info!(
        "Copying {} -> {} (mode: {})",
        config.source.table, config.target.table, config.copy.mode
    );

    // Setup signal handling: first signal warns, second within 3s aborts
    let interrupt = Arc::new(InterruptContext::default());
    setup_signal_handler(interrupt.clone())?;

    let copy = async {
        let orchestrator = Orchestrator::new(config).await?;
        orchestrator.run().await
    };

    let result = tokio::select! {
        result = copy => result?,
        _ = interrupt.cancelled() => return Err(CopyError::Cancelled),
    };

    if cli.output_json {
        println!("{}", result.to_json()?);
    } else {
        println!("{} rows inserted", result.rows_inserted);
        println!("Total runtime: {:.3?}", start.elapsed());
    }

    Ok(())
}

/// Load the optional YAML file, apply command-line overrides, then
/// fill defaults and validate.
fn build_config(cli: &Cli) -> Result<Config, CopyError> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, cli);
    config.finalize()
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    override_endpoint(
        &mut config.source,
        EndpointOverrides {
            user: &cli.src_user,
            password: &cli.src_password,
            host: &cli.src_host,
            port: cli.src_port,
            socket: &cli.src_socket,
            table: &cli.src_table,
        },
    );
    override_endpoint(
        &mut config.target,
        EndpointOverrides {
            user: &cli.tgt_user,
            password: &cli.tgt_password,
            host: &cli.tgt_host,
            port: cli.tgt_port,
            socket: &cli.tgt_socket,
            table: &cli.tgt_table,
        },
    );

    let copy = &mut config.copy;
    if let Some(mode) = cli.mode {
        copy.mode = mode;
    } else if cli.ignore {
        copy.mode = CopyMode::AppendIgnore;
    } else if cli.append {
        copy.mode = CopyMode::Append;
    }
    if let Some(ref predicate) = cli.where_clause {
        copy.where_clause = Some(predicate.clone());
    }
    if let Some(scope) = cli.fk_checks {
        copy.foreign_key_checks = scope;
    }
    if let Some(bytes) = cli.batch_bytes {
        copy.batch_bytes = bytes;
    }
    if cli.select_schema {
        copy.select_schema = true;
    }
}

struct EndpointOverrides<'a> {
    user: &'a Option<String>,
    password: &'a Option<String>,
    host: &'a Option<String>,
    port: Option<u16>,
    socket: &'a Option<String>,
    table: &'a Option<String>,
}

fn override_endpoint(endpoint: &mut EndpointConfig, cli: EndpointOverrides<'_>) {
    if let Some(user) = cli.user {
        endpoint.user = user.clone();
    }
    if let Some(password) = cli.password {
        endpoint.password = password.clone();
    }
    if let Some(host) = cli.host {
        endpoint.host = Some(host.clone());
        // A host given on the command line beats a socket from the file
        if cli.socket.is_none() {
            endpoint.socket = None;
        }
    }
    if let Some(port) = cli.port {
        endpoint.port = port;
    }
    if let Some(socket) = cli.socket {
        endpoint.socket = Some(socket.clone());
    }
    if let Some(table) = cli.table {
        endpoint.table = table.clone();
    }
}

/// Logs go to stderr so stdout carries only the summary or JSON result.
fn setup_logging(verbose: bool, format: &str) {
    let level = if verbose { Level::INFO } else { Level::WARN };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Setup signal handlers for SIGINT (Ctrl-C) and SIGTERM.
///
/// Every signal is recorded on the interrupt context, which cancels its
/// token on the second signal inside the grace window.
#[cfg(unix)]
fn setup_signal_handler(interrupt: Arc<InterruptContext>) -> Result<(), CopyError> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(()) = sigint.recv() => {}
                Some(()) = sigterm.recv() => {}
                else => break,
            }
            if interrupt.on_signal(Instant::now()) == SignalAction::Cancelled {
                break;
            }
        }
    });

    Ok(())
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler(interrupt: Arc<InterruptContext>) -> Result<(), CopyError> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt.on_signal(Instant::now()) == SignalAction::Cancelled {
                break;
            }
        }
    });

    Ok(())
}

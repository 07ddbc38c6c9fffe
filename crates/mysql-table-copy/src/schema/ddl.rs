//! Statement builders for provisioning and loading.

use crate::config::ForeignKeyChecks;
use crate::core::identifier::quote_ident;
use crate::error::{CopyError, Result};

const FK_CHECKS_OFF: &[u8] = b"SET foreign_key_checks = 0";
const FK_CHECKS_ON: &[u8] = b"SET foreign_key_checks = 1";

/// Replace the table identifier in a `CREATE TABLE` header.
///
/// Only the name after `CREATE TABLE [IF NOT EXISTS]` is touched; a
/// qualified `` `db`.`t` `` name is replaced as a whole. Column names,
/// comments, and constraint names that equal the old name are kept.
pub fn rewrite_table_name(ddl: &str, new_name: &str) -> Result<String> {
    let (start, end) = table_name_span(ddl).ok_or_else(|| {
        CopyError::Schema(format!(
            "cannot locate table name in creation statement: {}",
            truncate(ddl, 80)
        ))
    })?;
    Ok(format!(
        "{}{}{}",
        &ddl[..start],
        quote_ident(new_name),
        &ddl[end..]
    ))
}

fn table_name_span(ddl: &str) -> Option<(usize, usize)> {
    let mut pos = keyword(ddl, 0, "CREATE")?;
    pos = keyword(ddl, pos, "TABLE")?;
    if let Some(p) = keyword(ddl, pos, "IF")
        .and_then(|p| keyword(ddl, p, "NOT"))
        .and_then(|p| keyword(ddl, p, "EXISTS"))
    {
        pos = p;
    }

    let start = skip_ws(ddl, pos);
    let mut end = ident_end(ddl, start)?;
    if ddl[end..].starts_with('.') {
        end = ident_end(ddl, end + 1)?;
    }
    Some((start, end))
}

fn skip_ws(s: &str, pos: usize) -> usize {
    pos + s[pos..].len() - s[pos..].trim_start().len()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Match a keyword at `pos` (after whitespace); returns the position after it.
fn keyword(s: &str, pos: usize, kw: &str) -> Option<usize> {
    let start = skip_ws(s, pos);
    let end = start + kw.len();
    let candidate = s.get(start..end)?;
    if !candidate.eq_ignore_ascii_case(kw) {
        return None;
    }
    match s[end..].chars().next() {
        Some(c) if is_ident_char(c) => None,
        _ => Some(end),
    }
}

/// End of a backtick-quoted or bare identifier starting at `start`.
fn ident_end(s: &str, start: usize) -> Option<usize> {
    let rest = &s[start..];
    if let Some(body) = rest.strip_prefix('`') {
        let bytes = body.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'`' {
                if bytes.get(i + 1) == Some(&b'`') {
                    i += 2;
                    continue;
                }
                return Some(start + 1 + i + 1);
            }
            i += 1;
        }
        None
    } else {
        let len = rest
            .char_indices()
            .find(|(_, c)| !is_ident_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        (len > 0).then_some(start + len)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Lay out one transaction's statements with foreign key checks suspended
/// according to `scope`.
///
/// `setup` statements (such as `USE`) come first and are never wrapped
/// individually.
pub fn with_foreign_key_checks(
    scope: ForeignKeyChecks,
    setup: Vec<Vec<u8>>,
    body: Vec<Vec<u8>>,
) -> Vec<Vec<u8>> {
    let mut out = Vec::with_capacity(setup.len() + body.len() * 3 + 2);
    match scope {
        ForeignKeyChecks::Enabled => {
            out.extend(setup);
            out.extend(body);
        }
        ForeignKeyChecks::Transaction => {
            out.push(FK_CHECKS_OFF.to_vec());
            out.extend(setup);
            out.extend(body);
            out.push(FK_CHECKS_ON.to_vec());
        }
        ForeignKeyChecks::Statement => {
            out.extend(setup);
            for stmt in body {
                out.push(FK_CHECKS_OFF.to_vec());
                out.push(stmt);
                out.push(FK_CHECKS_ON.to_vec());
            }
        }
    }
    out
}

/// `USE <schema>`
pub fn use_schema(schema: &str) -> Vec<u8> {
    format!("USE {}", quote_ident(schema)).into_bytes()
}

/// `DROP TABLE IF EXISTS <table>`
pub fn drop_table(table: &str) -> Vec<u8> {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table)).into_bytes()
}

/// `CREATE DATABASE <schema> [DEFAULT CHARACTER SET <charset>]`
pub fn create_database(schema: &str, charset: Option<&str>) -> Vec<u8> {
    let mut sql = format!("CREATE DATABASE {}", quote_ident(schema));
    if let Some(cs) = charset.filter(|cs| is_charset_name(cs)) {
        sql.push_str(" DEFAULT CHARACTER SET ");
        sql.push_str(cs);
    }
    sql.into_bytes()
}

fn is_charset_name(cs: &str) -> bool {
    !cs.is_empty() && cs.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

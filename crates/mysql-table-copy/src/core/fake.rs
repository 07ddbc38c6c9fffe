//! In-memory source and target used by pipeline tests.
//!
//! `FakeTarget` interprets the small SQL subset the copier generates
//! (`USE`, `DROP TABLE IF EXISTS`, `CREATE TABLE`, `CREATE DATABASE`,
//! `SET foreign_key_checks`, `INSERT [IGNORE] INTO .. VALUES`) and parses
//! the literal tuples back into rows, so tests can compare what landed on
//! the target byte-for-byte with the source.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{CopyError, Result};

use super::identifier::TableRef;
use super::traits::{SourceReader, TargetWriter};
use super::value::{RawRow, RawValue};

type RowFilter = fn(&RawRow) -> bool;

/// Source backed by a fixed row set.
#[derive(Clone)]
pub struct FakeSource {
    pub create_statement: Option<String>,
    pub column_types: Vec<String>,
    pub charset: Option<String>,
    pub rows: Vec<RawRow>,
    /// Predicates the fake understands, keyed by their SQL text.
    pub filters: HashMap<String, RowFilter>,
    /// Fail while streaming, after this many rows have been sent.
    pub fail_after: Option<usize>,
    /// Stall in `close`, as a server session draining unread rows would.
    pub close_delay: Option<Duration>,
    pub queries: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<Mutex<bool>>,
}

impl FakeSource {
    pub fn new(create_statement: &str, column_types: &[&str], rows: Vec<RawRow>) -> Self {
        Self {
            create_statement: Some(create_statement.to_string()),
            column_types: column_types.iter().map(|s| s.to_string()).collect(),
            charset: Some("utf8mb4".to_string()),
            rows,
            filters: HashMap::new(),
            fail_after: None,
            close_delay: None,
            queries: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_filter(mut self, predicate: &str, filter: RowFilter) -> Self {
        self.filters.insert(predicate.to_string(), filter);
        self
    }
}

#[async_trait]
impl SourceReader for FakeSource {
    async fn create_table_statement(&mut self, _table: &TableRef) -> Result<Option<String>> {
        Ok(self.create_statement.clone())
    }

    async fn column_types(&mut self, _table: &TableRef) -> Result<Vec<String>> {
        if self.create_statement.is_none() {
            return Ok(Vec::new());
        }
        Ok(self.column_types.clone())
    }

    async fn schema_charset(&mut self, _schema: &str) -> Result<Option<String>> {
        Ok(self.charset.clone())
    }

    async fn stream_rows(&mut self, sql: &str, tx: mpsc::Sender<RawRow>) -> Result<u64> {
        self.queries.lock().unwrap().push(sql.to_string());

        let filter = match sql.split_once(" WHERE ") {
            Some((_, predicate)) => Some(
                *self
                    .filters
                    .get(predicate)
                    .ok_or_else(|| CopyError::database("SELECT", "unknown predicate"))?,
            ),
            None => None,
        };

        let mut sent = 0u64;
        for row in &self.rows {
            if filter.is_some_and(|f| !f(row)) {
                continue;
            }
            if self.fail_after == Some(sent as usize) {
                return Err(CopyError::database("reading rows", "lost connection"));
            }
            if tx.send(row.clone()).await.is_err() {
                break;
            }
            sent += 1;
        }
        Ok(sent)
    }

    async fn close(self: Box<Self>) {
        if let Some(delay) = self.close_delay {
            tokio::time::sleep(delay).await;
        }
        *self.closed.lock().unwrap() = true;
    }
}

/// One call made against the fake target.
#[derive(Debug, Clone, PartialEq)]
pub enum Executed {
    Statement(String),
    Transaction(Vec<String>),
}

#[derive(Debug, Clone, Default)]
pub struct TargetState {
    pub schemas: HashSet<String>,
    /// Table DDL keyed by `schema.table`.
    pub tables: BTreeMap<String, String>,
    pub rows: BTreeMap<String, Vec<RawRow>>,
    /// Column index treated as a unique key, per table.
    pub unique_column: Option<usize>,
    pub current_schema: Option<String>,
    pub log: Vec<Executed>,
    /// Fail the Nth (zero-based) transaction.
    pub fail_transaction: Option<usize>,
    pub transactions: usize,
    pub closed: bool,
}

impl TargetState {
    pub fn committed_transactions(&self) -> Vec<&Vec<String>> {
        self.log
            .iter()
            .filter_map(|e| match e {
                Executed::Transaction(stmts) => Some(stmts),
                Executed::Statement(_) => None,
            })
            .collect()
    }

    pub fn all_statements(&self) -> Vec<String> {
        self.log
            .iter()
            .flat_map(|e| match e {
                Executed::Statement(s) => vec![s.clone()],
                Executed::Transaction(stmts) => stmts.clone(),
            })
            .collect()
    }

    fn apply(&mut self, sql: &[u8]) -> std::result::Result<(), String> {
        let text = String::from_utf8_lossy(sql);
        let upper = text.to_ascii_uppercase();

        if upper.starts_with("SET FOREIGN_KEY_CHECKS") {
            Ok(())
        } else if let Some(rest) = strip(&text, "USE ") {
            let (schema, _) = parse_ident(rest)?;
            if !self.schemas.contains(&schema) {
                return Err(format!("Unknown database '{}'", schema));
            }
            self.current_schema = Some(schema);
            Ok(())
        } else if let Some(rest) = strip(&text, "CREATE DATABASE ") {
            let (schema, _) = parse_ident(rest)?;
            self.schemas.insert(schema);
            Ok(())
        } else if let Some(rest) = strip(&text, "DROP TABLE IF EXISTS ") {
            let key = self.table_key(rest)?;
            self.tables.remove(&key);
            self.rows.remove(&key);
            Ok(())
        } else if let Some(rest) = strip(&text, "CREATE TABLE ") {
            let key = self.table_key(rest)?;
            if self.tables.contains_key(&key) {
                return Err(format!("Table '{}' already exists", key));
            }
            self.tables.insert(key.clone(), text.to_string());
            self.rows.insert(key, Vec::new());
            Ok(())
        } else if let Some(rest) = strip(&text, "INSERT IGNORE INTO ") {
            self.insert(rest.as_bytes(), true)
        } else if let Some(rest) = strip(&text, "INSERT INTO ") {
            self.insert(rest.as_bytes(), false)
        } else {
            Err(format!("fake target cannot run: {}", text))
        }
    }

    fn table_key(&self, rest: &str) -> std::result::Result<String, String> {
        let (first, rest) = parse_ident(rest)?;
        if let Some(rest) = rest.strip_prefix('.') {
            let (table, _) = parse_ident(rest)?;
            return Ok(format!("{}.{}", first, table));
        }
        let schema = self
            .current_schema
            .clone()
            .ok_or_else(|| "No database selected".to_string())?;
        Ok(format!("{}.{}", schema, first))
    }

    fn insert(&mut self, rest: &[u8], ignore: bool) -> std::result::Result<(), String> {
        let head = String::from_utf8_lossy(rest);
        let key = self.table_key(&head)?;
        let pos = find(rest, b" VALUES ").ok_or("missing VALUES")?;
        let tuples = parse_tuples(&rest[pos + b" VALUES ".len()..])?;

        let unique = self.unique_column;
        let table = self
            .rows
            .get_mut(&key)
            .ok_or_else(|| format!("Table '{}' doesn't exist", key))?;
        for row in tuples {
            if let Some(idx) = unique {
                if table.iter().any(|r| r[idx] == row[idx]) {
                    if ignore {
                        continue;
                    }
                    return Err("Duplicate entry for key 'PRIMARY'".to_string());
                }
            }
            table.push(row);
        }
        Ok(())
    }
}

/// Target that applies generated SQL to in-memory tables.
#[derive(Clone, Default)]
pub struct FakeTarget {
    pub state: Arc<Mutex<TargetState>>,
}

impl FakeTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(self, schema: &str) -> Self {
        self.state.lock().unwrap().schemas.insert(schema.to_string());
        self
    }

    pub fn snapshot(&self) -> TargetState {
        self.state.lock().unwrap().clone()
    }

    pub fn rows(&self, table: &str) -> Vec<RawRow> {
        self.snapshot().rows.get(table).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl TargetWriter for FakeTarget {
    async fn schema_exists(&mut self, schema: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().schemas.contains(schema))
    }

    async fn execute(&mut self, sql: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .apply(sql)
            .map_err(|e| CopyError::database("execute", e))?;
        let text = String::from_utf8_lossy(sql).to_string();
        state.log.push(Executed::Statement(text));
        Ok(())
    }

    async fn execute_transaction(&mut self, statements: &[Vec<u8>]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let n = state.transactions;
        state.transactions += 1;
        if state.fail_transaction == Some(n) {
            return Err(CopyError::database("transaction", "injected failure"));
        }

        let mut working = state.clone();
        for stmt in statements {
            working
                .apply(stmt)
                .map_err(|e| CopyError::database("transaction", e))?;
        }
        working.log.push(Executed::Transaction(
            statements
                .iter()
                .map(|s| String::from_utf8_lossy(s).to_string())
                .collect(),
        ));
        *state = working;
        Ok(())
    }

    async fn close(self: Box<Self>) {
        self.state.lock().unwrap().closed = true;
    }
}

fn strip<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if text.len() >= prefix.len() && text[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse a backtick-quoted or bare identifier; returns it and the remainder.
fn parse_ident(s: &str) -> std::result::Result<(String, &str), String> {
    if let Some(body) = s.strip_prefix('`') {
        let mut out = String::new();
        let mut chars = body.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '`' {
                if matches!(chars.peek(), Some((_, '`'))) {
                    chars.next();
                    out.push('`');
                } else {
                    return Ok((out, &body[i + 1..]));
                }
            } else {
                out.push(c);
            }
        }
        Err("unterminated identifier".to_string())
    } else {
        let end = s
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(s.len());
        if end == 0 {
            return Err(format!("expected identifier at: {}", s));
        }
        Ok((s[..end].to_string(), &s[end..]))
    }
}

/// Parse `(v, ..), (v, ..)` literal tuples as MySQL would read them.
pub fn parse_tuples(input: &[u8]) -> std::result::Result<Vec<RawRow>, String> {
    let mut rows = Vec::new();
    let mut i = 0;
    loop {
        while i < input.len() && (input[i] == b',' || input[i].is_ascii_whitespace()) {
            i += 1;
        }
        if i >= input.len() {
            break;
        }
        if input[i] != b'(' {
            return Err(format!("expected '(' at byte {}", i));
        }
        i += 1;
        let mut row = Vec::new();
        loop {
            if input[i..].starts_with(b"NULL") {
                row.push(RawValue::Null);
                i += 4;
            } else if input[i] == b'\'' {
                i += 1;
                let mut value = Vec::new();
                loop {
                    let b = *input.get(i).ok_or("unterminated literal")?;
                    match b {
                        b'\\' => {
                            let next = *input.get(i + 1).ok_or("dangling escape")?;
                            value.push(match next {
                                b'n' => b'\n',
                                b'r' => b'\r',
                                b't' => b'\t',
                                b'0' => 0,
                                other => other,
                            });
                            i += 2;
                        }
                        b'\'' if input.get(i + 1) == Some(&b'\'') => {
                            value.push(b'\'');
                            i += 2;
                        }
                        b'\'' => {
                            i += 1;
                            break;
                        }
                        other => {
                            value.push(other);
                            i += 1;
                        }
                    }
                }
                row.push(RawValue::from_cell(Some(&value)));
            } else {
                return Err(format!("unexpected byte {:?} at {}", input[i] as char, i));
            }
            match input.get(i) {
                Some(b',') => i += 1,
                Some(b')') => {
                    i += 1;
                    break;
                }
                _ => return Err(format!("expected ',' or ')' at byte {}", i)),
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

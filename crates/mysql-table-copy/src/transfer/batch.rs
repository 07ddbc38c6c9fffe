//! Byte-bounded multi-row INSERT assembly.

use crate::config::CopyMode;
use crate::core::identifier::TableRef;
use crate::core::value::RawValue;

use super::encode::LiteralEncoder;

/// Default flush threshold: 1 MiB of statement text.
pub const DEFAULT_BATCH_BYTES: usize = 1_048_576;

/// Accumulates encoded rows into one `INSERT ... VALUES` statement.
///
/// The buffer always starts with the statement prefix; tuples are appended
/// comma-separated. [`BatchBuilder::is_full`] reports when the buffer has
/// grown past the threshold.
#[derive(Debug)]
pub struct BatchBuilder {
    buf: Vec<u8>,
    prefix_len: usize,
    max_bytes: usize,
    rows: usize,
}

impl BatchBuilder {
    pub fn new(table: &TableRef, mode: CopyMode, max_bytes: usize) -> Self {
        let verb = match mode {
            CopyMode::AppendIgnore => "INSERT IGNORE INTO",
            CopyMode::Recreate | CopyMode::Append => "INSERT INTO",
        };
        let prefix = format!("{} {} VALUES ", verb, table.qualified());
        let mut buf = Vec::with_capacity(max_bytes.saturating_add(prefix.len()).min(16 << 20));
        buf.extend_from_slice(prefix.as_bytes());
        Self {
            prefix_len: prefix.len(),
            buf,
            max_bytes,
            rows: 0,
        }
    }

    /// Encode and append one row.
    pub fn push_row(&mut self, encoder: &LiteralEncoder, row: &[RawValue]) {
        if self.rows > 0 {
            self.buf.push(b',');
        }
        encoder.encode_row(row, &mut self.buf);
        self.rows += 1;
    }

    /// True once the statement exceeds the byte threshold.
    pub fn is_full(&self) -> bool {
        self.buf.len() > self.max_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of rows currently buffered.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Current statement size in bytes, prefix included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// The statement built so far.
    pub fn statement(&self) -> &[u8] {
        &self.buf
    }

    /// Drop buffered tuples, keeping the prefix and the allocation.
    pub fn reset(&mut self) {
        self.buf.truncate(self.prefix_len);
        self.rows = 0;
    }
}

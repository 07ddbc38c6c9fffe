//! SQL literal rendering for raw rows.
//!
//! One escaping policy for every code path:
//!
//! | value                   | literal                          |
//! |-------------------------|----------------------------------|
//! | NULL                    | `NULL`                           |
//! | empty                   | `''`                             |
//! | non-empty, `Text`       | `'` + `\`→`\\`, `'`→`\'` + `'`   |
//! | non-empty, `Opaque`     | `'` + bytes as-is + `'`          |

use crate::core::value::RawValue;
use crate::schema::{ColumnKind, ColumnTypeProfile};

/// Renders rows as parenthesized literal tuples using a column profile.
#[derive(Debug, Clone)]
pub struct LiteralEncoder {
    profile: ColumnTypeProfile,
}

impl LiteralEncoder {
    pub fn new(profile: ColumnTypeProfile) -> Self {
        Self { profile }
    }

    pub fn arity(&self) -> usize {
        self.profile.len()
    }

    /// Append `(v1,v2,..)` for `row` to `out`.
    ///
    /// The caller guarantees `row.len() == self.arity()`.
    pub fn encode_row(&self, row: &[RawValue], out: &mut Vec<u8>) {
        out.push(b'(');
        for (i, (value, kind)) in row.iter().zip(self.profile.kinds()).enumerate() {
            if i > 0 {
                out.push(b',');
            }
            encode_value(value, *kind, out);
        }
        out.push(b')');
    }
}

/// Append the literal form of a single value.
pub fn encode_value(value: &RawValue, kind: ColumnKind, out: &mut Vec<u8>) {
    match value {
        RawValue::Null => out.extend_from_slice(b"NULL"),
        RawValue::Empty => out.extend_from_slice(b"''"),
        RawValue::Bytes(bytes) => {
            out.push(b'\'');
            match kind {
                ColumnKind::Text => escape_into(bytes, out),
                ColumnKind::Opaque => out.extend_from_slice(bytes),
            }
            out.push(b'\'');
        }
    }
}

/// Double backslashes, then escape single quotes.
fn escape_into(bytes: &[u8], out: &mut Vec<u8>) {
    out.reserve(bytes.len());
    for &b in bytes {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\'' => out.extend_from_slice(b"\\'"),
            other => out.push(other),
        }
    }
}

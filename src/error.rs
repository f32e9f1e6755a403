//! Crate-wide error taxonomy.
//!
//! Every fallible operation returns [`DatasetError`].  End-of-sequence on a
//! row reader is *not* an error: readers return `Ok(None)` once the source
//! is exhausted.

use std::io;
use thiserror::Error;

use crate::format::DataFormat;
use crate::hash::ContentKey;

#[derive(Error, Debug)]
pub enum DatasetError {
    /// A format name outside the known set.
    #[error("invalid DataFormat {0:?}")]
    InvalidFormat(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("content key not found: {0}")]
    NotFound(ContentKey),
    /// `row` is 1-based; 0 means the failure happened before the first data row.
    #[error("read error at row {row}: {reason}")]
    Read { row: usize, reason: String },
    #[error("write error: {0}")]
    Write(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// No inference path or row stream is registered for this format.
    #[error("no implementation registered for format {:?}", .0.name())]
    Undetermined(DataFormat),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("compression error: {0}")]
    Codec(String),
    #[error("structure mismatch: {0}")]
    Mismatch(String),
}

pub type Result<T> = std::result::Result<T, DatasetError>;

impl DatasetError {
    pub(crate) fn read(row: usize, reason: impl ToString) -> Self {
        DatasetError::Read { row, reason: reason.to_string() }
    }
}

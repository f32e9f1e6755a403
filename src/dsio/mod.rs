//! Row-oriented readers and writers.
//!
//! [`new_row_reader`] and [`new_row_writer`] dispatch on a structure's
//! format and hand back handles that think in rows: ordered sequences of
//! raw field bytes aligned with the structure's schema.  Callers never see
//! the concrete encoding.
//!
//! A reader returns `Ok(None)` once the source is exhausted; that is the
//! only end-of-sequence signal and it is never an error.  A writer owns
//! its sink until [`RowWriter::close`] flushes and releases it.  Dropping a
//! writer without closing it flushes on a best-effort basis.
//!
//! Compressed structures are handled here: sources are decompressed before
//! decoding and sinks are compressed when the writer is closed.

mod csv;
mod sink;

use std::io::{Cursor, Read, Write};

use crate::compression::decompress_reader;
use crate::error::{DatasetError, Result};
use crate::format::DataFormat;
use crate::structure::Structure;

pub use self::csv::{CsvReader, CsvWriter};
pub use self::sink::Sink;

/// One row: raw cell bytes in schema column order.
pub type Row = Vec<Vec<u8>>;

pub trait RowReader {
    /// The structure rows conform to.
    fn structure(&self) -> &Structure;

    /// Next row, or `Ok(None)` once the source is exhausted.
    fn read_row(&mut self) -> Result<Option<Row>>;
}

pub trait RowWriter {
    fn structure(&self) -> &Structure;

    /// Write one row.  A row whose width differs from the schema fails with
    /// `Validation` and writes nothing.
    fn write_row(&mut self, row: &[Vec<u8>]) -> Result<()>;

    /// Flush buffered output and release the sink.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Open a row reader over `source` for `st`.
pub fn new_row_reader<'a, R: Read + 'a>(st: &Structure, source: R) -> Result<Box<dyn RowReader + 'a>> {
    match st.format {
        DataFormat::Csv => {
            if st.compression.is_none() {
                Ok(Box::new(CsvReader::new(st, source)))
            } else {
                let raw = decompress_reader(st.compression, source)?;
                Ok(Box::new(CsvReader::new(st, Cursor::new(raw))))
            }
        }
        other => Err(DatasetError::Undetermined(other)),
    }
}

/// Open a row writer onto `sink` for `st`.
pub fn new_row_writer<'a, W: Write + 'a>(st: &Structure, sink: W) -> Result<Box<dyn RowWriter + 'a>> {
    match st.format {
        DataFormat::Csv => Ok(Box::new(CsvWriter::new(st, Sink::new(sink, st.compression)))),
        other => Err(DatasetError::Undetermined(other)),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Adapt a reader into an iterator.  Iteration ends after exhaustion or the
/// first error.
pub fn rows<'r>(reader: &'r mut dyn RowReader) -> impl Iterator<Item = Result<Row>> + 'r {
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        match reader.read_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                done = true;
                None
            }
            Err(e) => {
                done = true;
                Some(Err(e))
            }
        }
    })
}

/// Whether [`each_row`] should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Call `f` with each row and its 1-based number until the reader is
/// exhausted, `f` returns [`Flow::Stop`], or an error occurs.
pub fn each_row<F>(reader: &mut dyn RowReader, mut f: F) -> Result<()>
where
    F: FnMut(usize, Row) -> Result<Flow>,
{
    let mut num = 1;
    while let Some(row) = reader.read_row()? {
        if f(num, row)? == Flow::Stop {
            break;
        }
        num += 1;
    }
    Ok(())
}

/// Every row of `data`.
pub fn all_rows(st: &Structure, data: &[u8]) -> Result<Vec<Row>> {
    let mut reader = new_row_reader(st, data)?;
    let all: Result<Vec<Row>> = rows(reader.as_mut()).collect();
    all
}

/// Re-encode rows `[offset, offset + limit)` of `data` in `st`'s own format,
/// header included when the structure declares one.
pub fn raw_data_rows(st: &Structure, data: &[u8], limit: usize, offset: usize) -> Result<Vec<u8>> {
    let mut reader = new_row_reader(st, data)?;
    let mut out = Vec::new();
    let mut writer = new_row_writer(st, &mut out)?;
    each_row(reader.as_mut(), |num, row| {
        let i = num - 1;
        if i >= offset.saturating_add(limit) {
            return Ok(Flow::Stop);
        }
        if i >= offset {
            writer.write_row(&row)?;
        }
        Ok(Flow::Continue)
    })?;
    writer.close()?;
    Ok(out)
}

//! Schema inference.
//!
//! [`fields`] derives field names and datatypes from a sample of raw data
//! for a structure whose format is already known.  Only CSV has an
//! inference path; every other format reports
//! [`DatasetError::Undetermined`].
//!
//! Inference is a bounded sequential scan: at most one header candidate
//! plus [`DetectOptions::sample_size`] records are examined.  A malformed
//! record aborts the scan; the returned [`DetectError`] still carries the
//! fields computed up to that point, so callers can settle for a
//! best-effort schema.

mod csv;

use std::collections::HashSet;
use std::io::{Cursor, Read};

use thiserror::Error;

use crate::compression::{decompress_reader, Compression};
use crate::datatype::{parse_float, parse_integer};
use crate::error::DatasetError;
use crate::format::DataFormat;
use crate::format_config::{CsvOptions, FormatConfig};
use crate::structure::{valid_variable_name, Field, Schema, Structure};

/// Records sampled after the header candidate.
pub const DEFAULT_SAMPLE_SIZE: usize = 2000;

#[derive(Debug, Clone)]
pub struct DetectOptions {
    pub sample_size: usize,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self { sample_size: DEFAULT_SAMPLE_SIZE }
    }
}

/// Inference failure.  `fields` holds whatever was determined before the
/// failure; it is empty when not even a header candidate could be read.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct DetectError {
    pub fields: Vec<Field>,
    pub source: DatasetError,
}

impl DetectError {
    fn new(source: DatasetError) -> Self {
        DetectError { fields: Vec::new(), source }
    }
}

impl From<DetectError> for DatasetError {
    fn from(e: DetectError) -> Self {
        e.source
    }
}

/// Result of a successful inference run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detected {
    pub fields: Vec<Field>,
    /// The first record was judged to be a header row.
    pub header_row: bool,
}

impl Detected {
    /// A copy of `st` carrying the detected schema.  A detected header row
    /// also sets the CSV `header_row` option.
    pub fn apply(&self, st: &Structure) -> Structure {
        let mut out = st.clone().with_schema(Schema::new(self.fields.clone()));
        if self.header_row && st.format == DataFormat::Csv {
            out.format_config = Some(FormatConfig::Csv(CsvOptions { header_row: true }));
        }
        out
    }
}

/// Determine the fields of `data` interpreted through `st`.
pub fn fields<R: Read>(st: &Structure, data: R) -> Result<Detected, DetectError> {
    fields_with_options(st, data, &DetectOptions::default())
}

pub fn fields_with_options<R: Read>(
    st:   &Structure,
    data: R,
    opts: &DetectOptions,
) -> Result<Detected, DetectError> {
    match st.format {
        DataFormat::Unknown => Err(DetectError::new(DatasetError::Validation(
            "dataset format must be specified to determine fields".into(),
        ))),
        DataFormat::Csv => {
            if st.compression == Compression::None {
                csv::fields(data, opts)
            } else {
                let raw = decompress_reader(st.compression, data).map_err(DetectError::new)?;
                csv::fields(Cursor::new(raw), opts)
            }
        }
        other => Err(DetectError::new(DatasetError::Undetermined(other))),
    }
}

/// Infer a schema for `data` and return `st` with it applied.
pub fn structure<R: Read>(st: &Structure, data: R) -> Result<Structure, DetectError> {
    fields(st, data).map(|d| d.apply(st))
}

/// Best guess at whether a record is a header row.
///
/// A record is *not* a header if any cell, trimmed, is an integer or float
/// literal (`NaN` and `Inf` included), is empty, or is the keyword `true` or
/// `false`.  This cannot be
/// decided from content alone: a row of strings looks exactly like a header.
/// Callers that already know the destination schema should compare against
/// it instead of trusting this result.
pub fn possible_header_row<S: AsRef<str>>(record: &[S]) -> bool {
    record.iter().all(|raw| {
        let col = raw.as_ref().trim();
        !(col.is_empty()
            || parse_integer(col.as_bytes()).is_some()
            || parse_float(col.as_bytes()).is_some()
            || col == "true"
            || col == "false")
    })
}

/// Normalise a header cell to a camel-cased identifier:
/// `"First Name"` becomes `firstName`, `col_a` becomes `colA`.
pub fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let words = s.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty());
    for (i, word) in words.enumerate() {
        let word = if word.chars().any(char::is_lowercase) {
            word.to_owned()
        } else {
            word.to_lowercase()
        };
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Synthetic name for the column at zero-based position `i`.
pub fn positional_name(i: usize) -> String {
    format!("field_{}", i + 1)
}

/// Field name for a header cell, falling back to the positional name when
/// the cell yields no valid variable name.
fn header_field_name(cell: &str, i: usize) -> String {
    let name = camelize(cell);
    if valid_variable_name(&name) {
        return name;
    }
    let prefixed = format!("field_{name}");
    if !name.is_empty() && valid_variable_name(&prefixed) {
        prefixed
    } else {
        positional_name(i)
    }
}

/// Field names for a header record.  A name already taken by an earlier
/// column gets the column's position appended.
pub(crate) fn header_field_names<'a, I>(cells: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for (i, cell) in cells.into_iter().enumerate() {
        let base = header_field_name(cell, i);
        let mut name = base.clone();
        let mut n = i + 1;
        while seen.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }
    names
}

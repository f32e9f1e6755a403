use std::io::{Read, Write};

use log::{debug, warn};

use super::{Row, RowReader, RowWriter, Sink};
use crate::error::{DatasetError, Result};
use crate::structure::Structure;

// ── Reader ───────────────────────────────────────────────────────────────────

/// Schema-aware CSV row reader.  Skips the header record when the
/// structure declares one; every other record must be as wide as the schema.
pub struct CsvReader<R: Read> {
    st:     Structure,
    rdr:    ::csv::Reader<R>,
    record: ::csv::ByteRecord,
    /// Number of the last row handed out, 1-based.
    row:    usize,
}

impl<R: Read> CsvReader<R> {
    pub fn new(st: &Structure, source: R) -> Self {
        let rdr = ::csv::ReaderBuilder::new()
            .has_headers(st.header_row())
            .flexible(true)
            .from_reader(source);
        CsvReader { st: st.clone(), rdr, record: ::csv::ByteRecord::new(), row: 0 }
    }
}

impl<R: Read> RowReader for CsvReader<R> {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn read_row(&mut self) -> Result<Option<Row>> {
        let num = self.row + 1;
        match self.rdr.read_byte_record(&mut self.record) {
            Ok(false) => return Ok(None),
            Ok(true) => {}
            Err(e) => return Err(DatasetError::read(num, e)),
        }
        self.row = num;

        if let Some(width) = expected_width(&self.st).filter(|w| *w != self.record.len()) {
            warn!("csv row {num} has {} fields, schema has {width}", self.record.len());
            return Err(DatasetError::read(
                num,
                format!("expected {width} fields, got {}", self.record.len()),
            ));
        }
        Ok(Some(self.record.iter().map(<[u8]>::to_vec).collect()))
    }
}

// ── Writer ───────────────────────────────────────────────────────────────────

/// Schema-aware CSV row writer.  Emits the header row ahead of the first
/// data row when the structure declares one.
pub struct CsvWriter<W: Write> {
    st:             Structure,
    wtr:            ::csv::Writer<Sink<W>>,
    header_written: bool,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(st: &Structure, sink: Sink<W>) -> Self {
        let wtr = ::csv::WriterBuilder::new().from_writer(sink);
        CsvWriter { st: st.clone(), wtr, header_written: !st.header_row() }
    }

    fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(());
        }
        let names: Vec<&str> = self.st.fields().iter().map(|f| f.name.as_str()).collect();
        debug!("csv writer emitting header {:?}", names);
        self.wtr.write_record(&names).map_err(write_err)?;
        self.header_written = true;
        Ok(())
    }
}

impl<W: Write> RowWriter for CsvWriter<W> {
    fn structure(&self) -> &Structure {
        &self.st
    }

    fn write_row(&mut self, row: &[Vec<u8>]) -> Result<()> {
        if let Some(width) = expected_width(&self.st).filter(|w| *w != row.len()) {
            return Err(DatasetError::Validation(format!(
                "row has {} fields, schema has {width}",
                row.len()
            )));
        }
        self.write_header()?;
        self.wtr.write_record(row).map_err(write_err)
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.write_header()?;
        let mut sink = self
            .wtr
            .into_inner()
            .map_err(|e| DatasetError::Write(e.error().to_string()))?;
        sink.finish()
    }
}

/// Row width both directions enforce: the schema's field count, or none
/// when the structure has no schema.
fn expected_width(st: &Structure) -> Option<usize> {
    st.schema.as_ref().map(|s| s.fields.len())
}

fn write_err(e: ::csv::Error) -> DatasetError {
    DatasetError::Write(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::Compression;
    use crate::datatype::Type;
    use crate::format::DataFormat;
    use crate::format_config::CsvOptions;
    use crate::structure::{Field, Schema};

    fn abcd(header_row: bool) -> Structure {
        Structure::new(DataFormat::Csv)
            .with_format_config(CsvOptions { header_row })
            .with_schema(Schema::new(
                ["col_a", "col_b", "col_c", "col_d"]
                    .iter()
                    .map(|n| Field::new(*n, Type::String))
                    .collect(),
            ))
    }

    fn row(cells: &[&str]) -> Vec<Vec<u8>> {
        cells.iter().map(|c| c.as_bytes().to_vec()).collect()
    }

    #[test]
    fn reader_without_header_reads_every_record() {
        let mut r = CsvReader::new(&abcd(false), &b"a,b,c,d\ne,f,g,h\n"[..]);
        assert_eq!(r.read_row().unwrap(), Some(row(&["a", "b", "c", "d"])));
        assert_eq!(r.read_row().unwrap(), Some(row(&["e", "f", "g", "h"])));
        assert_eq!(r.read_row().unwrap(), None);
        // exhaustion is sticky and never an error
        assert_eq!(r.read_row().unwrap(), None);
    }

    #[test]
    fn quoted_cells_are_unescaped() {
        let mut r = CsvReader::new(&abcd(false), &b"\"a,1\",\"say \"\"hi\"\"\",c,\n"[..]);
        let got = r.read_row().unwrap().unwrap();
        assert_eq!(got, row(&["a,1", "say \"hi\"", "c", ""]));
    }

    #[test]
    fn wrong_width_is_a_read_error_with_row_number() {
        let mut r = CsvReader::new(&abcd(true), &b"col_a,col_b,col_c,col_d\na,b,c,d\na,b\n"[..]);
        assert!(r.read_row().unwrap().is_some());
        match r.read_row() {
            Err(DatasetError::Read { row, reason }) => {
                assert_eq!(row, 2);
                assert!(reason.contains("expected 4"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn writer_emits_header_once() {
        let mut out = Vec::new();
        let st = abcd(true);
        let mut w: Box<dyn RowWriter + '_> = Box::new(CsvWriter::new(&st, Sink::new(&mut out, Compression::None)));
        w.write_row(&row(&["a", "b", "c", "d"])).unwrap();
        w.write_row(&row(&["e", "f", "g", "h"])).unwrap();
        w.close().unwrap();
        assert_eq!(out, b"col_a,col_b,col_c,col_d\na,b,c,d\ne,f,g,h\n".to_vec());
    }

    #[test]
    fn writer_with_no_rows_still_writes_header() {
        let mut out = Vec::new();
        let st = abcd(true);
        let w: Box<dyn RowWriter + '_> = Box::new(CsvWriter::new(&st, Sink::new(&mut out, Compression::None)));
        w.close().unwrap();
        assert_eq!(out, b"col_a,col_b,col_c,col_d\n".to_vec());
    }

    #[test]
    fn writer_quotes_when_needed() {
        let mut out = Vec::new();
        let st = abcd(false);
        let mut w: Box<dyn RowWriter + '_> = Box::new(CsvWriter::new(&st, Sink::new(&mut out, Compression::None)));
        w.write_row(&row(&["a,b", "\"q\"", "", "d"])).unwrap();
        w.close().unwrap();
        assert_eq!(out, b"\"a,b\",\"\"\"q\"\"\",,d\n".to_vec());
    }

    #[test]
    fn wrong_width_writes_nothing() {
        let mut out = Vec::new();
        let st = abcd(false);
        let mut w: Box<dyn RowWriter + '_> = Box::new(CsvWriter::new(&st, Sink::new(&mut out, Compression::None)));
        w.write_row(&row(&["a", "b", "c", "d"])).unwrap();
        let err = w.write_row(&row(&["x", "y", "z"])).unwrap_err();
        assert!(matches!(err, DatasetError::Validation(_)));
        w.close().unwrap();
        assert_eq!(out, b"a,b,c,d\n".to_vec());
    }

    #[test]
    fn width_rule_matches_in_both_directions() {
        let empty = Structure::new(DataFormat::Csv).with_schema(Schema::new(Vec::new()));
        let mut r = CsvReader::new(&empty, &b"a,b\n"[..]);
        assert!(matches!(r.read_row(), Err(DatasetError::Read { row: 1, .. })));
        let mut out = Vec::new();
        let mut w: Box<dyn RowWriter + '_> = Box::new(CsvWriter::new(&empty, Sink::new(&mut out, Compression::None)));
        assert!(matches!(w.write_row(&row(&["a", "b"])), Err(DatasetError::Validation(_))));
        w.close().unwrap();

        // without a schema any width passes
        let bare = Structure::new(DataFormat::Csv);
        let mut r = CsvReader::new(&bare, &b"a,b\nc\n"[..]);
        assert_eq!(r.read_row().unwrap(), Some(row(&["a", "b"])));
        assert_eq!(r.read_row().unwrap(), Some(row(&["c"])));
        let mut out = Vec::new();
        let mut w: Box<dyn RowWriter + '_> = Box::new(CsvWriter::new(&bare, Sink::new(&mut out, Compression::None)));
        w.write_row(&row(&["a", "b"])).unwrap();
        w.write_row(&row(&["c"])).unwrap();
        w.close().unwrap();
        assert_eq!(out, b"a,b\nc\n".to_vec());
    }
}

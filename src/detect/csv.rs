use std::io::Read;

use log::debug;

use super::{header_field_names, positional_name, possible_header_row, DetectError, DetectOptions, Detected};
use crate::datatype::{classify, Type, TypeTally};
use crate::error::DatasetError;
use crate::structure::Field;

/// Determine field names and types of CSV-formatted data.
pub(super) fn fields<R: Read>(data: R, opts: &DetectOptions) -> Result<Detected, DetectError> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(::csv::Trim::Fields)
        .from_reader(data);

    let mut header = ::csv::StringRecord::new();
    match rdr.read_record(&mut header) {
        Ok(true) => {}
        Ok(false) => return Err(DetectError::new(DatasetError::read(0, "empty input: no header record"))),
        Err(e) => return Err(DetectError::new(DatasetError::read(0, e))),
    }

    let mut tallies = vec![TypeTally::default(); header.len()];
    let header_row = possible_header_row(&header.iter().collect::<Vec<_>>());
    debug!("csv header candidate {:?} judged header={}", header, header_row);

    let mut fields: Vec<Field> = if header_row {
        header_field_names(header.iter())
            .into_iter()
            .map(|name| Field::new(name, Type::Any))
            .collect()
    } else {
        for (tally, cell) in tallies.iter_mut().zip(header.iter()) {
            tally.add(classify(cell.as_bytes()));
        }
        (0..header.len()).map(|i| Field::new(positional_name(i), Type::Any)).collect()
    };

    // data rows are numbered from 1; a header that is really data is row 1
    let first_row = if header_row { 1 } else { 2 };
    let mut record = ::csv::StringRecord::new();
    let mut sampled = 0;
    loop {
        if sampled == opts.sample_size {
            debug!("csv inference stopped at sample cap of {} records", opts.sample_size);
            break;
        }
        match rdr.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                resolve(&mut fields, &tallies);
                return Err(DetectError {
                    fields,
                    source: DatasetError::read(first_row + sampled, e),
                });
            }
        }
        for (tally, cell) in tallies.iter_mut().zip(record.iter()) {
            tally.add(classify(cell.as_bytes()));
        }
        sampled += 1;
    }

    resolve(&mut fields, &tallies);
    Ok(Detected { fields, header_row })
}

fn resolve(fields: &mut [Field], tallies: &[TypeTally]) {
    for (f, tally) in fields.iter_mut().zip(tallies) {
        f.field_type = tally.winner();
    }
}

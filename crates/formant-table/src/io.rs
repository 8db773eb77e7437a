//! CSV reading and writing

use crate::error::{Result, TableError};
use crate::table::{Column, FormantTable};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// Default column delimiter for both input and output
pub const DEFAULT_DELIMITER: u8 = b',';

/// Byte form of a delimiter character
pub fn delimiter(sep: char) -> Result<u8> {
    u8::try_from(sep)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(TableError::InvalidDelimiter(sep))
}

/// Read a delimited table with a header row.
///
/// A column is numeric when every non-empty cell parses as a number;
/// empty cells of numeric columns become NaN.
pub fn read_csv<R: Read>(reader: R, delimiter: u8) -> Result<FormantTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(TableError::MissingHeader);
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
        let record = record?;
        for (i, field) in record.iter().enumerate() {
            cells[i].push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| (name, infer_column(values)));
    let table = FormantTable::from_columns(columns)?;
    debug!(
        "Read table with {} rows and {} columns",
        table.n_rows(),
        table.n_columns()
    );
    Ok(table)
}

/// Read a delimited table from a file
pub fn read_csv_path(path: impl AsRef<Path>, delimiter: u8) -> Result<FormantTable> {
    let file = File::open(path.as_ref())?;
    read_csv(file, delimiter)
}

/// Write a table with a header row
pub fn write_csv<W: Write>(table: &FormantTable, writer: W, delimiter: u8) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    wtr.write_record(table.column_names())?;
    let columns = table
        .column_names()
        .iter()
        .map(|name| table.column(name))
        .collect::<Result<Vec<_>>>()?;
    for row in 0..table.n_rows() {
        wtr.write_record(columns.iter().map(|c| c.label(row)))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a table to a file, replacing it
pub fn write_csv_path(table: &FormantTable, path: impl AsRef<Path>, delimiter: u8) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_csv(table, file, delimiter)
}

fn infer_column(values: Vec<String>) -> Column {
    let mut any = false;
    let mut parsed = Vec::with_capacity(values.len());
    for value in &values {
        if value.is_empty() {
            parsed.push(f64::NAN);
            continue;
        }
        match value.parse::<f64>() {
            Ok(v) => {
                any = true;
                parsed.push(v);
            }
            Err(_) => return Column::Text(values),
        }
    }
    if any {
        Column::Numeric(parsed)
    } else {
        Column::Text(values)
    }
}

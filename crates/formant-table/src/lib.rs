//! Formant Tables
//!
//! Column-oriented tables of vowel formant measurements, CSV I/O,
//! column resolution by name or pattern, and row grouping.

mod columns;
mod error;
mod io;
mod table;

pub use columns::ColumnSpec;
pub use error::{Result, TableError};
pub use io::{delimiter, read_csv, read_csv_path, write_csv, write_csv_path, DEFAULT_DELIMITER};
pub use table::{Column, FormantTable, Group};

//! Table Error Types

use thiserror::Error;

/// Errors raised while building, reading or querying a formant table
#[derive(Debug, Error)]
pub enum TableError {
    /// Column not present in the table
    #[error("Column {0} not in table")]
    MissingColumn(String),

    /// Column exists but holds text where numbers are required
    #[error("Column {0} is not numeric")]
    NotNumeric(String),

    /// Column exists but holds numbers where labels are required
    #[error("Column {0} is not a text column")]
    NotText(String),

    /// Column length does not match the table
    #[error("Column {name} has {actual} rows, table has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Same column name given twice
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// Regular expression failed to compile
    #[error("Invalid column pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Pattern matched no column
    #[error("No columns match pattern {0}")]
    NoColumnsMatched(String),

    /// Row index beyond the table
    #[error("Row {index} out of range for table with {rows} rows")]
    RowOutOfRange { index: usize, rows: usize },

    /// Delimiter is not a single ASCII character
    #[error("Delimiter {0:?} is not an ASCII character")]
    InvalidDelimiter(char),

    /// Input had no header row
    #[error("Missing header row")]
    MissingHeader,

    /// CSV reader/writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias
pub type Result<T> = std::result::Result<T, TableError>;

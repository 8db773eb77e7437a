use formant_stats::StatsError;
use formant_table::TableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("No rows for {column} = {value}")]
    MissingGroup { column: String, value: String },

    #[error("Invalid plot parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to write figure: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlotError>;

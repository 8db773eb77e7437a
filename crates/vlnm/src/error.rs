use formant_table::TableError;
use thiserror::Error;
use vowel_normalizers::NormalizeError;
use vowel_plot::PlotError;

#[derive(Debug, Error)]
pub enum VlnmError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Plot(#[from] PlotError),

    #[error("Configuration has neither a normalize nor a plot job")]
    NothingToDo,

    #[error("Plot job has no input and there is no normalize job")]
    MissingPlotInput,
}

pub type Result<T> = std::result::Result<T, VlnmError>;

//! Statistics Error Types

use thiserror::Error;

/// Errors raised by conversions and matrix routines
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// Unrecognised conversion method name
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// No observations
    #[error("No observations")]
    Empty,

    /// Not enough observations for the statistic
    #[error("Need at least {needed} observations, got {got}")]
    TooFewObservations { needed: usize, got: usize },

    /// Matrix is not square
    #[error("Matrix is {rows}x{cols}, expected a square matrix")]
    NotSquare { rows: usize, cols: usize },

    /// Matrix contains NaN or infinite entries
    #[error("Matrix contains non-finite values")]
    NonFinite,

    /// Matrix cannot be inverted or whitened
    #[error("Matrix is singular")]
    Singular,
}

/// Convenience result alias
pub type Result<T> = std::result::Result<T, StatsError>;

//! Normalization Error Types

use formant_stats::StatsError;
use formant_table::TableError;
use thiserror::Error;

/// Errors raised while constructing, looking up or running a normalizer
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Table access failed
    #[error(transparent)]
    Table(#[from] TableError),

    /// Statistics routine failed
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// No formant columns could be resolved
    #[error("No formant columns found for {0}")]
    NoFormants(String),

    /// Formant slots resolved to lists of differing length
    #[error("Formant slot {slot} has {actual} columns, expected {expected}")]
    SlotLengthMismatch {
        slot: String,
        expected: usize,
        actual: usize,
    },

    /// A reference vowel is absent for a speaker
    #[error("Vowel {vowel} not found for speaker {speaker}")]
    MissingVowel { speaker: String, vowel: String },

    /// Gender labels could not be determined
    #[error("Cannot determine {0} label in gender column")]
    MissingGenderLabel(&'static str),

    /// A parameter value is unusable
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Outputs from different groups disagree
    #[error("Inconsistent output column {0}")]
    InconsistentOutput(String),

    /// Name already registered
    #[error("Normalizer {0} is already registered")]
    DuplicateName(String),

    /// Name not registered
    #[error("Unknown normalizer: {0}")]
    UnknownName(String),

    /// Prefix matches several registered names
    #[error("Ambiguous normalizer {name}, could be any of {}", candidates.join(", "))]
    AmbiguousName {
        name: String,
        candidates: Vec<String>,
    },

    /// Empty method name
    #[error("No normalization method given")]
    NoMethod,

    /// Registry lock poisoned by a panicking thread
    #[error("Normalizer registry is unavailable")]
    RegistryPoisoned,
}

/// Convenience result alias
pub type Result<T> = std::result::Result<T, NormalizeError>;

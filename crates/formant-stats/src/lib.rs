//! Formant Statistics
//!
//! Descriptive statistics, Hz to perceptual scale conversions and the small
//! amount of linear algebra needed by the projection normalizers.

mod conversion;
mod error;
mod hull;
mod linalg;
mod statistics;

pub use conversion::{hz_to_bark, hz_to_erb, hz_to_log, hz_to_log10, hz_to_mel, BarkMethod};
pub use error::{Result, StatsError};
pub use hull::convex_hull;
pub use linalg::{column_means, covariance_matrix, symmetric_eigen, Eigen};
pub use statistics::{geometric_mean, mean, std_dev, SummaryStats};

//! Descriptive Statistics
//!
//! Missing values are represented as NaN and skipped, as are infinities.

/// Summary statistics for one column of measurements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    /// Number of finite values
    pub count: usize,
    /// Mean value
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl Default for SummaryStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            std_dev: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

impl SummaryStats {
    /// Compute summary statistics from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Self::default();
        }

        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let min = finite.iter().cloned().fold(f64::MAX, f64::min);
        let max = finite.iter().cloned().fold(f64::MIN, f64::max);

        let std_dev = if finite.len() >= 2 {
            let m2: f64 = finite.iter().map(|v| (v - mean) * (v - mean)).sum();
            (m2 / (n - 1.0)).sqrt()
        } else {
            f64::NAN
        };

        Self {
            count: finite.len(),
            mean,
            std_dev,
            min,
            max,
        }
    }

    /// Range between the largest and smallest value
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Mean of the finite values, NaN when there are none
pub fn mean(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Sample standard deviation of the finite values
pub fn std_dev(values: &[f64]) -> f64 {
    SummaryStats::compute(values).std_dev
}

/// Geometric mean of the finite values; NaN unless all are positive
pub fn geometric_mean(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || finite.iter().any(|&v| v <= 0.0) {
        return f64::NAN;
    }
    (finite.iter().map(|v| v.ln()).sum::<f64>() / finite.len() as f64).exp()
}

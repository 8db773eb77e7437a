//! Ellipses, aggregates and axis bounds

use crate::error::{PlotError, Result};
use formant_stats::{covariance_matrix, mean, symmetric_eigen};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Vertices of an ellipse outline
const OUTLINE_POINTS: usize = 100;

/// Size of a confidence ellipse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EllipseSize {
    /// Semi-axes of `n` standard deviations
    NStd(f64),
    /// Region holding this share of a bivariate normal distribution
    Confidence(f64),
}

impl Default for EllipseSize {
    fn default() -> Self {
        EllipseSize::Confidence(0.95)
    }
}

impl EllipseSize {
    /// Multiplier of the standard deviations along each axis
    pub fn scale(self) -> Result<f64> {
        match self {
            EllipseSize::NStd(n) if n.is_finite() && n > 0.0 => Ok(n),
            EllipseSize::Confidence(p) if p > 0.0 && p < 1.0 => {
                // Chi-squared quantile with two degrees of freedom
                Ok((-2.0 * (1.0 - p).ln()).sqrt())
            }
            other => Err(PlotError::InvalidParameter(format!(
                "ellipse size {:?} out of range",
                other
            ))),
        }
    }
}

/// Ellipse by centre, semi-axes and rotation of the major axis (radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub centre: (f64, f64),
    pub semi_axes: (f64, f64),
    pub angle: f64,
}

impl Ellipse {
    /// Closed outline as x and y coordinates
    pub fn outline(&self) -> (Vec<f64>, Vec<f64>) {
        let (cos, sin) = (self.angle.cos(), self.angle.sin());
        (0..=OUTLINE_POINTS)
            .map(|i| {
                let t = 2.0 * PI * i as f64 / OUTLINE_POINTS as f64;
                let (a, b) = (self.semi_axes.0 * t.cos(), self.semi_axes.1 * t.sin());
                (
                    self.centre.0 + a * cos - b * sin,
                    self.centre.1 + a * sin + b * cos,
                )
            })
            .unzip()
    }
}

/// Confidence ellipse of paired observations.
///
/// Returns `None` with fewer than three points.
pub fn confidence_ellipse(x: &[f64], y: &[f64], scale: f64) -> Result<Option<Ellipse>> {
    let n = x.len().min(y.len());
    if n < 3 {
        return Ok(None);
    }
    let data = Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { x[i] } else { y[i] });
    let cov = covariance_matrix(&data)?;
    let eigen = symmetric_eigen(&cov)?;
    let major = (eigen.vectors[[0, 0]], eigen.vectors[[1, 0]]);
    Ok(Some(Ellipse {
        centre: (mean(&x[..n]), mean(&y[..n])),
        semi_axes: (
            scale * eigen.values[0].max(0.0).sqrt(),
            scale * eigen.values[1].max(0.0).sqrt(),
        ),
        angle: major.1.atan2(major.0),
    }))
}

/// Median of the finite values, NaN when there are none
pub fn median(values: &[f64]) -> f64 {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.sort_by(f64::total_cmp);
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        (finite[mid - 1] + finite[mid]) / 2.0
    } else {
        finite[mid]
    }
}

/// Bounding box of everything drawn
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    x: Option<(f64, f64)>,
    y: Option<(f64, f64)>,
}

fn extend(range: Option<(f64, f64)>, value: f64) -> Option<(f64, f64)> {
    if !value.is_finite() {
        return range;
    }
    Some(match range {
        Some((lo, hi)) => (lo.min(value), hi.max(value)),
        None => (value, value),
    })
}

fn pad((lo, hi): (f64, f64), fraction: f64) -> (f64, f64) {
    let margin = if hi > lo { (hi - lo) * fraction } else { lo.abs().max(1.0) * fraction };
    (lo - margin, hi + margin)
}

impl Bounds {
    /// Include points; non-finite coordinates are skipped
    pub fn update(&mut self, x: &[f64], y: &[f64]) {
        for (&a, &b) in x.iter().zip(y) {
            if a.is_finite() && b.is_finite() {
                self.x = extend(self.x, a);
                self.y = extend(self.y, b);
            }
        }
    }

    /// Padded x range, `None` before anything was drawn
    pub fn x_range(&self, padding: f64) -> Option<(f64, f64)> {
        self.x.map(|r| pad(r, padding))
    }

    /// Padded y range
    pub fn y_range(&self, padding: f64) -> Option<(f64, f64)> {
        self.y.map(|r| pad(r, padding))
    }
}

//! Frequency Scale Conversions
//!
//! Element-wise conversions from Hz to perceptual and logarithmic scales.

use crate::StatsError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Formula used for the Hz to Bark conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarkMethod {
    /// Greenwood (1961)
    Greenwood,
    /// Syrdal & Gopal (1986): low-frequency correction then Zwicker
    Syrdal,
    /// Traunmüller (1990)
    #[default]
    Traunmuller,
    /// Volk (2015)
    Volk,
    /// Zwicker & Terhardt (1980)
    Zwicker,
}

impl FromStr for BarkMethod {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greenwood" => Ok(BarkMethod::Greenwood),
            "syrdal" => Ok(BarkMethod::Syrdal),
            "traunmuller" | "traunmüller" => Ok(BarkMethod::Traunmuller),
            "volk" => Ok(BarkMethod::Volk),
            "zwicker" => Ok(BarkMethod::Zwicker),
            other => Err(StatsError::UnknownMethod(other.to_string())),
        }
    }
}

/// Convert a frequency in Hz to the Bark scale
pub fn hz_to_bark(frq: f64, method: BarkMethod) -> f64 {
    match method {
        BarkMethod::Greenwood => 11.9 * (frq / 165.4 + 0.88).log10(),
        BarkMethod::Syrdal => {
            let corrected = if frq < 150.0 {
                150.0
            } else if frq < 200.0 {
                frq - 0.2 * (frq - 150.0)
            } else if frq < 250.0 {
                frq - 0.2 * (250.0 - frq)
            } else {
                frq
            };
            hz_to_bark(corrected, BarkMethod::Zwicker)
        }
        BarkMethod::Traunmuller => 26.81 * frq / (frq + 1960.0) - 0.53,
        BarkMethod::Volk => 32.12 * (1.0 - (1.0 + (frq / 873.47).powf(1.18)).powf(-0.4)),
        BarkMethod::Zwicker => {
            13.0 * (0.00076 * frq).atan() + 3.5 * (frq / 7500.0).powi(2).atan()
        }
    }
}

/// Convert Hz to mel (natural-log form of O'Shaughnessy's formula)
pub fn hz_to_mel(frq: f64) -> f64 {
    1127.0 * (1.0 + frq / 700.0).ln()
}

/// Convert Hz to the approximate ERB-rate scale (Moore & Glasberg)
pub fn hz_to_erb(frq: f64) -> f64 {
    21.4 * (1.0 + 0.00437 * frq).ln()
}

/// Natural logarithm
pub fn hz_to_log(frq: f64) -> f64 {
    frq.ln()
}

/// Base-10 logarithm
pub fn hz_to_log10(frq: f64) -> f64 {
    frq.log10()
}

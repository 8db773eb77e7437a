//! Formant-intrinsic transforms
//!
//! Element-wise conversions applied to every formant column; the identity
//! transform is the `default` method, useful as a baseline.

use crate::base::{
    map_formants, Classification, CommonOptions, FormantColumns, FormantSet, Normalizer, Outputs,
    Scope,
};
use crate::config::NormalizerConfig;
use crate::error::Result;
use formant_stats::{hz_to_bark, hz_to_erb, hz_to_log, hz_to_log10, hz_to_mel, BarkMethod};
use formant_table::{ColumnSpec, FormantTable};

/// Target scale of a [`ScaleNormalizer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Log,
    Log10,
    Bark(BarkMethod),
    Erb,
    Mel,
}

impl Scale {
    /// Registered method name
    pub fn name(self) -> &'static str {
        match self {
            Scale::Log => "log",
            Scale::Log10 => "log10",
            Scale::Bark(_) => "bark",
            Scale::Erb => "erb",
            Scale::Mel => "mel",
        }
    }

    /// Convert one value from Hz
    pub fn convert(self, frq: f64) -> f64 {
        match self {
            Scale::Log => hz_to_log(frq),
            Scale::Log10 => hz_to_log10(frq),
            Scale::Bark(method) => hz_to_bark(frq, method),
            Scale::Erb => hz_to_erb(frq),
            Scale::Mel => hz_to_mel(frq),
        }
    }
}

const INTRINSIC: Classification =
    Classification::new(Scope::Intrinsic, Scope::Intrinsic, Scope::Intrinsic);

/// Returns formants unaltered
#[derive(Debug, Clone)]
pub struct DefaultNormalizer {
    options: CommonOptions,
    formants: ColumnSpec,
}

impl Default for DefaultNormalizer {
    fn default() -> Self {
        Self {
            options: CommonOptions::default(),
            formants: ColumnSpec::default_formants(),
        }
    }
}

impl DefaultNormalizer {
    /// Build from parameters
    pub fn from_config(config: &NormalizerConfig) -> Self {
        Self {
            options: config.common(),
            formants: config.formant_spec(),
        }
    }
}

impl Normalizer for DefaultNormalizer {
    fn name(&self) -> &str {
        "default"
    }

    fn classification(&self) -> Classification {
        Classification::unclassified()
    }

    fn options(&self) -> &CommonOptions {
        &self.options
    }

    fn formant_columns(&self) -> FormantColumns {
        FormantColumns::Generic(self.formants.clone())
    }
}

/// Converts formants from Hz to another scale
#[derive(Debug, Clone)]
pub struct ScaleNormalizer {
    scale: Scale,
    options: CommonOptions,
    formants: ColumnSpec,
}

impl ScaleNormalizer {
    /// Convert the default formant columns
    pub fn new(scale: Scale) -> Self {
        Self {
            scale,
            options: CommonOptions::default(),
            formants: ColumnSpec::default_formants(),
        }
    }

    /// Build from parameters; `bark_method` only matters for Bark
    pub fn from_config(scale: Scale, config: &NormalizerConfig) -> Self {
        let scale = match scale {
            Scale::Bark(_) => Scale::Bark(config.bark_method),
            other => other,
        };
        Self {
            scale,
            options: config.common(),
            formants: config.formant_spec(),
        }
    }

    /// Target scale
    pub fn scale(&self) -> Scale {
        self.scale
    }
}

impl Normalizer for ScaleNormalizer {
    fn name(&self) -> &str {
        self.scale.name()
    }

    fn classification(&self) -> Classification {
        INTRINSIC
    }

    fn options(&self) -> &CommonOptions {
        &self.options
    }

    fn formant_columns(&self) -> FormantColumns {
        FormantColumns::Generic(self.formants.clone())
    }

    fn apply(&self, group: &FormantTable, set: &FormantSet) -> Result<Outputs> {
        map_formants(group, set, |_, values| {
            values.iter().map(|&v| self.scale.convert(v)).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formant_table::Column;

    fn table() -> FormantTable {
        FormantTable::from_columns(vec![
            ("speaker", Column::from(vec!["s1", "s2"])),
            ("f1", Column::from(vec![500.0, 700.0])),
            ("f2", Column::from(vec![1500.0, f64::NAN])),
        ])
        .unwrap()
    }

    #[test]
    fn test_default_is_identity() {
        let input = table();
        let out = DefaultNormalizer::default().normalize(&input).unwrap();
        assert_eq!(out.numeric("f1").unwrap(), input.numeric("f1").unwrap());
        assert_eq!(out.column_names(), input.column_names());
    }

    #[test]
    fn test_log_transform() {
        let out = ScaleNormalizer::new(Scale::Log).normalize(&table()).unwrap();
        assert!((out.numeric("f1").unwrap()[0] - 500.0_f64.ln()).abs() < 1e-12);
        assert!(out.numeric("f2").unwrap()[1].is_nan());
    }

    #[test]
    fn test_bark_method_from_config() {
        let config = NormalizerConfig {
            bark_method: BarkMethod::Zwicker,
            rename: Some("{}_bark".into()),
            ..Default::default()
        };
        let normalizer = ScaleNormalizer::from_config(Scale::Bark(BarkMethod::default()), &config);
        assert_eq!(normalizer.scale(), Scale::Bark(BarkMethod::Zwicker));
        let out = normalizer.normalize(&table()).unwrap();
        let expected = hz_to_bark(700.0, BarkMethod::Zwicker);
        assert!((out.numeric("f1_bark").unwrap()[1] - expected).abs() < 1e-12);
        assert_eq!(out.numeric("f1").unwrap(), &[500.0, 700.0]);
    }

    #[test]
    fn test_selected_formants_only() {
        let config = NormalizerConfig {
            formants: Some(ColumnSpec::name("f2")),
            ..Default::default()
        };
        let out = ScaleNormalizer::from_config(Scale::Mel, &config)
            .normalize(&table())
            .unwrap();
        assert_eq!(out.numeric("f1").unwrap(), &[500.0, 700.0]);
        assert!((out.numeric("f2").unwrap()[0] - hz_to_mel(1500.0)).abs() < 1e-9);
    }
}

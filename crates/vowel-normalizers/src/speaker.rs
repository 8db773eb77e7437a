//! Speaker-intrinsic normalizers
//!
//! Statistics are computed per speaker (after any group-by split) and
//! missing values are ignored.

use crate::base::{
    map_formants, Classification, CommonOptions, FormantColumns, FormantSet, FormantSlots,
    Normalizer, Outputs, Scope,
};
use crate::config::NormalizerConfig;
use crate::error::Result;
use formant_stats::{mean, SummaryStats};
use formant_table::{ColumnSpec, FormantTable};
use tracing::warn;

/// Speaker-intrinsic formula applied to each formant independently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerMethod {
    /// `999 (F - min) / (max - min)`
    Gerstman,
    /// `F / max`
    Lce,
    /// `(F - mean) / sd`
    Lobanov,
    /// `ln F - mean(ln F)`, optionally exponentiated
    Neary { exp: bool },
}

impl SpeakerMethod {
    fn name(self) -> &'static str {
        match self {
            SpeakerMethod::Gerstman => "gerstman",
            SpeakerMethod::Lce => "lce",
            SpeakerMethod::Lobanov => "lobanov",
            SpeakerMethod::Neary { exp: false } => "neary",
            SpeakerMethod::Neary { exp: true } => "neary-exp",
        }
    }
}

const SPEAKER_INTRINSIC: Classification =
    Classification::new(Scope::Extrinsic, Scope::Intrinsic, Scope::Intrinsic);

/// Per-speaker normalizer treating every formant alike
#[derive(Debug, Clone)]
pub struct SpeakerNormalizer {
    method: SpeakerMethod,
    options: CommonOptions,
    formants: ColumnSpec,
    speaker: String,
}

impl SpeakerNormalizer {
    /// Default columns: `speaker` and `f0`..`f5`
    pub fn new(method: SpeakerMethod) -> Self {
        Self::from_config(method, &NormalizerConfig::default())
    }

    /// Build from parameters. For Neary, `exp` in the config also enables
    /// exponentiation.
    pub fn from_config(method: SpeakerMethod, config: &NormalizerConfig) -> Self {
        let method = match method {
            SpeakerMethod::Neary { exp } => SpeakerMethod::Neary {
                exp: exp || config.exp,
            },
            other => other,
        };
        Self {
            method,
            options: config.common(),
            formants: config.formant_spec(),
            speaker: config.speaker.clone(),
        }
    }
}

impl Normalizer for SpeakerNormalizer {
    fn name(&self) -> &str {
        self.method.name()
    }

    fn classification(&self) -> Classification {
        SPEAKER_INTRINSIC
    }

    fn options(&self) -> &CommonOptions {
        &self.options
    }

    fn partition_columns(&self) -> Vec<String> {
        vec![self.speaker.clone()]
    }

    fn formant_columns(&self) -> FormantColumns {
        FormantColumns::Generic(self.formants.clone())
    }

    fn apply(&self, group: &FormantTable, set: &FormantSet) -> Result<Outputs> {
        map_formants(group, set, |name, values| match self.method {
            SpeakerMethod::Gerstman => {
                let stats = SummaryStats::compute(values);
                if stats.range() == 0.0 {
                    warn!("gerstman: {} has zero range for a speaker", name);
                }
                values
                    .iter()
                    .map(|v| 999.0 * (v - stats.min) / stats.range())
                    .collect()
            }
            SpeakerMethod::Lce => {
                let max = SummaryStats::compute(values).max;
                values.iter().map(|v| v / max).collect()
            }
            SpeakerMethod::Lobanov => {
                let stats = SummaryStats::compute(values);
                if stats.std_dev.is_nan() || stats.std_dev == 0.0 {
                    warn!("lobanov: {} has no spread for a speaker", name);
                }
                values
                    .iter()
                    .map(|v| (v - stats.mean) / stats.std_dev)
                    .collect()
            }
            SpeakerMethod::Neary { exp } => {
                let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
                let mu = mean(&logs);
                logs.iter()
                    .map(|l| if exp { (l - mu).exp() } else { l - mu })
                    .collect()
            }
        })
    }
}

/// Neary's geometric-mean normalizer: log formants minus the mean over
/// formants of each formant's mean log value
#[derive(Debug, Clone)]
pub struct NearyGmNormalizer {
    exp: bool,
    options: CommonOptions,
    slots: FormantSlots,
    speaker: String,
}

impl NearyGmNormalizer {
    /// Default columns, optional exponentiation
    pub fn new(exp: bool) -> Self {
        Self::from_config(exp, &NormalizerConfig::default())
    }

    /// Build from parameters; `exp` is enabled if set here or in the config
    pub fn from_config(exp: bool, config: &NormalizerConfig) -> Self {
        Self {
            exp: exp || config.exp,
            options: config.common(),
            slots: config.slots(),
            speaker: config.speaker.clone(),
        }
    }
}

impl Normalizer for NearyGmNormalizer {
    fn name(&self) -> &str {
        if self.exp {
            "nearygm-exp"
        } else {
            "nearygm"
        }
    }

    fn classification(&self) -> Classification {
        Classification::new(Scope::Extrinsic, Scope::Extrinsic, Scope::Intrinsic)
    }

    fn options(&self) -> &CommonOptions {
        &self.options
    }

    fn partition_columns(&self) -> Vec<String> {
        vec![self.speaker.clone()]
    }

    fn formant_columns(&self) -> FormantColumns {
        FormantColumns::Specific {
            slots: self.slots.clone(),
            required: Vec::new(),
        }
    }

    fn apply(&self, group: &FormantTable, set: &FormantSet) -> Result<Outputs> {
        let logs = set
            .formants()
            .iter()
            .map(|name| Ok(group.numeric(name)?.iter().map(|v| v.ln()).collect()))
            .collect::<Result<Vec<Vec<f64>>>>()?;
        let means: Vec<f64> = logs.iter().map(|l| mean(l)).collect();
        let grand = mean(&means);

        let mut outputs = Outputs::new();
        for (name, logs) in set.formants().iter().zip(logs) {
            let values: Vec<f64> = logs
                .iter()
                .map(|l| if self.exp { (l - grand).exp() } else { l - grand })
                .collect();
            outputs.push(name.clone(), values);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formant_table::Column;
    use proptest::prelude::*;

    fn table() -> FormantTable {
        FormantTable::from_columns(vec![
            ("speaker", Column::from(vec!["a", "b", "a", "b", "a"])),
            ("f1", Column::from(vec![300.0, 400.0, 500.0, 800.0, 700.0])),
            ("f2", Column::from(vec![2000.0, 2200.0, 1000.0, 1100.0, 1500.0])),
        ])
        .unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn corpora() -> FormantTable {
        FormantTable::from_columns(vec![
            ("corpus", Column::from(vec!["c2", "c1", "c2", "c1"])),
            ("speaker", Column::from(vec!["s", "s", "s", "s"])),
            ("f1", Column::from(vec![400.0, 100.0, 600.0, 300.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_groupby_scales_each_corpus_separately() {
        let config = NormalizerConfig {
            groupby: vec!["corpus".to_string()],
            ..Default::default()
        };
        let out = SpeakerNormalizer::from_config(SpeakerMethod::Gerstman, &config)
            .normalize(&corpora())
            .unwrap();
        assert_eq!(out.numeric("f1").unwrap(), &[0.0, 0.0, 999.0, 999.0]);
        assert_eq!(out.labels("corpus").unwrap(), vec!["c2", "c1", "c2", "c1"]);

        let pooled = SpeakerNormalizer::new(SpeakerMethod::Gerstman)
            .normalize(&corpora())
            .unwrap();
        assert!(close(pooled.numeric("f1").unwrap()[0], 999.0 * 300.0 / 500.0));
    }

    #[test]
    fn test_missing_groupby_column() {
        let config = NormalizerConfig {
            groupby: vec!["dialect".to_string()],
            ..Default::default()
        };
        assert!(SpeakerNormalizer::from_config(SpeakerMethod::Gerstman, &config)
            .normalize(&corpora())
            .is_err());
    }

    #[test]
    fn test_gerstman() {
        let out = SpeakerNormalizer::new(SpeakerMethod::Gerstman)
            .normalize(&table())
            .unwrap();
        let f1 = out.numeric("f1").unwrap();
        assert!(close(f1[0], 0.0));
        assert!(close(f1[2], 499.5));
        assert!(close(f1[4], 999.0));
        assert!(close(f1[1], 0.0));
        assert!(close(f1[3], 999.0));
    }

    #[test]
    fn test_lce() {
        let out = SpeakerNormalizer::new(SpeakerMethod::Lce)
            .normalize(&table())
            .unwrap();
        assert!(close(out.numeric("f1").unwrap()[0], 300.0 / 700.0));
        assert!(close(out.numeric("f2").unwrap()[3], 1100.0 / 2200.0));
    }

    #[test]
    fn test_lobanov() {
        let out = SpeakerNormalizer::new(SpeakerMethod::Lobanov)
            .normalize(&table())
            .unwrap();
        let f1 = out.numeric("f1").unwrap();
        // speaker a: mean 500, sd 200
        assert!(close(f1[0], -1.0));
        assert!(close(f1[2], 0.0));
        assert!(close(f1[4], 1.0));
    }

    #[test]
    fn test_lobanov_ignores_missing() {
        let input = FormantTable::from_columns(vec![
            ("speaker", Column::from(vec!["a", "a", "a", "a"])),
            ("f1", Column::from(vec![300.0, f64::NAN, 500.0, 700.0])),
        ])
        .unwrap();
        let out = SpeakerNormalizer::new(SpeakerMethod::Lobanov)
            .normalize(&input)
            .unwrap();
        let f1 = out.numeric("f1").unwrap();
        assert!(close(f1[0], -1.0));
        assert!(f1[1].is_nan());
    }

    #[test]
    fn test_neary_and_exp() {
        let out = SpeakerNormalizer::new(SpeakerMethod::Neary { exp: false })
            .normalize(&table())
            .unwrap();
        let mu = (300.0_f64.ln() + 500.0_f64.ln() + 700.0_f64.ln()) / 3.0;
        assert!(close(out.numeric("f1").unwrap()[0], 300.0_f64.ln() - mu));

        let config = NormalizerConfig {
            exp: true,
            ..Default::default()
        };
        let normalizer =
            SpeakerNormalizer::from_config(SpeakerMethod::Neary { exp: false }, &config);
        assert_eq!(normalizer.name(), "neary-exp");
        let out = normalizer.normalize(&table()).unwrap();
        assert!(close(out.numeric("f1").unwrap()[0], (300.0_f64.ln() - mu).exp()));
    }

    #[test]
    fn test_custom_speaker_column() {
        let input = FormantTable::from_columns(vec![
            ("talker", Column::from(vec!["a", "a"])),
            ("f1", Column::from(vec![300.0, 600.0])),
        ])
        .unwrap();
        let config = NormalizerConfig {
            speaker: "talker".into(),
            ..Default::default()
        };
        let out = SpeakerNormalizer::from_config(SpeakerMethod::Lce, &config)
            .normalize(&input)
            .unwrap();
        assert_eq!(out.numeric("f1").unwrap(), &[0.5, 1.0]);
        assert!(SpeakerNormalizer::new(SpeakerMethod::Lce)
            .normalize(&input)
            .is_err());
    }

    #[test]
    fn test_nearygm_uses_grand_mean() {
        let out = NearyGmNormalizer::new(false).normalize(&table()).unwrap();
        let f1_mu = (300.0_f64.ln() + 500.0_f64.ln() + 700.0_f64.ln()) / 3.0;
        let f2_mu = (2000.0_f64.ln() + 1000.0_f64.ln() + 1500.0_f64.ln()) / 3.0;
        let grand = (f1_mu + f2_mu) / 2.0;
        assert!(close(out.numeric("f1").unwrap()[0], 300.0_f64.ln() - grand));
        assert!(close(out.numeric("f2").unwrap()[0], 2000.0_f64.ln() - grand));
    }

    #[test]
    fn test_nearygm_exp_name() {
        let normalizer = NearyGmNormalizer::new(true);
        assert_eq!(normalizer.name(), "nearygm-exp");
        let out = normalizer.normalize(&table()).unwrap();
        assert!(out.numeric("f1").unwrap().iter().all(|v| *v > 0.0));
    }

    proptest! {
        #[test]
        fn prop_lobanov_centred(values in proptest::collection::vec(50.0f64..5000.0, 3..30)) {
            prop_assume!(SummaryStats::compute(&values).std_dev > 1e-6);
            let input = FormantTable::from_columns(vec![
                ("speaker", Column::from(vec!["s"; values.len()])),
                ("f1", Column::from(values.clone())),
            ]).unwrap();
            let out = SpeakerNormalizer::new(SpeakerMethod::Lobanov).normalize(&input).unwrap();
            let stats = SummaryStats::compute(out.numeric("f1").unwrap());
            prop_assert!(stats.mean.abs() < 1e-9);
            prop_assert!((stats.std_dev - 1.0).abs() < 1e-9);
        }
    }
}

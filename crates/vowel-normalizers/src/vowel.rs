//! Vowel-intrinsic normalizers

use crate::base::{
    Classification, CommonOptions, FormantColumns, FormantSet, FormantSlots, Normalizer, Outputs,
    Scope, Slot,
};
use crate::config::NormalizerConfig;
use crate::error::Result;
use formant_stats::{hz_to_bark, mean, BarkMethod, SummaryStats};
use formant_table::FormantTable;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Bark-difference normalizer (Syrdal & Gopal): differences between the
/// Bark values of consecutive formants
#[derive(Debug, Clone)]
pub struct BarkDifferenceNormalizer {
    options: CommonOptions,
    slots: FormantSlots,
    method: BarkMethod,
}

impl Default for BarkDifferenceNormalizer {
    fn default() -> Self {
        Self::from_config(&NormalizerConfig::default())
    }
}

impl BarkDifferenceNormalizer {
    /// Build from parameters
    pub fn from_config(config: &NormalizerConfig) -> Self {
        Self {
            options: config.common(),
            slots: config.slots(),
            method: config.bark_method,
        }
    }
}

/// `z{k}` followed by whatever follows the slot name in the column,
/// so `f2@50` gives `z2@50`
fn difference_name(slot: Slot, column: &str) -> String {
    let k = &slot.name()[1..];
    let suffix = column.strip_prefix(slot.name()).unwrap_or("");
    format!("z{}{}", k, suffix)
}

impl Normalizer for BarkDifferenceNormalizer {
    fn name(&self) -> &str {
        "barkdiff"
    }

    fn classification(&self) -> Classification {
        Classification::new(Scope::Intrinsic, Scope::Extrinsic, Scope::Intrinsic)
    }

    fn options(&self) -> &CommonOptions {
        &self.options
    }

    fn formant_columns(&self) -> FormantColumns {
        FormantColumns::Specific {
            slots: self.slots.clone(),
            required: vec![Slot::F1, Slot::F2, Slot::F3],
        }
    }

    fn apply(&self, group: &FormantTable, set: &FormantSet) -> Result<Outputs> {
        let bark = |slot: Slot| -> Result<Option<(String, Vec<f64>)>> {
            match set.slot(slot) {
                Some(column) => {
                    let values = group.numeric(column)?;
                    Ok(Some((
                        column.to_string(),
                        values.iter().map(|&v| hz_to_bark(v, self.method)).collect(),
                    )))
                }
                None => Ok(None),
            }
        };

        let barks = [bark(Slot::F0)?, bark(Slot::F1)?, bark(Slot::F2)?, bark(Slot::F3)?];
        let mut outputs = Outputs::new();
        for k in 1..4 {
            if let (Some((_, lower)), Some((column, upper))) = (&barks[k - 1], &barks[k]) {
                let diff: Vec<f64> = upper.iter().zip(lower).map(|(u, l)| u - l).collect();
                outputs.push(difference_name(Slot::ALL[k], column), diff);
            }
        }
        Ok(outputs)
    }
}

fn cube_roots(f1: &[f64], f2: &[f64], f3: &[f64]) -> Vec<f64> {
    f1.iter()
        .zip(f2)
        .zip(f3)
        .map(|((a, b), c)| (a * b * c).cbrt())
        .collect()
}

/// Geometric-mean normalization with denormalization by the geometric
/// mean of the formant means (Ananthapadmanabha & Ramakrishnan)
#[derive(Debug, Clone)]
pub struct IeGmagmNormalizer {
    options: CommonOptions,
    slots: FormantSlots,
}

impl Default for IeGmagmNormalizer {
    fn default() -> Self {
        Self::from_config(&NormalizerConfig::default())
    }
}

impl IeGmagmNormalizer {
    /// Build from parameters
    pub fn from_config(config: &NormalizerConfig) -> Self {
        Self {
            options: config.common(),
            slots: config.slots(),
        }
    }
}

impl Normalizer for IeGmagmNormalizer {
    fn name(&self) -> &str {
        "ie-gmagm"
    }

    fn classification(&self) -> Classification {
        Classification::new(Scope::Intrinsic, Scope::Extrinsic, Scope::Extrinsic)
    }

    fn options(&self) -> &CommonOptions {
        &self.options
    }

    fn formant_columns(&self) -> FormantColumns {
        FormantColumns::Specific {
            slots: self.slots.clone(),
            required: vec![Slot::F1, Slot::F2, Slot::F3],
        }
    }

    fn apply(&self, group: &FormantTable, set: &FormantSet) -> Result<Outputs> {
        let (c1, c2, c3) = (set.require(Slot::F1)?, set.require(Slot::F2)?, set.require(Slot::F3)?);
        let (f1, f2, f3) = (group.numeric(c1)?, group.numeric(c2)?, group.numeric(c3)?);

        let roots = cube_roots(f1, f2, f3);
        let scale = (mean(f1) * mean(f2) * mean(f3)).cbrt();

        let mut outputs = Outputs::new();
        for (column, values) in [(c1, f1), (c2, f2)] {
            let normalized: Vec<f64> = values
                .iter()
                .zip(&roots)
                .map(|(v, g)| v / g * scale)
                .collect();
            outputs.push(column, normalized);
        }
        Ok(outputs)
    }
}

/// Hypothesis-testing normalizer (Ananthapadmanabha & Ramakrishnan).
///
/// Each token is scaled by the geometric mean of its first three formants,
/// then denormalized with the mean F1 and F2 of every candidate vowel. The
/// candidate whose denormalized values are closest (in standard deviations)
/// to that vowel's distribution is chosen, which may relabel the token.
#[derive(Debug, Clone)]
pub struct IeHtNormalizer {
    options: CommonOptions,
    slots: FormantSlots,
    vowel: String,
}

impl Default for IeHtNormalizer {
    fn default() -> Self {
        Self::from_config(&NormalizerConfig::default())
    }
}

impl IeHtNormalizer {
    /// Build from parameters
    pub fn from_config(config: &NormalizerConfig) -> Self {
        Self {
            options: config.common(),
            slots: config.slots(),
            vowel: config.vowel.clone(),
        }
    }
}

impl Normalizer for IeHtNormalizer {
    fn name(&self) -> &str {
        "ie-ht"
    }

    fn classification(&self) -> Classification {
        Classification::new(Scope::Intrinsic, Scope::Extrinsic, Scope::Extrinsic)
    }

    fn options(&self) -> &CommonOptions {
        &self.options
    }

    fn required_columns(&self) -> Vec<String> {
        vec![self.vowel.clone()]
    }

    fn formant_columns(&self) -> FormantColumns {
        FormantColumns::Specific {
            slots: self.slots.clone(),
            required: vec![Slot::F1, Slot::F2, Slot::F3],
        }
    }

    fn apply(&self, group: &FormantTable, set: &FormantSet) -> Result<Outputs> {
        let (c1, c2, c3) = (set.require(Slot::F1)?, set.require(Slot::F2)?, set.require(Slot::F3)?);
        let (f1, f2, f3) = (group.numeric(c1)?, group.numeric(c2)?, group.numeric(c3)?);
        let labels = group.labels(&self.vowel)?;

        let mut by_vowel: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (row, label) in labels.iter().enumerate() {
            by_vowel.entry(label.as_str()).or_default().push(row);
        }
        let vowels: Vec<&str> = by_vowel.keys().copied().collect();
        let index: BTreeMap<&str, usize> =
            vowels.iter().enumerate().map(|(i, v)| (*v, i)).collect();

        let pick = |values: &[f64], rows: &[usize]| -> Vec<f64> {
            rows.iter().map(|&r| values[r]).collect()
        };

        // Mean raw F1, F2 per vowel
        let beta: Vec<(f64, f64)> = by_vowel
            .values()
            .map(|rows| (mean(&pick(f1, rows)), mean(&pick(f2, rows))))
            .collect();

        let roots = cube_roots(f1, f2, f3);
        let p1: Vec<f64> = f1.iter().zip(&roots).map(|(v, g)| v / g).collect();
        let p2: Vec<f64> = f2.iter().zip(&roots).map(|(v, g)| v / g).collect();

        // Distribution of tokens denormalized with their own vowel's means
        let spread: Vec<(SummaryStats, SummaryStats)> = by_vowel
            .values()
            .zip(&beta)
            .map(|(rows, &(b1, b2))| {
                let d1: Vec<f64> = rows.iter().map(|&r| p1[r] * b1).collect();
                let d2: Vec<f64> = rows.iter().map(|&r| p2[r] * b2).collect();
                (SummaryStats::compute(&d1), SummaryStats::compute(&d2))
            })
            .collect();

        let n = group.n_rows();
        let mut out1 = Vec::with_capacity(n);
        let mut out2 = Vec::with_capacity(n);
        let mut out_vowel = Vec::with_capacity(n);
        let mut relabelled = 0usize;
        for row in 0..n {
            let own = index[labels[row].as_str()];
            let best = (0..vowels.len())
                .filter_map(|j| {
                    let (b1, b2) = beta[j];
                    let (s1, s2) = &spread[j];
                    let z1 = (p1[row] * b1 - s1.mean) / s1.std_dev;
                    let z2 = (p2[row] * b2 - s2.mean) / s2.std_dev;
                    let distance = z1 * z1 + z2 * z2;
                    distance.is_finite().then_some((j, distance))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(j, _)| j)
                .unwrap_or(own);
            if best != own {
                relabelled += 1;
            }
            out1.push(p1[row] * beta[best].0);
            out2.push(p2[row] * beta[best].1);
            out_vowel.push(vowels[best].to_string());
        }
        if relabelled > 0 {
            debug!("ie-ht: relabelled {} of {} tokens", relabelled, n);
        }
        if spread.iter().any(|(s1, s2)| s1.std_dev.is_nan() || s2.std_dev.is_nan()) {
            warn!("ie-ht: some vowels have fewer than two tokens and are never chosen");
        }

        let mut outputs = Outputs::new();
        outputs.push(c1, out1);
        outputs.push(c2, out2);
        outputs.push(self.vowel.clone(), out_vowel);
        Ok(outputs)
    }
}

//! Gender-based normalizers

use crate::base::{
    map_formants, Classification, CommonOptions, FormantColumns, FormantSet, FormantSlots,
    Normalizer, Outputs, Scope, Slot,
};
use crate::config::NormalizerConfig;
use crate::error::{NormalizeError, Result};
use formant_stats::{hz_to_bark, mean, BarkMethod};
use formant_table::{ColumnSpec, FormantTable};
use tracing::{debug, warn};

/// Labels of the gender column
#[derive(Debug, Clone, PartialEq, Eq)]
struct GenderLabels {
    female: Option<String>,
    male: Option<String>,
}

/// Fill in whichever of `female`/`male` is missing with the first other
/// label in the column
fn infer_labels(
    labels: &[String],
    female: Option<&str>,
    male: Option<&str>,
) -> Result<GenderLabels> {
    let other = |known: &str| {
        labels
            .iter()
            .find(|l| !l.is_empty() && l.as_str() != known)
            .cloned()
    };
    match (female, male) {
        (Some(f), Some(m)) => Ok(GenderLabels {
            female: Some(f.to_string()),
            male: Some(m.to_string()),
        }),
        (Some(f), None) => Ok(GenderLabels {
            female: Some(f.to_string()),
            male: other(f),
        }),
        (None, Some(m)) => Ok(GenderLabels {
            female: other(m),
            male: Some(m.to_string()),
        }),
        (None, None) => Err(NormalizeError::MissingGenderLabel("female or male")),
    }
}

fn default_gender_formants() -> ColumnSpec {
    ColumnSpec::names(Slot::ALL.iter().map(|s| s.name()))
}

/// Bladen's normalizer: Bark-scaled formants minus one Bark for female
/// speakers
#[derive(Debug, Clone)]
pub struct BladenNormalizer {
    options: CommonOptions,
    formants: ColumnSpec,
    gender: String,
    female: Option<String>,
    male: Option<String>,
}

impl BladenNormalizer {
    /// Build from parameters; `female` or `male` must be set
    pub fn from_config(config: &NormalizerConfig) -> Result<Self> {
        if config.female.is_none() && config.male.is_none() {
            return Err(NormalizeError::MissingGenderLabel("female or male"));
        }
        Ok(Self {
            options: config.common(),
            formants: config
                .formants
                .clone()
                .unwrap_or_else(default_gender_formants),
            gender: config.gender.clone(),
            female: config.female.clone(),
            male: config.male.clone(),
        })
    }
}

impl Normalizer for BladenNormalizer {
    fn name(&self) -> &str {
        "bladen"
    }

    fn classification(&self) -> Classification {
        Classification::new(Scope::Intrinsic, Scope::Intrinsic, Scope::Extrinsic)
    }

    fn options(&self) -> &CommonOptions {
        &self.options
    }

    fn required_columns(&self) -> Vec<String> {
        vec![self.gender.clone()]
    }

    fn formant_columns(&self) -> FormantColumns {
        FormantColumns::Generic(self.formants.clone())
    }

    fn apply(&self, group: &FormantTable, set: &FormantSet) -> Result<Outputs> {
        let genders = group.labels(&self.gender)?;
        let labels = infer_labels(&genders, self.female.as_deref(), self.male.as_deref())?;
        let female: Vec<bool> = genders
            .iter()
            .map(|g| labels.female.as_deref() == Some(g.as_str()))
            .collect();
        map_formants(group, set, |_, values| {
            values
                .iter()
                .zip(&female)
                .map(|(&v, &is_female)| {
                    let bark = hz_to_bark(v, BarkMethod::Traunmuller);
                    if is_female {
                        bark - 1.0
                    } else {
                        bark
                    }
                })
                .collect()
        })
    }
}

/// Nordström's normalizer: female formants scaled by the ratio of male to
/// female mean F3 over open vowels (F1 above 600 Hz)
#[derive(Debug, Clone)]
pub struct NordstromNormalizer {
    options: CommonOptions,
    formants: ColumnSpec,
    slots: FormantSlots,
    gender: String,
    female: Option<String>,
    male: Option<String>,
}

/// F1 threshold selecting open vowels
const OPEN_VOWEL_F1: f64 = 600.0;

impl NordstromNormalizer {
    /// Build from parameters; `female` or `male` must be set
    pub fn from_config(config: &NormalizerConfig) -> Result<Self> {
        if config.female.is_none() && config.male.is_none() {
            return Err(NormalizeError::MissingGenderLabel("female or male"));
        }
        Ok(Self {
            options: config.common(),
            formants: config
                .formants
                .clone()
                .unwrap_or_else(default_gender_formants),
            slots: config.slots(),
            gender: config.gender.clone(),
            female: config.female.clone(),
            male: config.male.clone(),
        })
    }

    fn reference_column(&self, group: &FormantTable, slot: Slot) -> Result<String> {
        let columns = self.slots.get(slot).resolve(group)?;
        columns
            .into_iter()
            .next()
            .ok_or_else(|| NormalizeError::NoFormants(slot.name().to_string()))
    }
}

impl Normalizer for NordstromNormalizer {
    fn name(&self) -> &str {
        "nordstrom"
    }

    fn classification(&self) -> Classification {
        Classification::new(Scope::Intrinsic, Scope::Intrinsic, Scope::Extrinsic)
    }

    fn options(&self) -> &CommonOptions {
        &self.options
    }

    fn required_columns(&self) -> Vec<String> {
        vec![self.gender.clone()]
    }

    fn formant_columns(&self) -> FormantColumns {
        FormantColumns::Generic(self.formants.clone())
    }

    fn apply(&self, group: &FormantTable, set: &FormantSet) -> Result<Outputs> {
        let genders = group.labels(&self.gender)?;
        let labels = infer_labels(&genders, self.female.as_deref(), self.male.as_deref())?;
        let female = labels
            .female
            .ok_or(NormalizeError::MissingGenderLabel("female"))?;
        let male = labels
            .male
            .ok_or(NormalizeError::MissingGenderLabel("male"))?;

        let f1 = group.numeric(&self.reference_column(group, Slot::F1)?)?;
        let f3 = group.numeric(&self.reference_column(group, Slot::F3)?)?;
        let open_f3 = |label: &str| -> f64 {
            let values: Vec<f64> = genders
                .iter()
                .zip(f1.iter().zip(f3))
                .filter(|(g, (v1, _))| g.as_str() == label && **v1 > OPEN_VOWEL_F1)
                .map(|(_, (_, v3))| *v3)
                .collect();
            mean(&values)
        };
        let mu_female = open_f3(&female);
        let mu_male = open_f3(&male);
        let ratio = mu_male / mu_female;
        if !ratio.is_finite() {
            warn!(
                "nordstrom: no usable open vowels for {} or {}, female formants set to NaN",
                female, male
            );
        }
        debug!("nordstrom: mean F3 female {} male {}", mu_female, mu_male);

        map_formants(group, set, |_, values| {
            values
                .iter()
                .zip(&genders)
                .map(|(v, g)| if *g == female { v * ratio } else { *v })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formant_table::Column;

    fn table() -> FormantTable {
        FormantTable::from_columns(vec![
            ("gender", Column::from(vec!["F", "F", "M", "M"])),
            ("f1", Column::from(vec![800.0, 300.0, 700.0, 250.0])),
            ("f2", Column::from(vec![1500.0, 2500.0, 1200.0, 2100.0])),
            ("f3", Column::from(vec![3000.0, 3100.0, 2400.0, 2500.0])),
        ])
        .unwrap()
    }

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_infer_labels() {
        let genders = labels(&["F", "M", "F"]);
        let inferred = infer_labels(&genders, Some("F"), None).unwrap();
        assert_eq!(inferred.male.as_deref(), Some("M"));
        let inferred = infer_labels(&genders, None, Some("M")).unwrap();
        assert_eq!(inferred.female.as_deref(), Some("F"));
        assert!(infer_labels(&genders, None, None).is_err());
    }

    #[test]
    fn test_infer_labels_takes_first_other_value() {
        let genders = labels(&["F", "", "X", "M"]);
        let inferred = infer_labels(&genders, Some("F"), None).unwrap();
        assert_eq!(inferred.male.as_deref(), Some("X"));
    }

    #[test]
    fn test_bladen() {
        let config = NormalizerConfig {
            female: Some("F".into()),
            ..Default::default()
        };
        let out = BladenNormalizer::from_config(&config)
            .unwrap()
            .normalize(&table())
            .unwrap();
        let b = |f: f64| hz_to_bark(f, BarkMethod::Traunmuller);
        assert!((out.numeric("f1").unwrap()[0] - (b(800.0) - 1.0)).abs() < 1e-12);
        assert!((out.numeric("f1").unwrap()[2] - b(700.0)).abs() < 1e-12);
    }

    #[test]
    fn test_bladen_requires_label() {
        assert!(matches!(
            BladenNormalizer::from_config(&NormalizerConfig::default()),
            Err(NormalizeError::MissingGenderLabel(_))
        ));
    }

    #[test]
    fn test_nordstrom_scales_female_rows() {
        let config = NormalizerConfig {
            male: Some("M".into()),
            ..Default::default()
        };
        let out = NordstromNormalizer::from_config(&config)
            .unwrap()
            .normalize(&table())
            .unwrap();
        let ratio = 2400.0 / 3000.0;
        assert!((out.numeric("f2").unwrap()[1] - 2500.0 * ratio).abs() < 1e-9);
        assert_eq!(out.numeric("f2").unwrap()[2], 1200.0);
        assert!((out.numeric("f3").unwrap()[0] - 2400.0).abs() < 1e-9);
    }

    #[test]
    fn test_nordstrom_single_gender_errors() {
        let input = FormantTable::from_columns(vec![
            ("gender", Column::from(vec!["F", "F"])),
            ("f1", Column::from(vec![800.0, 300.0])),
            ("f3", Column::from(vec![3000.0, 3100.0])),
        ])
        .unwrap();
        let config = NormalizerConfig {
            female: Some("F".into()),
            ..Default::default()
        };
        assert!(matches!(
            NordstromNormalizer::from_config(&config)
                .unwrap()
                .normalize(&input),
            Err(NormalizeError::MissingGenderLabel("male"))
        ));
    }
}

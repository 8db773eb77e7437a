//! Centroid normalizers
//!
//! Each speaker's formants are divided by the centroid of a vowel space
//! built from per-vowel mean formants. The methods differ in which vowels
//! form the space and how missing corners are derived.

use crate::base::{
    Classification, CommonOptions, FormantColumns, FormantSet, FormantSlots, Normalizer, Outputs,
    Scope, Slot,
};
use crate::config::NormalizerConfig;
use crate::error::{NormalizeError, Result};
use formant_stats::{convex_hull, mean};
use formant_table::{ColumnSpec, FormantTable};
use std::collections::BTreeMap;

/// Vowel space used to compute the centroid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentroidMethod {
    /// Mean of the apex vowels (all vowels unless `points` is given)
    Centroid,
    /// Barycentre of the vowels on the convex hull of the vowel means
    ConvexHull,
    /// Watt & Fabricius: fleece, trap and a derived goose
    WattFabricius1,
    /// As `WattFabricius1`, F2 centroid from fleece and goose only
    WattFabricius2,
    /// As `WattFabricius1`, goose is the minimum of all vowel means
    WattFabricius3,
    /// Bigham's trapezoid from kit, fleece, goose, start, thought and trap
    Bigham,
    /// Relative to the speaker's schwa
    Schwa,
}

impl CentroidMethod {
    /// Registered method name
    pub fn name(self) -> &'static str {
        match self {
            CentroidMethod::Centroid => "centroid",
            CentroidMethod::ConvexHull => "convex-hull",
            CentroidMethod::WattFabricius1 => "wattfab1",
            CentroidMethod::WattFabricius2 => "wattfab2",
            CentroidMethod::WattFabricius3 => "wattfab3",
            CentroidMethod::Bigham => "bigham",
            CentroidMethod::Schwa => "schwa",
        }
    }

    fn is_formant_specific(self) -> bool {
        matches!(
            self,
            CentroidMethod::WattFabricius1
                | CentroidMethod::WattFabricius2
                | CentroidMethod::WattFabricius3
                | CentroidMethod::Bigham
        )
    }
}

/// Lexical-set roles used by Bigham's trapezoid
const BIGHAM_POINTS: [&str; 6] = ["kit", "goose", "fleece", "start", "thought", "trap"];

/// Per-speaker centroid normalizer
#[derive(Debug, Clone)]
pub struct CentroidNormalizer {
    method: CentroidMethod,
    options: CommonOptions,
    formants: ColumnSpec,
    slots: FormantSlots,
    speaker: String,
    vowel: String,
    /// Role -> vowel label; empty means all vowels for `Centroid`
    points: BTreeMap<String, String>,
}

impl CentroidNormalizer {
    /// Default columns and vowel labels
    pub fn new(method: CentroidMethod) -> Self {
        Self::from_config(method, &NormalizerConfig::default())
    }

    /// Build from parameters
    pub fn from_config(method: CentroidMethod, config: &NormalizerConfig) -> Self {
        let mut points: BTreeMap<String, String> = match method {
            CentroidMethod::Centroid | CentroidMethod::ConvexHull => BTreeMap::new(),
            CentroidMethod::WattFabricius1
            | CentroidMethod::WattFabricius2
            | CentroidMethod::WattFabricius3 => [
                ("fleece".to_string(), config.fleece.clone()),
                ("trap".to_string(), config.trap.clone()),
            ]
            .into_iter()
            .collect(),
            CentroidMethod::Bigham => BIGHAM_POINTS
                .iter()
                .map(|p| (p.to_string(), p.to_string()))
                .collect(),
            CentroidMethod::Schwa => [("schwa".to_string(), config.schwa.clone())]
                .into_iter()
                .collect(),
        };
        if method != CentroidMethod::Schwa {
            if let Some(configured) = &config.points {
                points.extend(configured.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        Self {
            method,
            options: config.common(),
            formants: config.formant_spec(),
            slots: config.slots(),
            speaker: config.speaker.clone(),
            vowel: config.vowel.clone(),
            points,
        }
    }

    /// Centroid of one speaker's vowel space, one value per formant column
    fn centroid(
        &self,
        speaker: &str,
        means: &BTreeMap<String, Vec<f64>>,
        n_formants: usize,
    ) -> Result<Vec<f64>> {
        let apex = |role: &str| -> Result<&Vec<f64>> {
            let label = self.points.get(role).map(String::as_str).unwrap_or(role);
            means.get(label).ok_or_else(|| NormalizeError::MissingVowel {
                speaker: speaker.to_string(),
                vowel: label.to_string(),
            })
        };
        let average = |vertices: &[Vec<f64>]| -> Vec<f64> {
            (0..n_formants)
                .map(|i| mean(&vertices.iter().map(|v| v[i]).collect::<Vec<_>>()))
                .collect()
        };

        match self.method {
            CentroidMethod::Centroid => {
                let vertices: Vec<Vec<f64>> = if self.points.is_empty() {
                    means.values().cloned().collect()
                } else {
                    self.points
                        .keys()
                        .map(|role| apex(role).cloned())
                        .collect::<Result<_>>()?
                };
                Ok(average(&vertices))
            }
            CentroidMethod::ConvexHull => {
                if n_formants < 2 {
                    return Err(NormalizeError::InvalidParameter(
                        "convex-hull needs at least two formants".to_string(),
                    ));
                }
                let all: Vec<&Vec<f64>> = means.values().collect();
                let plane: Vec<(f64, f64)> = all.iter().map(|m| (m[0], m[1])).collect();
                let vertices: Vec<Vec<f64>> = convex_hull(&plane)
                    .into_iter()
                    .map(|i| all[i].clone())
                    .collect();
                Ok(average(&vertices))
            }
            CentroidMethod::WattFabricius1 | CentroidMethod::WattFabricius2 => {
                let fleece = apex("fleece")?;
                let trap = apex("trap")?;
                let goose = vec![fleece[0], fleece[0]];
                let f1 = mean(&[fleece[0], trap[0], goose[0]]);
                let f2 = if self.method == CentroidMethod::WattFabricius1 {
                    mean(&[fleece[1], trap[1], goose[1]])
                } else {
                    mean(&[fleece[1], goose[1]])
                };
                Ok(vec![f1, f2])
            }
            CentroidMethod::WattFabricius3 => {
                let fleece = apex("fleece")?.clone();
                let trap = apex("trap")?.clone();
                let goose: Vec<f64> = (0..n_formants)
                    .map(|i| means.values().map(|m| m[i]).fold(f64::INFINITY, f64::min))
                    .collect();
                Ok(average(&[fleece, trap, goose]))
            }
            CentroidMethod::Bigham => {
                let kit = apex("kit")?;
                let goose = apex("goose")?;
                let fleece = apex("fleece")?;
                let start = apex("start")?;
                let thought = apex("thought")?;
                let trap = apex("trap")?;
                let vertices = vec![
                    vec![fleece[0], goose[1]],
                    vec![kit[0], fleece[1]],
                    vec![mean(&[start[0], thought[0]]), mean(&[start[1], thought[1]])],
                    trap.clone(),
                ];
                Ok(average(&vertices))
            }
            CentroidMethod::Schwa => Ok(apex("schwa")?.clone()),
        }
    }
}

/// Mean of each formant column for each vowel label
fn vowel_means(
    group: &FormantTable,
    labels: &[String],
    columns: &[&str],
) -> Result<BTreeMap<String, Vec<f64>>> {
    let values = columns
        .iter()
        .map(|c| group.numeric(c))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let mut rows: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (row, label) in labels.iter().enumerate() {
        rows.entry(label.as_str()).or_default().push(row);
    }
    Ok(rows
        .into_iter()
        .map(|(label, rows)| {
            let means = values
                .iter()
                .map(|v| mean(&rows.iter().map(|&r| v[r]).collect::<Vec<_>>()))
                .collect();
            (label.to_string(), means)
        })
        .collect())
}

impl Normalizer for CentroidNormalizer {
    fn name(&self) -> &str {
        self.method.name()
    }

    fn classification(&self) -> Classification {
        Classification::new(Scope::Extrinsic, Scope::Intrinsic, Scope::Intrinsic)
    }

    fn options(&self) -> &CommonOptions {
        &self.options
    }

    fn partition_columns(&self) -> Vec<String> {
        vec![self.speaker.clone()]
    }

    fn required_columns(&self) -> Vec<String> {
        vec![self.speaker.clone(), self.vowel.clone()]
    }

    fn formant_columns(&self) -> FormantColumns {
        if self.method.is_formant_specific() {
            FormantColumns::Specific {
                slots: self.slots.clone(),
                required: vec![Slot::F1, Slot::F2],
            }
        } else {
            FormantColumns::Generic(self.formants.clone())
        }
    }

    fn apply(&self, group: &FormantTable, set: &FormantSet) -> Result<Outputs> {
        let columns: Vec<&str> = if self.method.is_formant_specific() {
            vec![set.require(Slot::F1)?, set.require(Slot::F2)?]
        } else {
            set.formants().iter().map(String::as_str).collect()
        };
        let labels = group.labels(&self.vowel)?;
        let speaker = group
            .labels(&self.speaker)?
            .into_iter()
            .next()
            .unwrap_or_default();

        let means = vowel_means(group, &labels, &columns)?;
        let centroid = self.centroid(&speaker, &means, columns.len())?;

        let mut outputs = Outputs::new();
        for (column, &c) in columns.iter().zip(&centroid) {
            let values = group.numeric(column)?;
            let normalized: Vec<f64> = if self.method == CentroidMethod::Schwa {
                values.iter().map(|v| v / c - 1.0).collect()
            } else {
                values.iter().map(|v| v / c).collect()
            };
            outputs.push(*column, normalized);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formant_table::Column;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// One speaker, one token per vowel
    fn speaker(vowels: &[(&str, f64, f64)]) -> FormantTable {
        FormantTable::from_columns(vec![
            ("speaker", Column::from(vec!["s1"; vowels.len()])),
            ("vowel", Column::from(vowels.iter().map(|v| v.0).collect::<Vec<_>>())),
            ("f1", Column::from(vowels.iter().map(|v| v.1).collect::<Vec<_>>())),
            ("f2", Column::from(vowels.iter().map(|v| v.2).collect::<Vec<_>>())),
        ])
        .unwrap()
    }

    #[test]
    fn test_centroid_all_vowels() {
        let input = speaker(&[("i", 300.0, 2300.0), ("a", 800.0, 1300.0), ("u", 400.0, 900.0)]);
        let out = CentroidNormalizer::new(CentroidMethod::Centroid)
            .normalize(&input)
            .unwrap();
        assert!(close(out.numeric("f1").unwrap()[0], 300.0 / 500.0));
        assert!(close(out.numeric("f2").unwrap()[1], 1300.0 / 1500.0));
    }

    #[test]
    fn test_centroid_selected_points() {
        let input = speaker(&[("i", 300.0, 2300.0), ("a", 800.0, 1300.0), ("u", 400.0, 900.0)]);
        let mut points = BTreeMap::new();
        points.insert("i".to_string(), "i".to_string());
        points.insert("a".to_string(), "a".to_string());
        let config = NormalizerConfig {
            points: Some(points),
            ..Default::default()
        };
        let out = CentroidNormalizer::from_config(CentroidMethod::Centroid, &config)
            .normalize(&input)
            .unwrap();
        assert!(close(out.numeric("f1").unwrap()[2], 400.0 / 550.0));
    }

    #[test]
    fn test_convex_hull_ignores_interior_vowel() {
        let input = speaker(&[
            ("i", 300.0, 2300.0),
            ("a", 800.0, 1300.0),
            ("u", 300.0, 900.0),
            ("e", 450.0, 1500.0),
        ]);
        let out = CentroidNormalizer::new(CentroidMethod::ConvexHull)
            .normalize(&input)
            .unwrap();
        let c1 = (300.0 + 800.0 + 300.0) / 3.0;
        assert!(close(out.numeric("f1").unwrap()[3], 450.0 / c1));
    }

    #[test]
    fn test_wattfab1() {
        let input = speaker(&[("fleece", 300.0, 2400.0), ("trap", 900.0, 1500.0)]);
        let out = CentroidNormalizer::new(CentroidMethod::WattFabricius1)
            .normalize(&input)
            .unwrap();
        let s1 = (300.0 + 900.0 + 300.0) / 3.0;
        let s2 = (2400.0 + 1500.0 + 300.0) / 3.0;
        assert!(close(out.numeric("f1").unwrap()[0], 300.0 / s1));
        assert!(close(out.numeric("f2").unwrap()[1], 1500.0 / s2));
    }

    #[test]
    fn test_wattfab2_f2_from_fleece_and_goose() {
        let input = speaker(&[("fleece", 300.0, 2400.0), ("trap", 900.0, 1500.0)]);
        let out = CentroidNormalizer::new(CentroidMethod::WattFabricius2)
            .normalize(&input)
            .unwrap();
        let s2 = (2400.0 + 300.0) / 2.0;
        assert!(close(out.numeric("f2").unwrap()[0], 2400.0 / s2));
    }

    #[test]
    fn test_wattfab3_minimum_goose() {
        let input = speaker(&[
            ("fleece", 300.0, 2400.0),
            ("trap", 900.0, 1500.0),
            ("goose", 320.0, 800.0),
        ]);
        let out = CentroidNormalizer::new(CentroidMethod::WattFabricius3)
            .normalize(&input)
            .unwrap();
        let s1 = (300.0 + 900.0 + 300.0) / 3.0;
        let s2 = (2400.0 + 1500.0 + 800.0) / 3.0;
        assert!(close(out.numeric("f1").unwrap()[2], 320.0 / s1));
        assert!(close(out.numeric("f2").unwrap()[2], 800.0 / s2));
    }

    #[test]
    fn test_bigham() {
        let input = speaker(&[
            ("kit", 400.0, 2000.0),
            ("goose", 350.0, 1200.0),
            ("fleece", 300.0, 2400.0),
            ("start", 800.0, 1300.0),
            ("thought", 600.0, 900.0),
            ("trap", 900.0, 1600.0),
        ]);
        let out = CentroidNormalizer::new(CentroidMethod::Bigham)
            .normalize(&input)
            .unwrap();
        let s1 = (300.0 + 400.0 + 700.0 + 900.0) / 4.0;
        let s2 = (1200.0 + 2400.0 + 1100.0 + 1600.0) / 4.0;
        assert!(close(out.numeric("f1").unwrap()[0], 400.0 / s1));
        assert!(close(out.numeric("f2").unwrap()[0], 2000.0 / s2));
    }

    #[test]
    fn test_schwa() {
        let input = speaker(&[("ə", 500.0, 1500.0), ("i", 300.0, 2250.0)]);
        let out = CentroidNormalizer::new(CentroidMethod::Schwa)
            .normalize(&input)
            .unwrap();
        assert!(close(out.numeric("f1").unwrap()[0], 0.0));
        assert!(close(out.numeric("f2").unwrap()[1], 0.5));
    }

    #[test]
    fn test_missing_apex_vowel_names_speaker() {
        let input = speaker(&[("fleece", 300.0, 2400.0)]);
        let err = CentroidNormalizer::new(CentroidMethod::WattFabricius1)
            .normalize(&input)
            .unwrap_err();
        match err {
            NormalizeError::MissingVowel { speaker, vowel } => {
                assert_eq!(speaker, "s1");
                assert_eq!(vowel, "trap");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}

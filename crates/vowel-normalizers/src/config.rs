//! Normalizer parameters

use crate::base::{CommonOptions, FormantSlots, Slot};
use crate::rename::Rename;
use formant_stats::BarkMethod;
use formant_table::ColumnSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every parameter understood by the built-in normalizers.
///
/// Registry constructors read the fields they need and ignore the rest, so
/// one document can configure any method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Output naming
    pub rename: Option<Rename>,
    /// Grouping columns
    pub groupby: Vec<String>,
    /// Formant columns of formant-generic methods
    pub formants: Option<ColumnSpec>,
    /// Slot bindings of formant-specific methods
    pub f0: Option<ColumnSpec>,
    pub f1: Option<ColumnSpec>,
    pub f2: Option<ColumnSpec>,
    pub f3: Option<ColumnSpec>,
    /// Speaker column
    pub speaker: String,
    /// Vowel label column
    pub vowel: String,
    /// Gender column
    pub gender: String,
    /// Female label in the gender column
    pub female: Option<String>,
    /// Male label in the gender column
    pub male: Option<String>,
    /// Reference vowels for centroid methods: role -> label in the data
    pub points: Option<BTreeMap<String, String>>,
    /// Label of the fleece vowel
    pub fleece: String,
    /// Label of the trap vowel
    pub trap: String,
    /// Label of the schwa vowel
    pub schwa: String,
    /// Hz to Bark formula
    pub bark_method: BarkMethod,
    /// Exponentiate log-mean normalized values
    pub exp: bool,
    /// Number of projection components
    pub n_components: usize,
    /// Input columns of projection methods
    pub columns: Option<ColumnSpec>,
    /// Method names run in order by the chain normalizer
    pub normalizers: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            rename: None,
            groupby: Vec::new(),
            formants: None,
            f0: None,
            f1: None,
            f2: None,
            f3: None,
            speaker: "speaker".to_string(),
            vowel: "vowel".to_string(),
            gender: "gender".to_string(),
            female: None,
            male: None,
            points: None,
            fleece: "fleece".to_string(),
            trap: "trap".to_string(),
            schwa: "ə".to_string(),
            bark_method: BarkMethod::default(),
            exp: false,
            n_components: 2,
            columns: None,
            normalizers: Vec::new(),
        }
    }
}

impl NormalizerConfig {
    /// Rename and group-by options
    pub fn common(&self) -> CommonOptions {
        CommonOptions {
            rename: self.rename.clone(),
            groupby: self.groupby.clone(),
        }
    }

    /// Generic formant columns, falling back to `f0`..`f5`
    pub fn formant_spec(&self) -> ColumnSpec {
        self.formants
            .clone()
            .unwrap_or_else(ColumnSpec::default_formants)
    }

    /// Slot bindings with configured overrides applied
    pub fn slots(&self) -> FormantSlots {
        let mut slots = FormantSlots::default();
        for (slot, spec) in [
            (Slot::F0, &self.f0),
            (Slot::F1, &self.f1),
            (Slot::F2, &self.f2),
            (Slot::F3, &self.f3),
        ] {
            if let Some(spec) = spec {
                slots.set(slot, spec.clone());
            }
        }
        slots
    }
}

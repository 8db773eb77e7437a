//! Normalizer base abstractions
//!
//! Every normalizer is run through the same split-apply-combine pipeline:
//! required columns are checked, formant column sets resolved, rows split
//! by the group-by and partition columns, [`Normalizer::apply`] run on
//! each piece, and the outputs scattered back into a copy of the input in
//! original row order before being named by the rename policy.

use crate::error::{NormalizeError, Result};
use crate::rename::{materialize, Rename};
use formant_table::{Column, ColumnSpec, FormantTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Whether a normalizer uses information from within or across a dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Uses only the current vowel, formant or speaker
    Intrinsic,
    /// Uses information across vowels, formants or speakers
    Extrinsic,
    /// Not classified along this dimension
    None,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Intrinsic => write!(f, "intrinsic"),
            Scope::Extrinsic => write!(f, "extrinsic"),
            Scope::None => write!(f, "none"),
        }
    }
}

/// Traditional classification of a normalization method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub vowel: Scope,
    pub formant: Scope,
    pub speaker: Scope,
}

impl Classification {
    /// Create a classification
    pub const fn new(vowel: Scope, formant: Scope, speaker: Scope) -> Self {
        Self {
            vowel,
            formant,
            speaker,
        }
    }

    /// Unclassified along every dimension
    pub const fn unclassified() -> Self {
        Self::new(Scope::None, Scope::None, Scope::None)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vowel {}, formant {}, speaker {}",
            self.vowel, self.formant, self.speaker
        )
    }
}

/// Named formant slot used by formant-specific normalizers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    F0,
    F1,
    F2,
    F3,
}

impl Slot {
    /// All slots in order
    pub const ALL: [Slot; 4] = [Slot::F0, Slot::F1, Slot::F2, Slot::F3];

    fn index(self) -> usize {
        self as usize
    }

    /// Default column name for the slot
    pub fn name(self) -> &'static str {
        match self {
            Slot::F0 => "f0",
            Slot::F1 => "f1",
            Slot::F2 => "f2",
            Slot::F3 => "f3",
        }
    }
}

/// Columns bound to each formant slot.
///
/// Each slot may select several columns (e.g. measurements at several
/// time points); slots are paired position-wise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormantSlots {
    pub f0: ColumnSpec,
    pub f1: ColumnSpec,
    pub f2: ColumnSpec,
    pub f3: ColumnSpec,
}

impl Default for FormantSlots {
    fn default() -> Self {
        Self {
            f0: ColumnSpec::name("f0"),
            f1: ColumnSpec::name("f1"),
            f2: ColumnSpec::name("f2"),
            f3: ColumnSpec::name("f3"),
        }
    }
}

impl FormantSlots {
    /// Columns bound to a slot
    pub fn get(&self, slot: Slot) -> &ColumnSpec {
        match slot {
            Slot::F0 => &self.f0,
            Slot::F1 => &self.f1,
            Slot::F2 => &self.f2,
            Slot::F3 => &self.f3,
        }
    }

    /// Rebind a slot
    pub fn set(&mut self, slot: Slot, spec: ColumnSpec) {
        match slot {
            Slot::F0 => self.f0 = spec,
            Slot::F1 => self.f1 = spec,
            Slot::F2 => self.f2 = spec,
            Slot::F3 => self.f3 = spec,
        }
    }
}

/// How a normalizer selects its formant columns
#[derive(Debug, Clone, PartialEq)]
pub enum FormantColumns {
    /// All selected columns are treated alike
    Generic(ColumnSpec),
    /// Columns are bound to named slots; `required` slots must resolve
    Specific {
        slots: FormantSlots,
        required: Vec<Slot>,
    },
}

impl FormantColumns {
    /// Resolve into the formant sets the normalizer is applied to
    pub fn resolve(&self, table: &FormantTable) -> Result<Vec<FormantSet>> {
        match self {
            FormantColumns::Generic(spec) => {
                let formants = match spec {
                    ColumnSpec::Names(_) => spec.resolve_present(table),
                    ColumnSpec::Pattern(_) => spec.resolve(table)?,
                };
                if formants.is_empty() {
                    return Err(NormalizeError::NoFormants(spec.to_string()));
                }
                Ok(vec![FormantSet::generic(formants)])
            }
            FormantColumns::Specific { slots, required } => {
                let mut lists: [Vec<String>; 4] = Default::default();
                for slot in Slot::ALL {
                    let spec = slots.get(slot);
                    lists[slot.index()] = if required.contains(&slot) {
                        spec.resolve(table)?
                    } else {
                        spec.resolve_present(table)
                    };
                }

                let expected = lists
                    .iter()
                    .map(Vec::len)
                    .find(|&n| n > 0)
                    .ok_or_else(|| NormalizeError::NoFormants("formant slots".to_string()))?;
                for slot in Slot::ALL {
                    let actual = lists[slot.index()].len();
                    if actual != 0 && actual != expected {
                        return Err(NormalizeError::SlotLengthMismatch {
                            slot: slot.name().to_string(),
                            expected,
                            actual,
                        });
                    }
                }

                Ok((0..expected)
                    .map(|i| {
                        let slots: [Option<String>; 4] =
                            std::array::from_fn(|k| lists[k].get(i).cloned());
                        let formants = slots.iter().flatten().cloned().collect();
                        FormantSet { slots, formants }
                    })
                    .collect())
            }
        }
    }
}

/// One set of formant columns processed together
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormantSet {
    slots: [Option<String>; 4],
    formants: Vec<String>,
}

impl FormantSet {
    /// Set without slot bindings
    pub fn generic(formants: Vec<String>) -> Self {
        Self {
            slots: Default::default(),
            formants,
        }
    }

    /// Column bound to a slot, if any
    pub fn slot(&self, slot: Slot) -> Option<&str> {
        self.slots[slot.index()].as_deref()
    }

    /// Column bound to a slot, or an error naming the slot
    pub fn require(&self, slot: Slot) -> Result<&str> {
        self.slot(slot)
            .ok_or_else(|| NormalizeError::NoFormants(slot.name().to_string()))
    }

    /// All columns in the set
    pub fn formants(&self) -> &[String] {
        &self.formants
    }
}

/// Columns produced by one application of a normalizer, keyed by the
/// source column they derive from (or by a new name)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs {
    columns: Vec<(String, Column)>,
}

impl Outputs {
    /// Empty outputs
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output column
    pub fn push(&mut self, name: impl Into<String>, column: impl Into<Column>) {
        self.columns.push((name.into(), column.into()));
    }

    /// Output by name
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Number of output columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether nothing was produced
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Consume into `(name, column)` pairs
    pub fn into_columns(self) -> Vec<(String, Column)> {
        self.columns
    }
}

/// Options shared by every normalizer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonOptions {
    /// Output naming; absent overwrites the source columns
    pub rename: Option<Rename>,
    /// Columns splitting the data before normalization
    pub groupby: Vec<String>,
}

/// A vowel normalization method
pub trait Normalizer: Send + Sync + fmt::Debug {
    /// Registered name of the method
    fn name(&self) -> &str;

    /// Classification of the method
    fn classification(&self) -> Classification;

    /// Rename and group-by options
    fn options(&self) -> &CommonOptions;

    /// Columns that split the data before the algorithm runs, e.g. speaker
    fn partition_columns(&self) -> Vec<String> {
        Vec::new()
    }

    /// Columns that must exist in the input
    fn required_columns(&self) -> Vec<String> {
        self.partition_columns()
    }

    /// Formant columns the method operates on
    fn formant_columns(&self) -> FormantColumns {
        FormantColumns::Generic(ColumnSpec::default_formants())
    }

    /// Normalize one partition of the data for one formant set.
    ///
    /// Every output column must have one value per row of `group`.
    fn apply(&self, group: &FormantTable, set: &FormantSet) -> Result<Outputs> {
        map_formants(group, set, |_, values| values.to_vec())
    }

    /// Normalize a whole table, returning a new table
    fn normalize(&self, table: &FormantTable) -> Result<FormantTable> {
        run_pipeline(self, table)
    }
}

/// Apply `f` to each formant column of the set, keeping its name
pub fn map_formants<F>(group: &FormantTable, set: &FormantSet, mut f: F) -> Result<Outputs>
where
    F: FnMut(&str, &[f64]) -> Vec<f64>,
{
    let mut outputs = Outputs::new();
    for name in set.formants() {
        let values = group.numeric(name)?;
        outputs.push(name.clone(), f(name, values));
    }
    Ok(outputs)
}

/// The shared split-apply-combine pipeline behind [`Normalizer::normalize`]
pub fn run_pipeline<N: Normalizer + ?Sized>(
    normalizer: &N,
    table: &FormantTable,
) -> Result<FormantTable> {
    let options = normalizer.options();
    table.require_columns(&normalizer.required_columns())?;
    table.require_columns(&options.groupby)?;

    let sets = normalizer.formant_columns().resolve(table)?;

    let mut keys = options.groupby.clone();
    for column in normalizer.partition_columns() {
        if !keys.contains(&column) {
            keys.push(column);
        }
    }
    let groups = table.group_by(&keys)?;

    let mut combined = Combined::new(table.n_rows());
    for set in &sets {
        for group in &groups {
            debug!(
                "{}: normalizing {} rows of group {:?}",
                normalizer.name(),
                group.rows.len(),
                group.key
            );
            let piece = table.take_rows(&group.rows)?;
            let outputs = normalizer.apply(&piece, set)?;
            combined.scatter(&group.rows, outputs)?;
        }
    }

    let mut result = table.clone();
    let written = materialize(&mut result, combined.columns, options.rename.as_ref())?;
    info!(
        "{}: normalized {} rows in {} groups, wrote {} columns",
        normalizer.name(),
        table.n_rows(),
        groups.len(),
        written.len()
    );
    Ok(result)
}

/// Full-length output columns assembled from per-group outputs
struct Combined {
    rows: usize,
    columns: Vec<(String, Column)>,
}

impl Combined {
    fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    fn scatter(&mut self, rows: &[usize], outputs: Outputs) -> Result<()> {
        for (name, column) in outputs.into_columns() {
            if column.len() != rows.len() {
                return Err(NormalizeError::InconsistentOutput(name));
            }
            let position = match self.columns.iter().position(|(n, _)| *n == name) {
                Some(position) => position,
                None => {
                    let blank = match column {
                        Column::Numeric(_) => Column::Numeric(vec![f64::NAN; self.rows]),
                        Column::Text(_) => Column::Text(vec![String::new(); self.rows]),
                    };
                    self.columns.push((name.clone(), blank));
                    self.columns.len() - 1
                }
            };
            match (&mut self.columns[position].1, column) {
                (Column::Numeric(dst), Column::Numeric(src)) => {
                    for (&row, value) in rows.iter().zip(src) {
                        dst[row] = value;
                    }
                }
                (Column::Text(dst), Column::Text(src)) => {
                    for (&row, value) in rows.iter().zip(src) {
                        dst[row] = value;
                    }
                }
                _ => return Err(NormalizeError::InconsistentOutput(name)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formant_stats::mean;
    use proptest::prelude::*;

    /// Subtracts the group mean from each formant
    #[derive(Debug, Default)]
    struct Centre {
        options: CommonOptions,
    }

    impl Normalizer for Centre {
        fn name(&self) -> &str {
            "centre"
        }

        fn classification(&self) -> Classification {
            Classification::unclassified()
        }

        fn options(&self) -> &CommonOptions {
            &self.options
        }

        fn partition_columns(&self) -> Vec<String> {
            vec!["speaker".to_string()]
        }

        fn apply(&self, group: &FormantTable, set: &FormantSet) -> Result<Outputs> {
            map_formants(group, set, |_, values| {
                let m = mean(values);
                values.iter().map(|v| v - m).collect()
            })
        }
    }

    fn table() -> FormantTable {
        FormantTable::from_columns(vec![
            ("speaker", Column::from(vec!["b", "a", "b", "a"])),
            ("f1", Column::from(vec![10.0, 1.0, 20.0, 3.0])),
            ("f2", Column::from(vec![100.0, 10.0, 300.0, 30.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_pipeline_keeps_row_order() {
        let out = Centre::default().normalize(&table()).unwrap();
        assert_eq!(out.labels("speaker").unwrap(), vec!["b", "a", "b", "a"]);
        assert_eq!(out.numeric("f1").unwrap(), &[-5.0, -1.0, 5.0, 1.0]);
        assert_eq!(out.numeric("f2").unwrap(), &[-100.0, -10.0, 100.0, 10.0]);
    }

    #[test]
    fn test_input_untouched_with_rename() {
        let input = table();
        let normalizer = Centre {
            options: CommonOptions {
                rename: Some(Rename::parse("{}_c")),
                groupby: Vec::new(),
            },
        };
        let out = normalizer.normalize(&input).unwrap();
        assert_eq!(out.numeric("f1").unwrap(), input.numeric("f1").unwrap());
        assert_eq!(out.column_names(), &["speaker", "f1", "f2", "f1_c", "f2_c"]);
    }

    #[test]
    fn test_missing_partition_column() {
        let input = FormantTable::from_columns(vec![("f1", Column::from(vec![1.0]))]).unwrap();
        assert!(matches!(
            Centre::default().normalize(&input),
            Err(NormalizeError::Table(_))
        ));
    }

    #[test]
    fn test_generic_names_skip_absent_columns() {
        let sets = FormantColumns::Generic(ColumnSpec::names(["f1", "f9", "f2"]))
            .resolve(&table())
            .unwrap();
        assert_eq!(sets[0].formants(), &["f1".to_string(), "f2".to_string()]);
        assert!(FormantColumns::Generic(ColumnSpec::names(["f9"]))
            .resolve(&table())
            .is_err());
    }

    #[test]
    fn test_generic_without_formants() {
        let input = FormantTable::from_columns(vec![("speaker", Column::from(vec!["a"]))]).unwrap();
        assert!(matches!(
            Centre::default().normalize(&input),
            Err(NormalizeError::NoFormants(_))
        ));
    }

    #[test]
    fn test_specific_slots_zip_time_points() {
        let input = FormantTable::from_columns(vec![
            ("f1@25", Column::from(vec![1.0])),
            ("f1@50", Column::from(vec![2.0])),
            ("f2@25", Column::from(vec![3.0])),
            ("f2@50", Column::from(vec![4.0])),
        ])
        .unwrap();
        let mut slots = FormantSlots::default();
        slots.set(Slot::F1, ColumnSpec::pattern(r"f1@\d+").unwrap());
        slots.set(Slot::F2, ColumnSpec::pattern(r"f2@\d+").unwrap());
        let columns = FormantColumns::Specific {
            slots,
            required: vec![Slot::F1, Slot::F2],
        };
        let sets = columns.resolve(&input).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[1].slot(Slot::F1), Some("f1@50"));
        assert_eq!(sets[1].slot(Slot::F2), Some("f2@50"));
        assert_eq!(sets[1].slot(Slot::F0), None);
        assert_eq!(sets[0].formants(), &["f1@25", "f2@25"]);
    }

    #[test]
    fn test_specific_slot_length_mismatch() {
        let input = FormantTable::from_columns(vec![
            ("f1a", Column::from(vec![1.0])),
            ("f1b", Column::from(vec![2.0])),
            ("f2", Column::from(vec![3.0])),
        ])
        .unwrap();
        let mut slots = FormantSlots::default();
        slots.set(Slot::F1, ColumnSpec::names(["f1a", "f1b"]));
        let columns = FormantColumns::Specific {
            slots,
            required: vec![Slot::F1, Slot::F2],
        };
        assert!(matches!(
            columns.resolve(&input),
            Err(NormalizeError::SlotLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_specific_required_slot_missing() {
        let input = FormantTable::from_columns(vec![("f1", Column::from(vec![1.0]))]).unwrap();
        let columns = FormantColumns::Specific {
            slots: FormantSlots::default(),
            required: vec![Slot::F1, Slot::F2],
        };
        assert!(matches!(columns.resolve(&input), Err(NormalizeError::Table(_))));
    }

    proptest! {
        #[test]
        fn prop_row_count_preserved(
            values in proptest::collection::vec((0usize..3, 1.0f64..5000.0), 1..40)
        ) {
            let speakers: Vec<String> = values.iter().map(|(s, _)| format!("s{}", s)).collect();
            let f1: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
            let input = FormantTable::from_columns(vec![
                ("speaker", Column::from(speakers.clone())),
                ("f1", Column::from(f1)),
            ]).unwrap();
            let out = Centre::default().normalize(&input).unwrap();
            prop_assert_eq!(out.n_rows(), input.n_rows());
            prop_assert_eq!(out.labels("speaker").unwrap(), speakers);
        }
    }
}

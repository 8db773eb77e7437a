//! Sequential composition of normalizers

use crate::base::{Classification, CommonOptions, Normalizer};
use crate::error::Result;
use crate::rename::materialize;
use formant_table::{Column, FormantTable};
use tracing::debug;

/// Runs normalizers in order, each on the previous one's output.
///
/// The steps write in place on a working copy. With a chain-level
/// `rename`, every column the steps added or changed is then written into
/// the input table under that directive.
#[derive(Debug, Default)]
pub struct ChainNormalizer {
    options: CommonOptions,
    normalizers: Vec<Box<dyn Normalizer>>,
}

impl ChainNormalizer {
    /// Chain the given normalizers
    pub fn new(normalizers: Vec<Box<dyn Normalizer>>) -> Self {
        Self {
            options: CommonOptions::default(),
            normalizers,
        }
    }

    /// Chain the given normalizers with chain-level options
    pub fn with_options(normalizers: Vec<Box<dyn Normalizer>>, options: CommonOptions) -> Self {
        Self {
            options,
            normalizers,
        }
    }

    /// Append a normalizer
    pub fn push(&mut self, normalizer: Box<dyn Normalizer>) {
        self.normalizers.push(normalizer);
    }

    /// Names of the chained normalizers, in order
    pub fn steps(&self) -> Vec<&str> {
        self.normalizers.iter().map(|n| n.name()).collect()
    }
}

impl Normalizer for ChainNormalizer {
    fn name(&self) -> &str {
        "chain"
    }

    fn classification(&self) -> Classification {
        Classification::unclassified()
    }

    fn options(&self) -> &CommonOptions {
        &self.options
    }

    fn normalize(&self, table: &FormantTable) -> Result<FormantTable> {
        let mut current = table.clone();
        for normalizer in &self.normalizers {
            debug!("chain: running {}", normalizer.name());
            current = normalizer.normalize(&current)?;
        }
        let Some(rename) = self.options.rename.as_ref() else {
            return Ok(current);
        };

        let mut outputs = Vec::new();
        for name in current.column_names() {
            let column = current.column(name)?;
            let unchanged = table.has_column(name) && same_values(table.column(name)?, column);
            if !unchanged {
                outputs.push((name.clone(), column.clone()));
            }
        }
        let mut result = table.clone();
        materialize(&mut result, outputs, Some(rename))?;
        Ok(result)
    }
}

/// Equality treating NaN cells as equal
fn same_values(a: &Column, b: &Column) -> bool {
    match (a, b) {
        (Column::Numeric(a), Column::Numeric(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .zip(b)
                    .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
        }
        (Column::Text(a), Column::Text(b)) => a == b,
        _ => false,
    }
}

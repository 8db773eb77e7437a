//! Statistical projections
//!
//! The selected columns are projected onto `n_components` new axes, written
//! as `f1`..`fn`. Rows with a missing value in any input column are left
//! out of the fit and get NaN outputs.

use crate::base::{
    Classification, CommonOptions, FormantColumns, FormantSet, Normalizer, Outputs, Scope,
};
use crate::config::NormalizerConfig;
use crate::error::{NormalizeError, Result};
use formant_stats::{column_means, covariance_matrix, symmetric_eigen, StatsError};
use formant_table::{ColumnSpec, FormantTable};
use ndarray::{s, Array1, Array2, Axis};
use std::collections::BTreeMap;
use tracing::debug;

/// Relative eigenvalue below which a within-class scatter matrix is singular
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Projection method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Principal components of the centred data
    Pca,
    /// Linear discriminants of the vowel classes
    Lda,
}

impl Projection {
    fn name(self) -> &'static str {
        match self {
            Projection::Pca => "pca",
            Projection::Lda => "lda",
        }
    }
}

/// Projection normalizer
#[derive(Debug, Clone)]
pub struct ProjectionNormalizer {
    projection: Projection,
    options: CommonOptions,
    columns: ColumnSpec,
    vowel: String,
    n_components: usize,
}

impl ProjectionNormalizer {
    /// Build from parameters; `columns` falls back to the formant columns
    pub fn from_config(projection: Projection, config: &NormalizerConfig) -> Result<Self> {
        if config.n_components == 0 {
            return Err(NormalizeError::InvalidParameter(
                "n_components must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            projection,
            options: config.common(),
            columns: config
                .columns
                .clone()
                .unwrap_or_else(|| config.formant_spec()),
            vowel: config.vowel.clone(),
            n_components: config.n_components,
        })
    }

    fn output_names(&self) -> Vec<String> {
        (1..=self.n_components).map(|i| format!("f{}", i)).collect()
    }
}

/// Rows of `columns` without missing values, with their row indices
fn complete_rows(group: &FormantTable, columns: &[String]) -> Result<(Array2<f64>, Vec<usize>)> {
    let values = columns
        .iter()
        .map(|c| group.numeric(c))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let rows: Vec<usize> = (0..group.n_rows())
        .filter(|&r| values.iter().all(|v| v[r].is_finite()))
        .collect();
    let data = Array2::from_shape_fn((rows.len(), columns.len()), |(i, j)| values[j][rows[i]]);
    Ok((data, rows))
}

/// Inverse square root of a symmetric positive definite matrix
fn inverse_sqrt(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let eigen = symmetric_eigen(matrix)?;
    let largest = eigen.values.iter().cloned().fold(0.0, f64::max);
    if eigen
        .values
        .iter()
        .any(|&v| v <= SINGULAR_TOLERANCE * largest.max(f64::MIN_POSITIVE))
    {
        return Err(StatsError::Singular.into());
    }
    let scale = Array2::from_diag(&eigen.values.mapv(|v| 1.0 / v.sqrt()));
    Ok(eigen.vectors.dot(&scale).dot(&eigen.vectors.t()))
}

impl ProjectionNormalizer {
    fn pca(&self, centred: &Array2<f64>) -> Result<Array2<f64>> {
        let cov = covariance_matrix(centred)?;
        let eigen = symmetric_eigen(&cov)?;
        debug!("pca: eigenvalues {:?}", eigen.values.to_vec());
        Ok(centred.dot(&eigen.vectors.slice(s![.., ..self.n_components])))
    }

    fn lda(&self, centred: &Array2<f64>, labels: &[&str]) -> Result<Array2<f64>> {
        let (n, p) = centred.dim();
        let mut classes: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, label) in labels.iter().enumerate() {
            classes.entry(*label).or_default().push(i);
        }
        let k = classes.len();
        if k < 2 || self.n_components > (k - 1).min(p) {
            return Err(NormalizeError::InvalidParameter(format!(
                "lda with {} classes and {} columns supports at most {} components, {} requested",
                k,
                p,
                k.saturating_sub(1).min(p),
                self.n_components
            )));
        }
        if n <= k {
            return Err(StatsError::TooFewObservations { needed: k + 1, got: n }.into());
        }

        let mut within = Array2::<f64>::zeros((p, p));
        let mut between = Array2::<f64>::zeros((p, p));
        for rows in classes.values() {
            let members = centred.select(Axis(0), rows);
            let class_mean: Array1<f64> = column_means(&members)?;
            let deviations = &members - &class_mean;
            within = within + deviations.t().dot(&deviations);
            let m = class_mean.view().insert_axis(Axis(1));
            between = between + m.dot(&m.t()) * rows.len() as f64;
        }
        within /= (n - k) as f64;
        between /= n as f64;

        let whitening = inverse_sqrt(&within)?;
        let whitened_between = whitening.dot(&between).dot(&whitening);
        let eigen = symmetric_eigen(&whitened_between)?;
        debug!("lda: discriminant eigenvalues {:?}", eigen.values.to_vec());
        let scalings = whitening.dot(&eigen.vectors.slice(s![.., ..self.n_components]));
        Ok(centred.dot(&scalings))
    }
}

impl Normalizer for ProjectionNormalizer {
    fn name(&self) -> &str {
        self.projection.name()
    }

    fn classification(&self) -> Classification {
        Classification::new(Scope::Extrinsic, Scope::Extrinsic, Scope::Extrinsic)
    }

    fn options(&self) -> &CommonOptions {
        &self.options
    }

    fn required_columns(&self) -> Vec<String> {
        match self.projection {
            Projection::Pca => Vec::new(),
            Projection::Lda => vec![self.vowel.clone()],
        }
    }

    fn formant_columns(&self) -> FormantColumns {
        FormantColumns::Generic(self.columns.clone())
    }

    fn apply(&self, group: &FormantTable, set: &FormantSet) -> Result<Outputs> {
        let columns = set.formants();
        if self.n_components > columns.len() {
            return Err(NormalizeError::InvalidParameter(format!(
                "{} components requested from {} columns",
                self.n_components,
                columns.len()
            )));
        }
        let (data, rows) = complete_rows(group, columns)?;
        let means = column_means(&data)?;
        let centred = &data - &means;

        let projected = match self.projection {
            Projection::Pca => self.pca(&centred)?,
            Projection::Lda => {
                let labels = group.labels(&self.vowel)?;
                let labels: Vec<&str> = rows.iter().map(|&r| labels[r].as_str()).collect();
                self.lda(&centred, &labels)?
            }
        };

        let mut outputs = Outputs::new();
        for (j, name) in self.output_names().into_iter().enumerate() {
            let mut values = vec![f64::NAN; group.n_rows()];
            for (i, &row) in rows.iter().enumerate() {
                values[row] = projected[[i, j]];
            }
            outputs.push(name, values);
        }
        Ok(outputs)
    }
}

//! Configuration-driven job runner

use crate::config::AppConfig;
use crate::error::{Result, VlnmError};
use formant_table::{delimiter, read_csv_path, write_csv_path, FormantTable};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use vowel_normalizers::{normalize, DataSource};
use vowel_plot::plot_elements;

/// Summary of a finished run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobReport {
    /// Normalization method as configured
    pub method: Option<String>,
    /// Rows of the normalized table
    pub rows: usize,
    /// Columns of the normalized table
    pub columns: usize,
    pub output: Option<PathBuf>,
    pub plot: Option<PathBuf>,
    /// Elements drawn in the plot
    pub plot_elements: usize,
    pub elapsed_secs: f64,
}

/// Run the normalize job, then the plot job
pub fn run(config: &AppConfig) -> Result<JobReport> {
    if config.normalize.is_none() && config.plot.is_none() {
        return Err(VlnmError::NothingToDo);
    }
    let started = Instant::now();
    let mut report = JobReport::default();
    let mut normalized: Option<FormantTable> = None;

    if let Some(job) = &config.normalize {
        info!(
            "Normalizing {} with {}",
            job.input.display(),
            job.method
        );
        let table = normalize(
            DataSource::Path(job.input.clone()),
            job.method.as_str(),
            &job.options(),
        )?;
        if let Some(output) = &job.output {
            write_csv_path(&table, output, delimiter(job.output_sep)?)?;
            info!("Wrote {} rows to {}", table.n_rows(), output.display());
        }
        report.method = Some(job.method.clone());
        report.rows = table.n_rows();
        report.columns = table.n_columns();
        report.output = job.output.clone();
        normalized = Some(table);
    }

    if let Some(job) = &config.plot {
        let table = match (&job.input, normalized) {
            (Some(input), _) => read_csv_path(input, delimiter(job.sep)?)?,
            (None, Some(table)) => table,
            (None, None) => return Err(VlnmError::MissingPlotInput),
        };
        let figure = plot_elements(&table, job.plot_settings(), &job.elements)?;
        figure.write_html(&job.output)?;
        report.plot = Some(job.output.clone());
        report.plot_elements = figure.element_count();
    }

    report.elapsed_secs = started.elapsed().as_secs_f64();
    info!(
        "Job finished in {:.3}s: {} rows, {} columns, {} plot elements",
        report.elapsed_secs, report.rows, report.columns, report.plot_elements
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_rejected() {
        assert!(matches!(
            run(&AppConfig::default()),
            Err(VlnmError::NothingToDo)
        ));
    }

    #[test]
    fn test_plot_without_input() {
        let config = AppConfig::from_toml("[plot]\noutput = \"plot.html\"\n").unwrap();
        assert!(matches!(run(&config), Err(VlnmError::MissingPlotInput)));
    }
}

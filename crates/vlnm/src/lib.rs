//! VLNM
//!
//! Vowel formant normalization. Re-exports the workspace crates and runs
//! normalize and plot jobs described by layered configuration.

mod config;
mod error;
mod job;
mod logging;

pub use config::{AppConfig, LoggingConfig, NormalizeJob, PlotJob};
pub use error::{Result, VlnmError};
pub use job::{run, JobReport};
pub use logging::init_logging;

pub use formant_stats;
pub use formant_table;
pub use vowel_normalizers;
pub use ::vowel_plot;

pub use formant_table::{
    read_csv, read_csv_path, write_csv, write_csv_path, Column, ColumnSpec, FormantTable,
};
pub use vowel_normalizers::{
    describe, get_normalizer, list_normalizers, normalize, normalize_to, register_normalizer,
    DataSink, DataSource, Method, NormalizeError, NormalizeOptions, Normalizer, NormalizerConfig,
    Rename,
};
pub use ::vowel_plot::{plot_elements, vowel_plot, Figure, PlotElement, PlotSettings, Props};

//! Job configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `VLNM__`-prefixed environment variables with `__`
//! separating nested keys (`VLNM__NORMALIZE__METHOD=lobanov`).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vowel_normalizers::{NormalizeOptions, NormalizerConfig, Rename};
use vowel_plot::{PlotElement, PlotSettings};

const DEFAULT_CONFIG: &str = r#"
[logging]
level = "info"
"#;

const ENV_PREFIX: &str = "VLNM";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Normalize a delimited file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeJob {
    pub input: PathBuf,
    /// Written with `output_sep`; without it the result is only passed on
    /// to the plot job
    #[serde(default)]
    pub output: Option<PathBuf>,
    pub method: String,
    #[serde(default = "default_sep")]
    pub sep: char,
    #[serde(default = "default_sep")]
    pub output_sep: char,
    /// Overrides `params.groupby` when present
    #[serde(default)]
    pub groupby: Option<Vec<String>>,
    #[serde(default)]
    pub rename: Option<Rename>,
    #[serde(default)]
    pub params: NormalizerConfig,
}

impl NormalizeJob {
    pub fn options(&self) -> NormalizeOptions {
        NormalizeOptions {
            sep: self.sep,
            output_sep: self.output_sep,
            groupby: self.groupby.clone(),
            rename: self.rename.clone(),
            params: self.params.clone(),
        }
    }
}

/// Draw a vowel plot to an HTML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotJob {
    /// Table to plot; the normalize job's result when absent
    #[serde(default)]
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    #[serde(default = "default_sep")]
    pub sep: char,
    /// Overrides `settings.x`
    #[serde(default)]
    pub x: Option<String>,
    /// Overrides `settings.y`
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub settings: PlotSettings,
    #[serde(default)]
    pub elements: Vec<PlotElement>,
}

impl PlotJob {
    /// Settings with the axis overrides applied
    pub fn plot_settings(&self) -> PlotSettings {
        let mut settings = self.settings.clone();
        if let Some(x) = &self.x {
            settings.x = x.clone();
        }
        if let Some(y) = &self.y {
            settings.y = y.clone();
        }
        settings
    }
}

fn default_sep() -> char {
    ','
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub normalize: Option<NormalizeJob>,
    pub plot: Option<PlotJob>,
}

impl AppConfig {
    /// Defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Defaults overlaid with a TOML document, ignoring the environment
    pub fn from_toml(text: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }
}

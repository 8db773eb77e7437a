//! vlnm-job: run the normalize and plot jobs of a configuration file

use anyhow::Context;
use std::path::PathBuf;
use tracing::info;
use vlnm::{init_logging, run, AppConfig};

fn main() -> anyhow::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("VLNM_CONFIG"))
        .map(PathBuf::from);

    let config = AppConfig::load(path.as_deref()).with_context(|| match &path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;
    init_logging(&config.logging.level);

    info!("=== vlnm-job v{} ===", env!("CARGO_PKG_VERSION"));
    let report = run(&config).context("Job failed")?;
    if let Some(output) = &report.output {
        info!("Normalized table: {}", output.display());
    }
    if let Some(plot) = &report.plot {
        info!("Plot: {}", plot.display());
    }

    Ok(())
}

//! Static site build command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use quire_build::{BuildConfig, SiteBuilder};

/// Run the build command.
pub fn run(source: PathBuf, destination: PathBuf, strict: bool) -> Result<()> {
    let config = BuildConfig {
        source_dir: source,
        output_dir: destination,
        ..Default::default()
    };

    let report = SiteBuilder::new(config)
        .build()
        .context("Build aborted")?;

    tracing::info!(
        "Wrote {} pages in {}ms ({} warnings, {} failures)",
        report.written.len(),
        report.duration_ms,
        report.diagnostics.len(),
        report.failures.len()
    );

    if strict && !report.is_success() {
        anyhow::bail!("{} documents failed to build", report.failures.len());
    }

    Ok(())
}

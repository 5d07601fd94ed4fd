//! Report rendering
//!
//! Three formats: a human-oriented plain-text table, pretty JSON, and YAML.
//! All of them render from the same [`ComparisonReport`]; none of them
//! mutates it.

pub mod json;
pub mod table;
pub mod yaml;

use crate::model::ComparisonReport;
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

/// Render the report in the requested format
pub fn render(report: &ComparisonReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::render(report)),
        OutputFormat::Json => json::render(report),
        OutputFormat::Yaml => yaml::render(report),
    }
}

/// Render and write the report to a file
pub fn write_to_file(report: &ComparisonReport, format: OutputFormat, path: &Path) -> Result<()> {
    let rendered = render(report, format)?;
    std::fs::write(path, rendered)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

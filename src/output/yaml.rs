//! YAML rendering

use crate::model::ComparisonReport;
use anyhow::{Context, Result};

pub fn render(report: &ComparisonReport) -> Result<String> {
    serde_yaml::to_string(report).context("Failed to serialize report as YAML")
}

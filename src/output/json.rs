//! JSON rendering

use crate::model::ComparisonReport;
use anyhow::{Context, Result};

pub fn render(report: &ComparisonReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report as JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReportSummary, Severity};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn empty_report() -> ComparisonReport {
        ComparisonReport {
            account1_id: "111111111111".to_string(),
            account2_id: "222222222222".to_string(),
            region: "us-east-1".to_string(),
            services_compared: vec![],
            timestamp: Utc::now(),
            results: vec![],
            summary: ReportSummary {
                total_services_compared: 0,
                total_services_with_changes: 0,
                total_changes: 0,
                total_resources_account1: 0,
                total_resources_account2: 0,
                changes_by_severity: BTreeMap::from([(Severity::High, 0)]),
                execution_time_seconds: 0.0,
            },
            errors: vec![],
        }
    }

    #[test]
    fn severities_serialize_lowercase() {
        let rendered = render(&empty_report()).unwrap();
        assert!(rendered.contains("\"high\": 0"));
        assert!(rendered.contains("\"account1_id\": \"111111111111\""));
        // Empty error list is omitted entirely.
        assert!(!rendered.contains("\"errors\""));
    }
}

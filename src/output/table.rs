//! Plain-text table rendering
//!
//! The default CLI output. Sections per service, one line per resource type
//! with add/remove/modify/unchanged counts, then the individual changes
//! sorted most-severe first. Values are truncated so policy documents do not
//! flood the terminal.

use crate::model::{ComparisonReport, ResourceChange, ServiceComparisonResult};
use serde_json::Value;
use std::fmt::Write;

const VALUE_WIDTH: usize = 48;
const RULE: &str = "================================================================================";
const SUBRULE: &str = "--------------------------------------------------------------------------------";

pub fn render(report: &ComparisonReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Account comparison: {} vs {}", report.account1_id, report.account2_id);
    let _ = writeln!(
        out,
        "Region: {}   Generated: {}",
        report.region,
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "{}", RULE);

    for result in &report.results {
        render_service(&mut out, result);
    }

    render_summary(&mut out, report);

    if !report.errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "!! ERRORS ({}) !!", report.errors.len());
        for error in &report.errors {
            match &error.resource_type {
                Some(rt) => {
                    let _ = writeln!(out, "  {}/{}: {}", error.service_name, rt, error.message);
                }
                None => {
                    let _ = writeln!(out, "  {}: {}", error.service_name, error.message);
                }
            }
        }
    }

    out
}

fn render_service(out: &mut String, result: &ServiceComparisonResult) {
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} ({} changes, {:.2}s)",
        result.service_name.to_uppercase(),
        result.total_changes,
        result.execution_time_seconds
    );
    let _ = writeln!(out, "{}", SUBRULE);

    for comparison in &result.resource_comparisons {
        let _ = writeln!(
            out,
            "  {:<24} {:>4} vs {:<4}  +{} -{} ~{} ={}",
            comparison.resource_type,
            comparison.account1_count,
            comparison.account2_count,
            comparison.added.len(),
            comparison.removed.len(),
            comparison.modified.len(),
            comparison.unchanged_count
        );

        let mut changes: Vec<&ResourceChange> = comparison
            .added
            .iter()
            .chain(&comparison.removed)
            .chain(&comparison.modified)
            .collect();
        // Most severe first; stable sort keeps input order within a tier.
        changes.sort_by(|a, b| b.severity.cmp(&a.severity));

        for change in changes {
            let _ = writeln!(
                out,
                "    [{:>8}] {:<8} {} {}",
                change.severity.label(),
                format!("{:?}", change.change_type).to_lowercase(),
                change.resource_id,
                change
                    .field_path
                    .as_deref()
                    .map(|p| format!("({})", p))
                    .unwrap_or_default()
            );
            if let (Some(old), Some(new)) = (&change.old_value, &change.new_value) {
                let _ = writeln!(
                    out,
                    "               {} -> {}",
                    truncate(old),
                    truncate(new)
                );
            }
        }

        for warning in &comparison.warnings {
            let _ = writeln!(out, "    warning: {}", warning);
        }
    }
}

fn render_summary(out: &mut String, report: &ComparisonReport) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "Summary: {} changes across {} of {} services ({:.2}s)",
        report.summary.total_changes,
        report.summary.total_services_with_changes,
        report.summary.total_services_compared,
        report.summary.execution_time_seconds
    );
    let _ = writeln!(
        out,
        "Resources: {} in account1, {} in account2",
        report.summary.total_resources_account1, report.summary.total_resources_account2
    );
    if !report.summary.changes_by_severity.is_empty() {
        let parts: Vec<String> = report
            .summary
            .changes_by_severity
            .iter()
            .rev()
            .map(|(severity, count)| format!("{}: {}", severity.label(), count))
            .collect();
        let _ = writeln!(out, "By severity: {}", parts.join("  "));
    }
    let _ = writeln!(out, "{}", RULE);
}

fn truncate(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if rendered.chars().count() <= VALUE_WIDTH {
        rendered
    } else {
        let short: String = rendered.chars().take(VALUE_WIDTH - 3).collect();
        format!("{}...", short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ChangeType, ReportSummary, ResourceTypeComparison, Severity,
    };
    use chrono::Utc;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn change(severity: Severity) -> ResourceChange {
        ResourceChange {
            change_type: ChangeType::Modified,
            resource_id: "q1".to_string(),
            resource_type: "queues".to_string(),
            field_path: Some("visibility_timeout".to_string()),
            old_value: Some(json!(30)),
            new_value: Some(json!(60)),
            severity,
            description: "Value changed from 30 to 60".to_string(),
        }
    }

    fn report_with(modified: Vec<ResourceChange>) -> ComparisonReport {
        let comparison = ResourceTypeComparison {
            resource_type: "queues".to_string(),
            account1_count: 1,
            account2_count: 1,
            added: vec![],
            removed: vec![],
            modified,
            unchanged_count: 0,
            warnings: vec![],
        };
        let result = ServiceComparisonResult::new(
            "sqs".to_string(),
            vec![comparison],
            vec![],
            0.01,
        );
        let total = result.total_changes;
        ComparisonReport {
            account1_id: "111111111111".to_string(),
            account2_id: "222222222222".to_string(),
            region: "us-east-1".to_string(),
            services_compared: vec!["sqs".to_string()],
            timestamp: Utc::now(),
            results: vec![result],
            summary: ReportSummary {
                total_services_compared: 1,
                total_services_with_changes: 1,
                total_changes: total,
                total_resources_account1: 1,
                total_resources_account2: 1,
                changes_by_severity: BTreeMap::new(),
                execution_time_seconds: 0.01,
            },
            errors: vec![],
        }
    }

    #[test]
    fn severe_changes_render_before_mild_ones() {
        let rendered = render(&report_with(vec![
            change(Severity::Low),
            change(Severity::Critical),
        ]));
        let critical = rendered.find("CRITICAL").unwrap();
        let low = rendered.find("LOW").unwrap();
        assert!(critical < low);
        assert!(rendered.contains("+0 -0 ~2 =0"));
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "x".repeat(200);
        let mut c = change(Severity::Medium);
        c.old_value = Some(json!(long));
        let rendered = render(&report_with(vec![c]));
        assert!(rendered.contains("..."));
        assert!(!rendered.contains(&"x".repeat(60)));
    }
}

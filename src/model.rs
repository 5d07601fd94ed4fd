//! Comparison report data model
//!
//! These types are the output side of the engine: every classification and
//! aggregate is baked in at construction time so a report can be rendered
//! (table, JSON, YAML) without further computation. Nothing here is mutated
//! after construction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Kind of difference detected for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Present only in account2's collection
    Added,
    /// Present only in account1's collection
    Removed,
    /// Present in both with at least one non-excluded field differing
    Modified,
}

/// How consequential a detected change is (ordered, lowest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Short label used by the table formatter
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

/// One detected difference
///
/// For a modified resource, one `ResourceChange` is emitted per differing
/// leaf field path. Whole-resource additions and removals carry the full
/// record snapshot instead of a field path.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceChange {
    pub change_type: ChangeType,
    pub resource_id: String,
    pub resource_type: String,
    /// Dotted/bracketed path into the record; `None` for whole-resource changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    pub severity: Severity,
    pub description: String,
}

/// Add/remove/modify/unchanged outcome for one resource type
#[derive(Debug, Clone, Serialize)]
pub struct ResourceTypeComparison {
    pub resource_type: String,
    /// Raw input size for account1 (duplicates included)
    pub account1_count: usize,
    /// Raw input size for account2 (duplicates included)
    pub account2_count: usize,
    pub added: Vec<ResourceChange>,
    pub removed: Vec<ResourceChange>,
    pub modified: Vec<ResourceChange>,
    /// Resources present in both collections with zero non-excluded differences
    pub unchanged_count: usize,
    /// Data-quality notes: duplicate identifiers, unmatchable or skipped records
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ResourceTypeComparison {
    pub fn total_changes(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }

    /// Distinct resources represented in the modified change list
    pub fn modified_resource_count(&self) -> usize {
        let mut ids: Vec<&str> = self.modified.iter().map(|c| c.resource_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}

/// Comparison outcome for one service across all of its resource types
#[derive(Debug, Clone, Serialize)]
pub struct ServiceComparisonResult {
    pub service_name: String,
    /// Per-type outcomes, in the catalog's configuration order
    pub resource_comparisons: Vec<ResourceTypeComparison>,
    /// One entry per resource type that failed to compare
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ServiceError>,
    pub execution_time_seconds: f64,
    pub total_changes: usize,
    pub has_errors: bool,
}

impl ServiceComparisonResult {
    pub fn new(
        service_name: String,
        resource_comparisons: Vec<ResourceTypeComparison>,
        errors: Vec<ServiceError>,
        execution_time_seconds: f64,
    ) -> Self {
        let total_changes = resource_comparisons.iter().map(|c| c.total_changes()).sum();
        let has_errors = !errors.is_empty();
        Self {
            service_name,
            resource_comparisons,
            errors,
            execution_time_seconds,
            total_changes,
            has_errors,
        }
    }

    pub fn resource_comparison(&self, resource_type: &str) -> Option<&ResourceTypeComparison> {
        self.resource_comparisons
            .iter()
            .find(|c| c.resource_type == resource_type)
    }
}

/// Error captured while comparing a service or one of its resource types
#[derive(Debug, Clone, Serialize)]
pub struct ServiceError {
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub message: String,
}

impl ServiceError {
    pub fn for_service(service_name: &str, message: impl Into<String>) -> Self {
        Self {
            service_name: service_name.to_string(),
            resource_type: None,
            message: message.into(),
        }
    }

    pub fn for_resource_type(
        service_name: &str,
        resource_type: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.to_string(),
            resource_type: Some(resource_type.to_string()),
            message: message.into(),
        }
    }
}

/// Aggregate statistics across the whole report
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_services_compared: usize,
    pub total_services_with_changes: usize,
    pub total_changes: usize,
    pub total_resources_account1: usize,
    pub total_resources_account2: usize,
    pub changes_by_severity: BTreeMap<Severity, usize>,
    pub execution_time_seconds: f64,
}

/// Full cross-service, cross-account comparison result
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub account1_id: String,
    pub account2_id: String,
    pub region: String,
    pub services_compared: Vec<String>,
    pub timestamp: DateTime<Utc>,
    /// Per-service results, in the requested comparison order
    pub results: Vec<ServiceComparisonResult>,
    pub summary: ReportSummary,
    /// All per-service errors, concatenated
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ServiceError>,
}

impl ComparisonReport {
    pub fn get_service_result(&self, service_name: &str) -> Option<&ServiceComparisonResult> {
        self.results.iter().find(|r| r.service_name == service_name)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(severity: Severity) -> ResourceChange {
        ResourceChange {
            change_type: ChangeType::Modified,
            resource_id: "r".to_string(),
            resource_type: "queues".to_string(),
            field_path: Some("visibility_timeout".to_string()),
            old_value: Some(Value::from(30)),
            new_value: Some(Value::from(60)),
            severity,
            description: "Value changed".to_string(),
        }
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"critical\""
        );
    }

    #[test]
    fn total_changes_counts_all_three_lists() {
        let comparison = ResourceTypeComparison {
            resource_type: "queues".to_string(),
            account1_count: 3,
            account2_count: 3,
            added: vec![change(Severity::High)],
            removed: vec![],
            modified: vec![change(Severity::Low), change(Severity::Medium)],
            unchanged_count: 1,
            warnings: vec![],
        };
        assert_eq!(comparison.total_changes(), 3);
        assert!(comparison.has_changes());
    }

    #[test]
    fn service_result_bakes_in_totals() {
        let comparisons = vec![ResourceTypeComparison {
            resource_type: "queues".to_string(),
            account1_count: 1,
            account2_count: 1,
            added: vec![],
            removed: vec![],
            modified: vec![change(Severity::High)],
            unchanged_count: 0,
            warnings: vec![],
        }];
        let result =
            ServiceComparisonResult::new("sqs".to_string(), comparisons, vec![], 0.01);
        assert_eq!(result.total_changes, 1);
        assert!(!result.has_errors);
        assert!(result.resource_comparison("queues").is_some());
        assert!(result.resource_comparison("topics").is_none());
    }
}

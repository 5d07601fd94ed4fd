//! Comparison orchestration
//!
//! Drives the whole run: fans out one service comparison per requested
//! service, waits for all of them, then folds the per-service results into a
//! single [`ComparisonReport`]. Service failures are absorbed into the
//! report's error list; the engine itself only fails on unusable input.

use crate::catalog::ServiceCatalog;
use crate::compare::service::compare_service;
use crate::config::ComparisonConfig;
use crate::model::{ComparisonReport, ReportSummary, ServiceComparisonResult, ServiceError, Severity};
use crate::snapshot::AccountSnapshot;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Compare two account snapshots over the requested services
pub async fn compare_accounts(
    snapshot1: &AccountSnapshot,
    snapshot2: &AccountSnapshot,
    services: &[String],
    catalog: &ServiceCatalog,
    config: Arc<ComparisonConfig>,
) -> ComparisonReport {
    let started = Instant::now();
    if snapshot1.region != snapshot2.region {
        warn!(
            "Snapshots were captured in different regions ({} vs {})",
            snapshot1.region, snapshot2.region
        );
    }
    info!(
        "Comparing accounts {} and {} across {} services",
        snapshot1.account_id,
        snapshot2.account_id,
        services.len()
    );

    let mut errors = Vec::new();
    let mut tasks = Vec::with_capacity(services.len());
    for name in services {
        match catalog.get_service(name) {
            Some(def) => tasks.push(compare_service(
                name,
                def,
                snapshot1,
                snapshot2,
                Arc::clone(&config),
            )),
            None => {
                warn!("Skipping unknown service '{}'", name);
                errors.push(ServiceError::for_service(name, "unknown service"));
            }
        }
    }

    // buffered() yields in submission order, so the report is stable no
    // matter which service finishes first.
    let results: Vec<ServiceComparisonResult> = stream::iter(tasks)
        .buffered(config.max_workers)
        .collect()
        .await;
    for result in &results {
        errors.extend(result.errors.iter().cloned());
    }

    build_report(
        snapshot1,
        snapshot2,
        results,
        errors,
        started.elapsed().as_secs_f64(),
    )
}

/// Fold per-service results into the final report. Pure aggregation.
fn build_report(
    snapshot1: &AccountSnapshot,
    snapshot2: &AccountSnapshot,
    results: Vec<ServiceComparisonResult>,
    errors: Vec<ServiceError>,
    execution_time_seconds: f64,
) -> ComparisonReport {
    let mut changes_by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
    let mut total_resources_account1 = 0;
    let mut total_resources_account2 = 0;

    for result in &results {
        for comparison in &result.resource_comparisons {
            total_resources_account1 += comparison.account1_count;
            total_resources_account2 += comparison.account2_count;
            for change in comparison
                .added
                .iter()
                .chain(&comparison.removed)
                .chain(&comparison.modified)
            {
                *changes_by_severity.entry(change.severity).or_default() += 1;
            }
        }
    }

    let summary = ReportSummary {
        total_services_compared: results.len(),
        total_services_with_changes: results.iter().filter(|r| r.total_changes > 0).count(),
        total_changes: results.iter().map(|r| r.total_changes).sum(),
        total_resources_account1,
        total_resources_account2,
        changes_by_severity,
        execution_time_seconds,
    };

    ComparisonReport {
        account1_id: snapshot1.account_id.clone(),
        account2_id: snapshot2.account_id.clone(),
        region: snapshot1.region.clone(),
        services_compared: results.iter().map(|r| r.service_name.clone()).collect(),
        timestamp: Utc::now(),
        results,
        summary,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(account_id: &str, services: serde_json::Value) -> AccountSnapshot {
        serde_json::from_value(json!({
            "account_id": account_id,
            "region": "us-east-1",
            "services": services
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn unknown_service_is_reported_not_fatal() {
        let a = snapshot("111111111111", json!({}));
        let b = snapshot("222222222222", json!({}));
        let report = compare_accounts(
            &a,
            &b,
            &["sqs".to_string(), "nosuch".to_string()],
            ServiceCatalog::builtin(),
            Arc::new(ComparisonConfig::default()),
        )
        .await;

        assert_eq!(report.services_compared, vec!["sqs"]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].service_name, "nosuch");
        assert!(report.has_errors());
        assert_eq!(report.summary.total_changes, 0);
    }

    #[tokio::test]
    async fn summary_totals_match_per_service_results() {
        let a = snapshot(
            "111111111111",
            json!({
                "sqs": {"queues": [
                    {"queue_name": "q1", "visibility_timeout": 30},
                    {"queue_name": "q2", "visibility_timeout": 30}
                ]},
                "s3": {"buckets": [{"name": "b1", "versioning": "Enabled"}]}
            }),
        );
        let b = snapshot(
            "222222222222",
            json!({
                "sqs": {"queues": [
                    {"queue_name": "q1", "visibility_timeout": 60}
                ]},
                "s3": {"buckets": [{"name": "b1", "versioning": "Enabled"}]}
            }),
        );

        let report = compare_accounts(
            &a,
            &b,
            &["sqs".to_string(), "s3".to_string()],
            ServiceCatalog::builtin(),
            Arc::new(ComparisonConfig::default()),
        )
        .await;

        // q2 removed + q1 visibility_timeout modified
        assert_eq!(report.summary.total_changes, 2);
        assert_eq!(report.summary.total_services_with_changes, 1);
        assert_eq!(report.summary.total_services_compared, 2);
        assert_eq!(report.summary.total_resources_account1, 3);
        assert_eq!(report.summary.total_resources_account2, 2);
        let counted: usize = report.summary.changes_by_severity.values().sum();
        assert_eq!(counted, 2);
        assert!(!report.has_errors());

        // Results follow the requested order, not completion order.
        assert_eq!(report.results[0].service_name, "sqs");
        assert_eq!(report.results[1].service_name, "s3");
    }
}

//! Service-level comparison
//!
//! Fans a service's resource types out onto the blocking thread pool, with
//! concurrency bounded by `max_workers`. Results come back in catalog order
//! regardless of completion order, so reports are reproducible. A resource
//! type that panics is recorded as a [`ServiceError`] and omitted; the other
//! types still complete.

use crate::catalog::ServiceDef;
use crate::compare::resource_type::compare_resource_type;
use crate::config::ComparisonConfig;
use crate::model::{ServiceComparisonResult, ServiceError};
use crate::snapshot::{AccountSnapshot, Resource};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Compare all resource types of one service across the two snapshots
pub async fn compare_service(
    service_name: &str,
    service_def: &ServiceDef,
    snapshot1: &AccountSnapshot,
    snapshot2: &AccountSnapshot,
    config: Arc<ComparisonConfig>,
) -> ServiceComparisonResult {
    let started = Instant::now();
    debug!("Comparing service {}", service_name);

    let tasks = service_def.resource_types.iter().map(|type_def| {
        let type_def = type_def.clone();
        let resources1 = records_for(snapshot1, service_name, &type_def.key);
        let resources2 = records_for(snapshot2, service_name, &type_def.key);
        let config = Arc::clone(&config);
        async move {
            let key = type_def.key.clone();
            let result = tokio::task::spawn_blocking(move || {
                compare_resource_type(&type_def, &resources1, &resources2, &config)
            })
            .await;
            (key, result)
        }
    });

    // buffered() yields in submission order, so the result vector follows
    // the catalog's configuration order for this service.
    let mut resource_comparisons = Vec::new();
    let mut errors = Vec::new();

    let outcomes: Vec<_> = stream::iter(tasks)
        .buffered(config.max_workers)
        .collect()
        .await;
    for (key, outcome) in outcomes {
        match outcome {
            Ok(comparison) => resource_comparisons.push(comparison),
            Err(e) => {
                error!("Comparison of {}/{} aborted: {}", service_name, key, e);
                errors.push(ServiceError::for_resource_type(
                    service_name,
                    &key,
                    format!("comparison aborted: {}", e),
                ));
            }
        }
    }

    ServiceComparisonResult::new(
        service_name.to_string(),
        resource_comparisons,
        errors,
        started.elapsed().as_secs_f64(),
    )
}

/// A service or resource type absent from a snapshot compares as empty.
fn records_for(snapshot: &AccountSnapshot, service_name: &str, type_key: &str) -> Vec<Resource> {
    snapshot
        .service(service_name)
        .and_then(|types| types.get(type_key))
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ServiceCatalog;
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
    async fn missing_resource_type_compares_as_empty() {
        let catalog = ServiceCatalog::builtin();
        let sqs = catalog.get_service("sqs").unwrap();
        let a = snapshot(
            "111111111111",
            json!({"sqs": {"queues": [{"queue_name": "q1"}]}}),
        );
        let b = snapshot("222222222222", json!({}));

        let result = compare_service(
            "sqs",
            sqs,
            &a,
            &b,
            Arc::new(ComparisonConfig::default()),
        )
        .await;

        assert_eq!(result.service_name, "sqs");
        assert!(!result.has_errors);
        let queues = result.resource_comparison("queues").unwrap();
        assert_eq!(queues.removed.len(), 1);
        assert_eq!(queues.account2_count, 0);
        assert_eq!(result.total_changes, 1);
    }

    #[tokio::test]
    async fn resource_types_keep_catalog_order() {
        let catalog = ServiceCatalog::builtin();
        let ec2 = catalog.get_service("ec2").unwrap();
        let empty1 = snapshot("111111111111", json!({}));
        let empty2 = snapshot("222222222222", json!({}));

        let result = compare_service(
            "ec2",
            ec2,
            &empty1,
            &empty2,
            Arc::new(ComparisonConfig::default()),
        )
        .await;

        // One entry per catalog type, in configuration order (which is not
        // alphabetical for ec2).
        let got: Vec<&str> = result
            .resource_comparisons
            .iter()
            .map(|c| c.resource_type.as_str())
            .collect();
        let expected: Vec<&str> = ec2.resource_types.iter().map(|rt| rt.key.as_str()).collect();
        assert_eq!(got, expected);
        assert_eq!(result.total_changes, 0);
    }
}

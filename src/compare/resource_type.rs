//! Per-resource-type comparison
//!
//! Matches the two accounts' collections for one resource type by resolved
//! identifier, then classifies every record as added, removed, modified, or
//! unchanged. Every failure below this level is absorbed: a record that
//! cannot be identified or diffed is logged, warned about, and skipped, and
//! never aborts the rest of the type.

use crate::catalog::ResourceTypeDef;
use crate::compare::differ::{diff_records, strip_excluded, DiffEntry, DiffOptions};
use crate::compare::{identity, severity};
use crate::config::ComparisonConfig;
use crate::model::{ChangeType, ResourceChange, ResourceTypeComparison, Severity};
use crate::snapshot::Resource;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Compare one resource type's collections from both accounts
pub fn compare_resource_type(
    type_def: &ResourceTypeDef,
    resources1: &[Resource],
    resources2: &[Resource],
    config: &ComparisonConfig,
) -> ResourceTypeComparison {
    let resource_type = type_def.key.as_str();
    let mut warnings = Vec::new();

    let (map1, order1) = build_resource_map(resource_type, resources1, type_def, "account1", &mut warnings);
    let (map2, order2) = build_resource_map(resource_type, resources2, type_def, "account2", &mut warnings);

    let excluded = config.excluded_for(&type_def.excluded_fields);
    let options = DiffOptions {
        excluded_fields: &excluded,
        significant_digits: config.significant_digits,
        list_key_fields: &config.list_key_fields,
    };

    let add_remove_severity = type_def
        .added_removed_severity
        .unwrap_or(config.added_removed_severity);

    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut modified = Vec::new();
    let mut unchanged_count = 0;

    // Added: in account2 only, in account2's input order.
    for id in &order2 {
        if map1.contains_key(id) {
            continue;
        }
        let resource = map2[id];
        added.push(whole_resource_change(
            ChangeType::Added,
            id,
            resource_type,
            resource,
            &options,
            add_remove_severity,
        ));
    }

    // Removed and modified, in account1's input order.
    for id in &order1 {
        let resource1 = map1[id];
        let Some(resource2) = map2.get(id) else {
            removed.push(whole_resource_change(
                ChangeType::Removed,
                id,
                resource_type,
                resource1,
                &options,
                add_remove_severity,
            ));
            continue;
        };

        match diff_records(&resource1.to_fields(), &resource2.to_fields(), &options) {
            Ok(entries) if entries.is_empty() => unchanged_count += 1,
            Ok(entries) => {
                for entry in entries {
                    modified.push(leaf_change(id, resource_type, entry, config));
                }
            }
            Err(e) => {
                warn!("Failed to diff {} '{}': {}", resource_type, id, e);
                warnings.push(format!("Skipped '{}': comparison failed: {}", id, e));
            }
        }
    }

    debug!(
        "Compared {}: +{} -{} ~{} ={}",
        resource_type,
        added.len(),
        removed.len(),
        modified.len(),
        unchanged_count
    );

    ResourceTypeComparison {
        resource_type: resource_type.to_string(),
        account1_count: resources1.len(),
        account2_count: resources2.len(),
        added,
        removed,
        modified,
        unchanged_count,
        warnings,
    }
}

/// Build the identifier -> record map for one account's collection.
///
/// Duplicate identifiers keep the later record (recorded as a warning);
/// unmatchable records are dropped from matching entirely. The returned
/// order vector lists each identifier once, by first appearance.
fn build_resource_map<'a>(
    resource_type: &str,
    resources: &'a [Resource],
    type_def: &ResourceTypeDef,
    account_label: &str,
    warnings: &mut Vec<String>,
) -> (BTreeMap<String, &'a Resource>, Vec<String>) {
    let mut map = BTreeMap::new();
    let mut order = Vec::new();

    for resource in resources {
        let Some(id) = identity::resolve(resource, type_def.identity.as_ref()) else {
            warn!(
                "Unmatchable {} record in {}: no usable identifier",
                resource_type, account_label
            );
            warnings.push(format!(
                "Unmatchable {} record in {}: no usable identifier",
                resource_type, account_label
            ));
            continue;
        };
        if map.insert(id.clone(), resource).is_some() {
            warn!(
                "Duplicate identifier '{}' for {} in {}; later record wins",
                id, resource_type, account_label
            );
            warnings.push(format!(
                "Duplicate identifier '{}' in {}; later record wins",
                id, account_label
            ));
        } else {
            order.push(id);
        }
    }

    (map, order)
}

fn whole_resource_change(
    change_type: ChangeType,
    resource_id: &str,
    resource_type: &str,
    resource: &Resource,
    options: &DiffOptions,
    severity: Severity,
) -> ResourceChange {
    let snapshot = Value::Object(strip_excluded(&resource.to_fields(), options.excluded_fields));
    let (old_value, new_value, description) = match change_type {
        ChangeType::Added => (None, Some(snapshot), "Resource exists only in account2"),
        ChangeType::Removed => (Some(snapshot), None, "Resource exists only in account1"),
        ChangeType::Modified => unreachable!("whole-resource changes are add/remove only"),
    };
    ResourceChange {
        change_type,
        resource_id: resource_id.to_string(),
        resource_type: resource_type.to_string(),
        field_path: None,
        old_value,
        new_value,
        severity,
        description: description.to_string(),
    }
}

fn leaf_change(
    resource_id: &str,
    resource_type: &str,
    entry: DiffEntry,
    config: &ComparisonConfig,
) -> ResourceChange {
    let severity = severity::classify(&config.severity_rules, resource_type, &entry.path);
    let description = match (&entry.old, &entry.new) {
        (Some(old), Some(new)) => format!(
            "Value changed from {} to {}",
            render_value(old),
            render_value(new)
        ),
        (Some(_), None) => format!("Field '{}' exists only in account1", entry.path),
        (None, Some(_)) => format!("Field '{}' exists only in account2", entry.path),
        (None, None) => String::new(),
    };
    ResourceChange {
        change_type: ChangeType::Modified,
        resource_id: resource_id.to_string(),
        resource_type: resource_type.to_string(),
        field_path: Some(entry.path),
        old_value: entry.old,
        new_value: entry.new,
        severity,
        description,
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}

//! Severity classification
//!
//! Maps a detected change to a severity level. Exact rules from the
//! configuration win; otherwise the field path is matched against substring
//! heuristics for known sensitive categories, normalized so `PublicAccess`,
//! `public_access`, and `public-access` all hit the same pattern.

use crate::model::Severity;
use std::collections::BTreeMap;

/// Security-impacting categories: encryption, access policy, network surface
const HIGH_PATTERNS: &[&str] = &[
    "encryption",
    "encrypted",
    "kms",
    "key",
    "policy",
    "policies",
    "publicaccess",
    "acl",
    "permission",
    "principal",
    "securitygroup",
    "network",
    "ingress",
    "egress",
    "firewall",
    "auth",
    "certificate",
];

/// Behavior-affecting lifecycle categories
const MEDIUM_PATTERNS: &[&str] = &[
    "rotation",
    "lifecycle",
    "retention",
    "backup",
    "versioning",
    "replication",
];

/// Purely informational counters, metrics, and timestamps
const LOW_PATTERNS: &[&str] = &[
    "count",
    "metric",
    "timestamp",
    "created",
    "updated",
    "lastmodified",
    "description",
    "label",
    "displayname",
];

/// Classify one leaf change by resource type and field path.
///
/// Lookup order: exact `resource_type:path` rule, exact `path` rule,
/// substring heuristics, then a Medium default.
pub fn classify(
    rules: &BTreeMap<String, Severity>,
    resource_type: &str,
    field_path: &str,
) -> Severity {
    let scoped = format!("{}:{}", resource_type, field_path);
    if let Some(severity) = rules.get(&scoped) {
        return *severity;
    }
    if let Some(severity) = rules.get(field_path) {
        return *severity;
    }

    let normalized = normalize(field_path);
    if HIGH_PATTERNS.iter().any(|p| normalized.contains(p)) {
        return Severity::High;
    }
    if MEDIUM_PATTERNS.iter().any(|p| normalized.contains(p)) {
        return Severity::Medium;
    }
    if LOW_PATTERNS.iter().any(|p| normalized.contains(p)) {
        return Severity::Low;
    }
    Severity::Medium
}

fn normalize(path: &str) -> String {
    path.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

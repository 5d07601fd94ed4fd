//! Comparison configuration
//!
//! Tunables for a comparison run: globally excluded fields, the severity
//! rule table, numeric tolerance, list matching, and worker bounds. Loaded
//! once from an optional JSON file, validated up front, then treated as
//! read-only shared state for the duration of the run.

use crate::model::Severity;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Fields every cloud response carries that never represent configuration
/// drift (request bookkeeping, fetch-time noise)
const DEFAULT_EXCLUDED_FIELDS: &[&str] = &[
    "request_id",
    "response_metadata",
    "etag",
    "created_date",
    "last_modified_date",
];

fn default_max_workers() -> usize {
    4
}

fn default_excluded_fields() -> BTreeSet<String> {
    DEFAULT_EXCLUDED_FIELDS.iter().map(|s| s.to_string()).collect()
}

fn default_added_removed_severity() -> Severity {
    Severity::High
}

/// Configuration for one comparison run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Field names or exact dotted paths skipped at any nesting depth
    #[serde(default = "default_excluded_fields")]
    pub excluded_fields: BTreeSet<String>,

    /// Exact-match severity rules. Keys are either a bare field path
    /// (`"visibility_timeout"`, `"policy.statements[0].effect"`) or a
    /// resource-type-scoped path (`"queues:visibility_timeout"`).
    #[serde(default)]
    pub severity_rules: BTreeMap<String, Severity>,

    /// Severity for whole-resource added/removed changes when the catalog
    /// does not override it per resource type
    #[serde(default = "default_added_removed_severity")]
    pub added_removed_severity: Severity,

    /// Round numeric values to this many decimal places before comparing.
    /// `None` means exact equality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub significant_digits: Option<u32>,

    /// Opt-in key-based list matching: maps an index-free field path
    /// (`"policy.statements"`) to the element field used as the match key.
    /// Lists without an entry here are compared strictly by position.
    #[serde(default)]
    pub list_key_fields: BTreeMap<String, String>,

    /// Upper bound on concurrent resource-type / service comparisons
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            excluded_fields: default_excluded_fields(),
            severity_rules: BTreeMap::new(),
            added_removed_severity: default_added_removed_severity(),
            significant_digits: None,
            list_key_fields: BTreeMap::new(),
            max_workers: default_max_workers(),
        }
    }
}

impl ComparisonConfig {
    /// Load configuration from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ComparisonConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration. Any failure here is fatal and surfaces
    /// before any comparison starts.
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            bail!("max_workers must be at least 1");
        }
        for (path, severity) in &self.severity_rules {
            if path.is_empty() {
                bail!("Severity rule with an empty field path");
            }
            // A rule on an excluded path would never fire; flag the conflict
            // instead of silently ignoring one side.
            let bare = path.rsplit(':').next().unwrap_or(path);
            if self.excluded_fields.contains(path) || self.excluded_fields.contains(bare) {
                bail!(
                    "Severity rule for '{}' ({:?}) conflicts with excluded_fields",
                    path,
                    severity
                );
            }
        }
        for (path, key_field) in &self.list_key_fields {
            if path.is_empty() || key_field.is_empty() {
                bail!("list_key_fields entries need a non-empty path and key field");
            }
        }
        Ok(())
    }

    /// Excluded set for one resource type: global exclusions plus the
    /// catalog's per-type list
    pub fn excluded_for(&self, type_excluded: &[String]) -> BTreeSet<String> {
        let mut merged = self.excluded_fields.clone();
        merged.extend(type_excluded.iter().cloned());
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ComparisonConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = ComparisonConfig {
            max_workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn severity_rule_on_excluded_field_is_rejected() {
        let mut config = ComparisonConfig::default();
        config.excluded_fields.insert("arn".to_string());
        config.severity_rules.insert("arn".to_string(), Severity::High);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("conflicts with excluded_fields"));
    }

    #[test]
    fn excluded_for_merges_type_exclusions() {
        let config = ComparisonConfig::default();
        let merged = config.excluded_for(&["queue_url".to_string()]);
        assert!(merged.contains("queue_url"));
        assert!(merged.contains("request_id"));
    }

    #[test]
    fn load_parses_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"severity_rules": {"visibility_timeout": "high"}, "max_workers": 2}"#,
        )
        .unwrap();

        let config = ComparisonConfig::load(&path).unwrap();
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.severity_rules["visibility_timeout"], Severity::High);
        // defaults still apply for fields the file omits
        assert!(config.excluded_fields.contains("request_id"));
    }
}

//! Account snapshot loading
//!
//! A snapshot file is the handoff point from the (external) fetch layer:
//! one JSON document per account holding every service's normalized resource
//! collections. The engine never talks to a cloud API; it only reads these
//! files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// One resource record: a few well-known fields plus a captured bag of
/// everything else the fetcher reported.
///
/// Records are immutable snapshots; the engine never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    /// Canonical resource name, when the service has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// Region the record was fetched from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Normalized key/value tags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Service-specific fields, in the order the fetcher wrote them
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Resource {
    /// Flatten the record into a single field map for diffing.
    ///
    /// Known fields come first, then the captured bag in input order, so
    /// diff emission order is stable per record.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(arn) = &self.arn {
            map.insert("arn".to_string(), Value::String(arn.clone()));
        }
        if let Some(region) = &self.region {
            map.insert("region".to_string(), Value::String(region.clone()));
        }
        if !self.tags.is_empty() {
            let tags: Map<String, Value> = self
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            map.insert("tags".to_string(), Value::Object(tags));
        }
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        map
    }

    /// Look up a field as a non-empty string (scalars are stringified).
    ///
    /// Used by identifier resolution; nested values are not valid key parts.
    pub fn field_str(&self, name: &str) -> Option<String> {
        match name {
            "arn" => return self.arn.clone().filter(|s| !s.is_empty()),
            "region" => return self.region.clone().filter(|s| !s.is_empty()),
            _ => {}
        }
        match self.fields.get(name)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Resource collections for one service: resource_type -> records
pub type ServiceResources = BTreeMap<String, Vec<Resource>>;

/// One account's full fetch output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// 12-digit account ID
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_alias: Option<String>,
    pub region: String,
    /// service -> resource_type -> records
    #[serde(default)]
    pub services: BTreeMap<String, ServiceResources>,
}

impl AccountSnapshot {
    /// Load and validate a snapshot file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
        let snapshot: AccountSnapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Validate header fields before any comparison starts
    pub fn validate(&self) -> Result<()> {
        if self.account_id.len() != 12 || !self.account_id.bytes().all(|b| b.is_ascii_digit()) {
            bail!(
                "Invalid account_id '{}': expected exactly 12 digits",
                self.account_id
            );
        }
        if self.region.is_empty() {
            bail!("Snapshot for account {} has an empty region", self.account_id);
        }
        Ok(())
    }

    /// Resource collections for one service (empty when the service was
    /// absent from the fetch)
    pub fn service(&self, service_name: &str) -> Option<&ServiceResources> {
        self.services.get(service_name)
    }

    /// Total number of records across all services
    pub fn resource_count(&self) -> usize {
        self.services
            .values()
            .flat_map(|types| types.values())
            .map(|records| records.len())
            .sum()
    }
}

//! Service catalog - load service and resource-type definitions from JSON
//!
//! The catalog is the enumerable, statically constructed map of everything
//! the engine knows how to compare: which services exist, which resource
//! types each service has, how each type's cross-account identity is derived,
//! and which of its fields are structurally expected to differ between
//! accounts. Definitions live in embedded JSON files so new resource types
//! can be added without code changes; the parsed catalog is passed into the
//! engine by reference, never registered through global mutable state.

use crate::model::Severity;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Embedded catalog JSON files (compiled into the binary)
const CATALOG_FILES: &[&str] = &[
    include_str!("catalog/messaging.json"),
    include_str!("catalog/storage.json"),
    include_str!("catalog/compute.json"),
    include_str!("catalog/observability.json"),
    include_str!("catalog/ai.json"),
];

/// Identity override: build the matching key from the record's own fields
/// instead of its canonical resource name
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityOverride {
    /// Fields joined (in order) to form the key
    pub key_fields: Vec<String>,
    /// Separator between key parts
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    "/".to_string()
}

/// Resource type definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceTypeDef {
    pub key: String,
    pub display_name: String,
    #[serde(default)]
    pub identity: Option<IdentityOverride>,
    /// Fields expected to differ per account for this type, merged with the
    /// globally excluded set before diffing
    #[serde(default)]
    pub excluded_fields: Vec<String>,
    /// Severity for whole-resource added/removed changes of this type
    #[serde(default)]
    pub added_removed_severity: Option<Severity>,
}

/// Service definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDef {
    pub display_name: String,
    /// Resource types in comparison order
    pub resource_types: Vec<ResourceTypeDef>,
}

impl ServiceDef {
    pub fn resource_type(&self, key: &str) -> Option<&ResourceTypeDef> {
        self.resource_types.iter().find(|rt| rt.key == key)
    }
}

/// Root structure of catalog/*.json
#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    services: BTreeMap<String, ServiceDef>,
}

/// The full set of comparable services
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: BTreeMap<String, ServiceDef>,
}

static CATALOG: OnceLock<ServiceCatalog> = OnceLock::new();

impl ServiceCatalog {
    /// Get the built-in catalog (loads from embedded JSON on first access)
    pub fn builtin() -> &'static ServiceCatalog {
        CATALOG.get_or_init(|| {
            let mut services = BTreeMap::new();
            for content in CATALOG_FILES {
                let partial: CatalogFile = serde_json::from_str(content)
                    .unwrap_or_else(|e| panic!("Failed to parse embedded catalog JSON: {}", e));
                services.extend(partial.services);
            }
            let catalog = ServiceCatalog { services };
            if let Err(e) = catalog.validate() {
                panic!("Invalid embedded catalog: {}", e);
            }
            catalog
        })
    }

    /// Build a catalog from explicit definitions (used by tests and callers
    /// that bring their own service set)
    pub fn new(services: BTreeMap<String, ServiceDef>) -> anyhow::Result<Self> {
        let catalog = ServiceCatalog { services };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for (service_name, service) in &self.services {
            if service.resource_types.is_empty() {
                anyhow::bail!("Service '{}' has no resource types", service_name);
            }
            for rt in &service.resource_types {
                if let Some(identity) = &rt.identity {
                    if identity.key_fields.is_empty() {
                        anyhow::bail!(
                            "Identity override for {}/{} names no key fields",
                            service_name,
                            rt.key
                        );
                    }
                    if identity.separator.is_empty() {
                        anyhow::bail!(
                            "Identity override for {}/{} has an empty separator",
                            service_name,
                            rt.key
                        );
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get_service(&self, name: &str) -> Option<&ServiceDef> {
        self.services.get(name)
    }

    /// All known service names, sorted
    pub fn list_services(&self) -> Vec<&str> {
        self.services.keys().map(|s| s.as_str()).collect()
    }

    /// Split a requested service list into (known, unknown)
    pub fn partition_services<'a>(&self, requested: &'a [String]) -> (Vec<&'a str>, Vec<&'a str>) {
        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        for name in requested {
            if self.services.contains_key(name.as_str()) {
                valid.push(name.as_str());
            } else {
                invalid.push(name.as_str());
            }
        }
        (valid, invalid)
    }
}

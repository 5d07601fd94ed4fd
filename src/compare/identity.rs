//! Cross-account identifier resolution
//!
//! A resource in account1 and "the same" resource in account2 never share a
//! canonical resource name: ARNs embed the account ID (and usually the
//! region), both of which differ by construction. Matching therefore keys on
//! an account-stable identity: the ARN with its account and region segments
//! stripped, a catalog-supplied compound key, or a natural name field.

use crate::catalog::IdentityOverride;
use crate::snapshot::Resource;

/// Natural unique fields tried when a record has no usable ARN, most
/// specific first
const FALLBACK_ID_FIELDS: &[&str] = &[
    "name",
    "id",
    "resource_id",
    "queue_name",
    "function_name",
    "bucket_name",
    "instance_id",
];

/// Parsed `arn:partition:service:region:account-id:resource` breakdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArnParts<'a> {
    pub partition: &'a str,
    pub service: &'a str,
    pub region: &'a str,
    pub account_id: &'a str,
    /// Trailing resource segment; may itself contain `:` or `/`
    pub resource: &'a str,
}

/// Parse an ARN string. Returns `None` for anything that does not have the
/// full six-segment shape.
pub fn parse_arn(arn: &str) -> Option<ArnParts<'_>> {
    let mut parts = arn.splitn(6, ':');
    let prefix = parts.next()?;
    if prefix != "arn" {
        return None;
    }
    let partition = parts.next()?;
    let service = parts.next()?;
    let region = parts.next()?;
    let account_id = parts.next()?;
    let resource = parts.next()?;
    if service.is_empty() || resource.is_empty() {
        return None;
    }
    Some(ArnParts {
        partition,
        service,
        region,
        account_id,
        resource,
    })
}

/// Reduce an ARN to its account-stable `service:resource` tuple by dropping
/// the region and account-id segments
pub fn stable_arn_key(arn: &str) -> Option<String> {
    let parts = parse_arn(arn)?;
    Some(format!("{}:{}", parts.service, parts.resource))
}

/// Derive the matching key for one record.
///
/// Order: catalog override (all constituent fields must be present and
/// non-empty), then ARN normalization, then natural name fields, then the
/// `Name` tag. Returns `None` when nothing yields a non-empty key; such a
/// record is unmatchable and must be excluded from classification.
pub fn resolve(resource: &Resource, identity: Option<&IdentityOverride>) -> Option<String> {
    if let Some(identity) = identity {
        if let Some(key) = resolve_override(resource, identity) {
            return Some(key);
        }
        // Fall through to the default strategy rather than producing an
        // empty or partial key.
    }

    if let Some(arn) = &resource.arn {
        if let Some(key) = stable_arn_key(arn) {
            return Some(key);
        }
    }

    for field in FALLBACK_ID_FIELDS {
        if let Some(value) = resource.field_str(field) {
            return Some(value);
        }
    }

    resource
        .tags
        .get("Name")
        .filter(|name| !name.is_empty())
        .cloned()
}

fn resolve_override(resource: &Resource, identity: &IdentityOverride) -> Option<String> {
    let mut parts = Vec::with_capacity(identity.key_fields.len());
    for field in &identity.key_fields {
        let value = resource.field_str(field)?;
        // A key field may itself hold an ARN (e.g. a referenced stream);
        // normalize it so the account and region segments cannot leak in.
        parts.push(stable_arn_key(&value).unwrap_or(value));
    }
    Some(parts.join(&identity.separator))
}

//! Cross-account comparison pipeline
//!
//! Layered bottom-up: [`identity`] resolves account-independent resource
//! identifiers, [`differ`] walks record pairs field by field, [`severity`]
//! classifies each change, [`resource_type`] matches and partitions one
//! collection pair, [`service`] runs a service's types in parallel, and
//! [`engine`] orchestrates the whole run into a report.

pub mod differ;
pub mod engine;
pub mod identity;
pub mod resource_type;
pub mod service;
pub mod severity;

pub use engine::compare_accounts;
pub use resource_type::compare_resource_type;
pub use service::compare_service;

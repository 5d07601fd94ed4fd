//! driftcmp: cross-account cloud resource comparison
//!
//! Loads two account snapshots, matches resources across accounts by
//! account-independent identifiers, diffs matched records field by field,
//! classifies every difference by severity, and aggregates everything into a
//! single report renderable as a table, JSON, or YAML.
//!
//! # Architecture
//!
//! - [`snapshot`]: on-disk snapshot format and loading
//! - [`catalog`]: built-in per-service resource type definitions
//! - [`config`]: user-tunable comparison settings
//! - [`compare`]: the comparison pipeline, identity through report
//! - [`model`]: report data structures
//! - [`output`]: report rendering

pub mod catalog;
pub mod compare;
pub mod config;
pub mod model;
pub mod output;
pub mod snapshot;

pub use catalog::ServiceCatalog;
pub use compare::compare_accounts;
pub use config::ComparisonConfig;
pub use model::ComparisonReport;
pub use snapshot::AccountSnapshot;

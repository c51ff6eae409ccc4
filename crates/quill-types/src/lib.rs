//! Common types for the Quill order marketplace.
//!
//! This crate defines the data model shared by every other crate in the
//! workspace: identifiers, the order document and its status enumeration,
//! the request actor, list queries, reference data kinds, API error shapes
//! and the configuration validation framework used by pluggable backends.

/// The identity and roles of the caller of an operation.
pub mod actor;
/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Strongly typed identifiers.
pub mod ids;
/// Order documents, statuses and intake payloads.
pub mod order;
/// Filtered, paginated order queries.
pub mod query;
/// Reference data kinds and enriched order projections.
pub mod reference;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Storage namespaces.
pub mod storage;
/// Utility functions for display formatting.
pub mod utils;
/// Configuration validation types for pluggable backends.
pub mod validation;

pub use actor::*;
pub use api::*;
pub use ids::*;
pub use order::*;
pub use query::*;
pub use reference::*;
pub use registry::*;
pub use storage::*;
pub use utils::truncate_id;
pub use validation::*;

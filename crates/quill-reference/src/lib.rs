//! Reference data enrichment for order listings.
//!
//! Orders hold foreign ids into small lookup tables (level, pages, urgency,
//! style, language). Listing endpoints return those ids resolved to display
//! names. Resolution is best effort: a missing entry, a backend error or a
//! slow lookup yields an empty name and never fails the listing.

use async_trait::async_trait;
use futures::future::join_all;
use quill_types::{
	ConfigSchema, EnrichedOrder, ImplementationRegistry, Order, ReferenceId, ReferenceKind,
};
use std::time::Duration;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors that can occur while looking up reference data.
#[derive(Debug, Error)]
pub enum ReferenceError {
	#[error("Reference backend error: {0}")]
	Backend(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for reference data backends.
#[async_trait]
pub trait ReferenceInterface: Send + Sync {
	/// Returns the display name of `id` in the `kind` table, if present.
	async fn name_of(
		&self,
		kind: ReferenceKind,
		id: &ReferenceId,
	) -> Result<Option<String>, ReferenceError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Signature every reference backend factory provides.
pub type ReferenceFactory =
	fn(&toml::Value) -> Result<Box<dyn ReferenceInterface>, ReferenceError>;

/// Registry trait for reference implementations.
pub trait ReferenceRegistry: ImplementationRegistry<Factory = ReferenceFactory> {}

/// Get all registered reference implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, ReferenceFactory)> {
	use implementations::memory;

	vec![(memory::Registry::NAME, memory::Registry::factory())]
}

/// Service that decorates orders with reference names.
pub struct ReferenceService {
	backend: Box<dyn ReferenceInterface>,
	lookup_timeout: Option<Duration>,
}

impl ReferenceService {
	pub fn new(backend: Box<dyn ReferenceInterface>) -> Self {
		Self {
			backend,
			lookup_timeout: None,
		}
	}

	/// Bounds every single lookup; a lookup that runs longer yields an
	/// empty name.
	pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
		self.lookup_timeout = Some(timeout);
		self
	}

	/// Resolves one name, mapping every failure to an empty string.
	pub async fn resolve(&self, kind: ReferenceKind, id: &ReferenceId) -> String {
		let lookup = self.backend.name_of(kind, id);
		let result = match self.lookup_timeout {
			Some(limit) => match tokio::time::timeout(limit, lookup).await {
				Ok(result) => result,
				Err(_) => {
					tracing::warn!(table = %kind, id = %id, "Reference lookup timed out");
					return String::new();
				},
			},
			None => lookup.await,
		};

		match result {
			Ok(Some(name)) => name,
			Ok(None) => {
				tracing::debug!(table = %kind, id = %id, "Reference not found");
				String::new()
			},
			Err(e) => {
				tracing::warn!(table = %kind, id = %id, error = %e, "Reference lookup failed");
				String::new()
			},
		}
	}

	async fn enrich_one(&self, order: Order) -> EnrichedOrder {
		let names = join_all(
			ReferenceKind::ALL
				.iter()
				.map(|kind| self.resolve(*kind, kind.id_of(&order))),
		)
		.await;

		let mut enriched = EnrichedOrder::bare(order);
		for (kind, name) in ReferenceKind::ALL.into_iter().zip(names) {
			enriched.set_name(kind, name);
		}
		enriched
	}

	/// Decorates every order, preserving input order.
	///
	/// Lookups for all orders and all tables run concurrently.
	pub async fn enrich(&self, orders: Vec<Order>) -> Vec<EnrichedOrder> {
		join_all(orders.into_iter().map(|order| self.enrich_one(order))).await
	}
}

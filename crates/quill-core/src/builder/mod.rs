//! Builder for assembling an [`OrderLifecycle`] from configuration.
//!
//! Each pluggable concern (storage, roles, reference data, payment) is
//! configured as a `primary` name plus one table per implementation. The
//! builder instantiates every configured implementation it has a factory
//! for, so configuration errors in unused tables still fail startup, and
//! keeps the primary.

use crate::OrderLifecycle;
use quill_config::{BackendConfig, Config};
use quill_payment::{PaymentError, PaymentInterface, PaymentService};
use quill_reference::{ReferenceError, ReferenceInterface, ReferenceService};
use quill_roles::{RoleError, RoleInterface, RoleService};
use quill_storage::{OrderStore, StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::fmt::Display;
use thiserror::Error;

/// Errors that can occur while building the lifecycle engine.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for every pluggable concern, keyed by the
/// implementation name used in configuration.
pub struct LifecycleFactories<SF, RF, REF, PF> {
	pub storage_factories: HashMap<String, SF>,
	pub role_factories: HashMap<String, RF>,
	pub reference_factories: HashMap<String, REF>,
	pub payment_factories: HashMap<String, PF>,
}

/// Builds an [`OrderLifecycle`] from a validated [`Config`].
pub struct LifecycleBuilder {
	config: Config,
}

impl LifecycleBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn build<SF, RF, REF, PF>(
		self,
		factories: LifecycleFactories<SF, RF, REF, PF>,
	) -> Result<OrderLifecycle, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		RF: Fn(&toml::Value) -> Result<Box<dyn RoleInterface>, RoleError>,
		REF: Fn(&toml::Value) -> Result<Box<dyn ReferenceInterface>, ReferenceError>,
		PF: Fn(&toml::Value) -> Result<Box<dyn PaymentInterface>, PaymentError>,
	{
		let storage = load_primary("storage", &self.config.storage, &factories.storage_factories)?;
		let roles = load_primary("roles", &self.config.roles, &factories.role_factories)?;
		let reference = load_primary(
			"reference",
			&self.config.reference,
			&factories.reference_factories,
		)?;
		let payment = load_primary("payment", &self.config.payment, &factories.payment_factories)?;

		let engine = self.config.engine;
		tracing::info!(
			marketplace = %self.config.marketplace.id,
			call_timeout_ms = engine.call_timeout_ms,
			feedback_request_limit = engine.feedback_request_limit,
			"Lifecycle engine assembled"
		);

		Ok(OrderLifecycle::new(
			OrderStore::new(StorageService::new(storage)),
			RoleService::new(roles),
			ReferenceService::new(reference).with_lookup_timeout(engine.call_timeout()),
			PaymentService::new(payment),
			engine,
		))
	}
}

/// Instantiates every configured implementation of one concern and returns
/// the primary.
fn load_primary<T, E, F>(
	component: &'static str,
	backend: &BackendConfig,
	factories: &HashMap<String, F>,
) -> Result<Box<T>, BuilderError>
where
	T: ?Sized,
	E: Display,
	F: Fn(&toml::Value) -> Result<Box<T>, E>,
{
	let mut loaded = HashMap::new();

	for (name, config) in &backend.implementations {
		let Some(factory) = factories.get(name) else {
			tracing::warn!(component, implementation = %name, "No factory registered, skipping");
			continue;
		};

		match factory(config) {
			Ok(implementation) => {
				let is_primary = backend.primary == *name;
				tracing::info!(component, implementation = %name, enabled = %is_primary, "Loaded");
				loaded.insert(name.clone(), implementation);
			},
			Err(e) => {
				tracing::error!(
					component,
					implementation = %name,
					error = %e,
					"Failed to create implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create {} implementation '{}': {}",
					component, name, e
				)));
			},
		}
	}

	loaded.remove(&backend.primary).ok_or_else(|| {
		BuilderError::MissingComponent(format!(
			"primary {} implementation '{}' is not available",
			component, backend.primary
		))
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use quill_types::{Actor, Role};

	const CONFIG: &str = r#"
[marketplace]
id = "builder-test"

[storage]
primary = "memory"
[storage.implementations.memory]

[roles]
primary = "memory"
[roles.implementations.memory]
assignments = [{ user_id = "w-1", role = "writer" }]

[reference]
primary = "memory"
[reference.implementations.memory]

[payment]
primary = "mock"
[payment.implementations.mock]
"#;

	fn factories() -> LifecycleFactories<
		quill_storage::StorageFactory,
		quill_roles::RoleFactory,
		quill_reference::ReferenceFactory,
		quill_payment::PaymentFactory,
	> {
		LifecycleFactories {
			storage_factories: quill_storage::get_all_implementations()
				.into_iter()
				.map(|(name, f)| (name.to_string(), f))
				.collect(),
			role_factories: quill_roles::get_all_implementations()
				.into_iter()
				.map(|(name, f)| (name.to_string(), f))
				.collect(),
			reference_factories: quill_reference::get_all_implementations()
				.into_iter()
				.map(|(name, f)| (name.to_string(), f))
				.collect(),
			payment_factories: quill_payment::get_all_implementations()
				.into_iter()
				.map(|(name, f)| (name.to_string(), f))
				.collect(),
		}
	}

	#[tokio::test]
	async fn test_builds_from_config() {
		let config: Config = CONFIG.parse().unwrap();
		let engine = LifecycleBuilder::new(config).build(factories()).unwrap();
		assert_eq!(engine.settings().feedback_request_limit, 4);

		// Seeded writer role is wired through to the engine.
		let admin = Actor::new("admin-1", [Role::Admin]);
		let result = engine
			.assign_writer(&admin, &"missing".into(), &"w-1".into())
			.await;
		assert!(matches!(
			result,
			Err(crate::LifecycleError::NotFoundOrInvalidState)
		));
	}

	#[test]
	fn test_primary_without_factory_is_missing_component() {
		let config: Config = CONFIG
			.replace("primary = \"mock\"", "primary = \"stripe\"")
			.replace("[payment.implementations.mock]", "[payment.implementations.stripe]")
			.parse()
			.unwrap();
		let err = LifecycleBuilder::new(config).build(factories()).err().unwrap();
		assert!(matches!(err, BuilderError::MissingComponent(_)));
	}

	#[test]
	fn test_invalid_implementation_config_fails() {
		let config: Config = CONFIG
			.replace(
				"[payment.implementations.mock]",
				"[payment.implementations.mock]\napprove = \"sometimes\"",
			)
			.parse()
			.unwrap();
		let err = LifecycleBuilder::new(config).build(factories()).err().unwrap();
		assert!(err.to_string().contains("payment"));
	}
}

//! Role resolution for the Quill marketplace.
//!
//! Answers whether a user currently holds a role by consulting the
//! user to role association set. The lifecycle engine asks this at the
//! moment a writer is assigned, never from a cached copy.

use async_trait::async_trait;
use quill_types::{ConfigSchema, ImplementationRegistry, Role, UserId};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors that can occur while resolving roles.
#[derive(Debug, Error)]
pub enum RoleError {
	/// The association set could not be read.
	#[error("Role backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for role association backends.
#[async_trait]
pub trait RoleInterface: Send + Sync {
	/// Returns every role currently associated with `user_id`.
	///
	/// An unknown user has no roles; that is not an error.
	async fn roles_for(&self, user_id: &UserId) -> Result<Vec<Role>, RoleError>;

	/// Associates `role` with `user_id`. Granting a held role is a no-op.
	async fn grant(&self, user_id: &UserId, role: Role) -> Result<(), RoleError>;

	/// Removes the association. Revoking a role not held is a no-op.
	async fn revoke(&self, user_id: &UserId, role: Role) -> Result<(), RoleError>;

	/// Returns every user currently holding `role`, in no particular order.
	async fn users_with(&self, role: Role) -> Result<Vec<UserId>, RoleError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Signature every role backend factory provides.
pub type RoleFactory = fn(&toml::Value) -> Result<Box<dyn RoleInterface>, RoleError>;

/// Registry trait for role implementations.
pub trait RoleRegistry: ImplementationRegistry<Factory = RoleFactory> {}

/// Get all registered role implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, RoleFactory)> {
	use implementations::memory;

	vec![(memory::Registry::NAME, memory::Registry::factory())]
}

/// Service wrapping the configured role backend.
pub struct RoleService {
	backend: Box<dyn RoleInterface>,
}

impl RoleService {
	pub fn new(backend: Box<dyn RoleInterface>) -> Self {
		Self { backend }
	}

	/// Checks whether `user_id` holds `role`.
	///
	/// `Ok(false)` means the role is absent. `Err` means the check itself
	/// could not be performed.
	pub async fn has_role(&self, user_id: &UserId, role: Role) -> Result<bool, RoleError> {
		let roles = self.backend.roles_for(user_id).await?;
		Ok(roles.contains(&role))
	}

	pub async fn grant(&self, user_id: &UserId, role: Role) -> Result<(), RoleError> {
		tracing::info!(user_id = %user_id, role = %role, "Granting role");
		self.backend.grant(user_id, role).await
	}

	pub async fn revoke(&self, user_id: &UserId, role: Role) -> Result<(), RoleError> {
		tracing::info!(user_id = %user_id, role = %role, "Revoking role");
		self.backend.revoke(user_id, role).await
	}

	/// Lists the holders of `role` sorted by id, so pages are stable.
	pub async fn users_with(&self, role: Role) -> Result<Vec<UserId>, RoleError> {
		let mut users = self.backend.users_with(role).await?;
		users.sort();
		users.dedup();
		Ok(users)
	}
}

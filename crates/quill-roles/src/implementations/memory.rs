//! In-memory role association set.
//!
//! Seeded from configuration:
//!
//! ```toml
//! [roles.implementations.memory]
//! assignments = [
//!     { user_id = "writer-1", role = "writer" },
//!     { user_id = "admin-1", role = "admin" },
//! ]
//! ```

use crate::{RoleError, RoleFactory, RoleInterface, RoleRegistry};
use async_trait::async_trait;
use quill_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Role, Schema, UserId, ValidationError,
};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

/// Role associations held in memory.
#[derive(Default)]
pub struct MemoryRoles {
	assignments: RwLock<HashMap<UserId, BTreeSet<Role>>>,
}

impl MemoryRoles {
	pub fn new(assignments: impl IntoIterator<Item = (UserId, Role)>) -> Self {
		let mut map: HashMap<UserId, BTreeSet<Role>> = HashMap::new();
		for (user_id, role) in assignments {
			map.entry(user_id).or_default().insert(role);
		}
		Self {
			assignments: RwLock::new(map),
		}
	}
}

#[async_trait]
impl RoleInterface for MemoryRoles {
	async fn roles_for(&self, user_id: &UserId) -> Result<Vec<Role>, RoleError> {
		let assignments = self.assignments.read().await;
		Ok(assignments
			.get(user_id)
			.map(|roles| roles.iter().copied().collect())
			.unwrap_or_default())
	}

	async fn grant(&self, user_id: &UserId, role: Role) -> Result<(), RoleError> {
		let mut assignments = self.assignments.write().await;
		assignments.entry(user_id.clone()).or_default().insert(role);
		Ok(())
	}

	async fn revoke(&self, user_id: &UserId, role: Role) -> Result<(), RoleError> {
		let mut assignments = self.assignments.write().await;
		if let Some(roles) = assignments.get_mut(user_id) {
			roles.remove(&role);
			if roles.is_empty() {
				assignments.remove(user_id);
			}
		}
		Ok(())
	}

	async fn users_with(&self, role: Role) -> Result<Vec<UserId>, RoleError> {
		let assignments = self.assignments.read().await;
		Ok(assignments
			.iter()
			.filter(|(_, roles)| roles.contains(&role))
			.map(|(user_id, _)| user_id.clone())
			.collect())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryRolesSchema)
	}
}

/// Configuration schema for MemoryRoles.
pub struct MemoryRolesSchema;

impl ConfigSchema for MemoryRolesSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let assignment = Schema::new(
			vec![
				Field::new("user_id", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(id) if id.trim().is_empty() => Err("user_id cannot be empty".into()),
						_ => Ok(()),
					}
				}),
				Field::new("role", FieldType::String).with_validator(|value| {
					value
						.as_str()
						.unwrap_or_default()
						.parse::<Role>()
						.map(|_| ())
				}),
			],
			vec![],
		);

		Schema::new(
			vec![],
			vec![Field::new(
				"assignments",
				FieldType::Array(Box::new(FieldType::Table(assignment))),
			)],
		)
		.validate(config)
	}
}

fn parse_assignments(config: &toml::Value) -> Result<Vec<(UserId, Role)>, RoleError> {
	let Some(entries) = config.get("assignments").and_then(|v| v.as_array()) else {
		return Ok(Vec::new());
	};

	entries
		.iter()
		.map(|entry| {
			let user_id = entry
				.get("user_id")
				.and_then(|v| v.as_str())
				.ok_or_else(|| RoleError::Configuration("assignment without user_id".into()))?;
			let role = entry
				.get("role")
				.and_then(|v| v.as_str())
				.ok_or_else(|| RoleError::Configuration("assignment without role".into()))?
				.parse::<Role>()
				.map_err(RoleError::Configuration)?;
			Ok((UserId::from(user_id), role))
		})
		.collect()
}

/// Factory function to create the memory role backend from configuration.
///
/// Configuration parameters:
/// - `assignments`: array of `{ user_id, role }` tables (default: empty)
pub fn create_roles(config: &toml::Value) -> Result<Box<dyn RoleInterface>, RoleError> {
	MemoryRolesSchema
		.validate(config)
		.map_err(|e| RoleError::Configuration(e.to_string()))?;

	let assignments = parse_assignments(config)?;
	tracing::debug!(count = assignments.len(), "Seeding role assignments");
	Ok(Box::new(MemoryRoles::new(assignments)))
}

/// Registry for the memory role implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = RoleFactory;

	fn factory() -> Self::Factory {
		create_roles
	}
}

impl RoleRegistry for Registry {}

//! Reference tables loaded from configuration.
//!
//! Each table is a map from reference id to display name:
//!
//! ```toml
//! [reference.implementations.memory.levels]
//! high_school = "High School"
//! college = "College"
//! ```

use crate::{ReferenceError, ReferenceFactory, ReferenceInterface, ReferenceRegistry};
use async_trait::async_trait;
use quill_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, ReferenceId, ReferenceKind, Schema,
	ValidationError,
};
use std::collections::HashMap;

/// Read-only reference tables.
pub struct MemoryReference {
	tables: HashMap<ReferenceKind, HashMap<String, String>>,
}

impl MemoryReference {
	pub fn new(tables: HashMap<ReferenceKind, HashMap<String, String>>) -> Self {
		Self { tables }
	}
}

#[async_trait]
impl ReferenceInterface for MemoryReference {
	async fn name_of(
		&self,
		kind: ReferenceKind,
		id: &ReferenceId,
	) -> Result<Option<String>, ReferenceError> {
		Ok(self
			.tables
			.get(&kind)
			.and_then(|table| table.get(id.as_str()))
			.cloned())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryReferenceSchema)
	}
}

/// Configuration schema for MemoryReference.
pub struct MemoryReferenceSchema;

impl ConfigSchema for MemoryReferenceSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let tables = ReferenceKind::ALL
			.iter()
			.map(|kind| Field::new(kind.as_str(), FieldType::StringMap))
			.collect();
		Schema::new(vec![], tables).validate(config)
	}
}

/// Factory function to create memory reference tables from configuration.
///
/// Configuration parameters (all optional string maps):
/// - `levels`, `pages`, `urgency`, `styles`, `languages`
pub fn create_reference(
	config: &toml::Value,
) -> Result<Box<dyn ReferenceInterface>, ReferenceError> {
	MemoryReferenceSchema
		.validate(config)
		.map_err(|e| ReferenceError::Configuration(e.to_string()))?;

	let mut tables = HashMap::new();
	for kind in ReferenceKind::ALL {
		let Some(table) = config.get(kind.as_str()).and_then(|v| v.as_table()) else {
			continue;
		};
		let entries: HashMap<String, String> = table
			.iter()
			.filter_map(|(id, name)| name.as_str().map(|name| (id.clone(), name.to_string())))
			.collect();
		tracing::debug!(table = %kind, entries = entries.len(), "Loaded reference table");
		tables.insert(kind, entries);
	}

	Ok(Box::new(MemoryReference::new(tables)))
}

/// Registry for the memory reference implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = ReferenceFactory;

	fn factory() -> Self::Factory {
		create_reference
	}
}

impl ReferenceRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_tables_loaded_from_config() {
		let config: toml::Value = toml::from_str(
			r#"
[levels]
college = "College"

[languages]
en_us = "English (US)"
"#,
		)
		.unwrap();

		let reference = create_reference(&config).unwrap();
		assert_eq!(
			reference
				.name_of(ReferenceKind::Level, &ReferenceId::from("college"))
				.await
				.unwrap(),
			Some("College".to_string())
		);
		assert_eq!(
			reference
				.name_of(ReferenceKind::Language, &ReferenceId::from("en_us"))
				.await
				.unwrap(),
			Some("English (US)".to_string())
		);
		assert_eq!(
			reference
				.name_of(ReferenceKind::Style, &ReferenceId::from("apa"))
				.await
				.unwrap(),
			None
		);
	}

	#[test]
	fn test_non_string_names_rejected() {
		let config: toml::Value = toml::from_str("[styles]\napa = 7\n").unwrap();
		assert!(create_reference(&config).is_err());
	}
}

//! Configuration validation for pluggable backends.
//!
//! Every backend implementation receives its own raw TOML table from the
//! main configuration file. Before a factory builds the backend it checks
//! that table against a [`Schema`] so misconfiguration fails at startup with
//! a field-level message instead of surfacing later as odd runtime behavior.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	/// An array whose elements all have the given type.
	Array(Box<FieldType>),
	/// A nested table validated by its own schema.
	Table(Schema),
	/// A table of arbitrary keys mapping to string values.
	StringMap,
}

/// Custom check run after the type check passes.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field in a [`Schema`].
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Attaches a custom validator that runs after the type check.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, path: &str, value: &toml::Value) -> Result<(), ValidationError> {
		check_type(path, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: path.to_string(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Required and optional fields of a TOML table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates `config`, which must be a table.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		self.validate_at("", config)
	}

	fn validate_at(&self, prefix: &str, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config.as_table().ok_or_else(|| ValidationError::TypeMismatch {
			field: if prefix.is_empty() { "root".into() } else { prefix.into() },
			expected: "table".into(),
			actual: config.type_str().into(),
		})?;

		for field in &self.required {
			let path = join_path(prefix, &field.name);
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(path.clone()))?;
			field.check(&path, value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(&join_path(prefix, &field.name), value)?;
			}
		}

		Ok(())
	}
}

fn join_path(prefix: &str, name: &str) -> String {
	if prefix.is_empty() {
		name.to_string()
	} else {
		format!("{}.{}", prefix, name)
	}
}

fn mismatch(path: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: path.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn check_type(path: &str, value: &toml::Value, expected: &FieldType) -> Result<(), ValidationError> {
	match expected {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch(path, "string", value));
			}
		},
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch(path, "boolean", value));
			}
		},
		FieldType::Integer { min, max } => {
			let n = value
				.as_integer()
				.ok_or_else(|| mismatch(path, "integer", value))?;
			if let Some(min) = min.filter(|min| n < *min) {
				return Err(ValidationError::InvalidValue {
					field: path.to_string(),
					message: format!("Value {} is less than minimum {}", n, min),
				});
			}
			if let Some(max) = max.filter(|max| n > *max) {
				return Err(ValidationError::InvalidValue {
					field: path.to_string(),
					message: format!("Value {} is greater than maximum {}", n, max),
				});
			}
		},
		FieldType::Array(inner) => {
			let items = value
				.as_array()
				.ok_or_else(|| mismatch(path, "array", value))?;
			for (i, item) in items.iter().enumerate() {
				check_type(&format!("{}[{}]", path, i), item, inner)?;
			}
		},
		FieldType::Table(schema) => schema.validate_at(path, value)?,
		FieldType::StringMap => {
			let table = value
				.as_table()
				.ok_or_else(|| mismatch(path, "table", value))?;
			for (key, entry) in table {
				if !entry.is_str() {
					return Err(mismatch(&join_path(path, key), "string", entry));
				}
			}
		},
	}

	Ok(())
}

/// A configuration schema that can validate a backend's TOML table.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(s: &str) -> toml::Value {
		toml::from_str(s).unwrap()
	}

	#[test]
	fn test_required_field_missing() {
		let schema = Schema::new(vec![Field::new("storage_path", FieldType::String)], vec![]);
		let err = schema.validate(&parse("other = 1")).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "storage_path"));
	}

	#[test]
	fn test_integer_bounds() {
		let schema = Schema::new(
			vec![],
			vec![Field::new(
				"limit",
				FieldType::Integer {
					min: Some(1),
					max: Some(10),
				},
			)],
		);
		assert!(schema.validate(&parse("limit = 5")).is_ok());
		assert!(schema.validate(&parse("limit = 0")).is_err());
		assert!(schema.validate(&parse("limit = 11")).is_err());
		assert!(schema.validate(&parse("limit = \"5\"")).is_err());
	}

	#[test]
	fn test_nested_array_of_tables_reports_path() {
		let entry = Schema::new(
			vec![
				Field::new("user_id", FieldType::String),
				Field::new("role", FieldType::String),
			],
			vec![],
		);
		let schema = Schema::new(
			vec![],
			vec![Field::new(
				"assignments",
				FieldType::Array(Box::new(FieldType::Table(entry))),
			)],
		);

		let ok = parse(
			r#"
[[assignments]]
user_id = "w-1"
role = "writer"
"#,
		);
		assert!(schema.validate(&ok).is_ok());

		let bad = parse(
			r#"
[[assignments]]
user_id = "w-1"
"#,
		);
		let err = schema.validate(&bad).unwrap_err();
		assert_eq!(err.to_string(), "Missing required field: assignments[0].role");
	}

	#[test]
	fn test_string_map_and_custom_validator() {
		let schema = Schema::new(
			vec![Field::new("levels", FieldType::StringMap)],
			vec![Field::new("mode", FieldType::String).with_validator(|v| {
				match v.as_str() {
					Some("fast") | Some("safe") => Ok(()),
					_ => Err("must be 'fast' or 'safe'".into()),
				}
			})],
		);
		assert!(schema
			.validate(&parse("levels = { a = \"College\" }\nmode = \"safe\""))
			.is_ok());
		assert!(schema.validate(&parse("levels = { a = 1 }")).is_err());
		assert!(schema
			.validate(&parse("levels = {}\nmode = \"slow\""))
			.is_err());
	}
}

//! Multi-file configuration loading.
//!
//! A configuration file may list other files under `include`. Included
//! files may include further files. Sections are merged at the top level
//! only, and a section defined in two files is an error rather than being
//! silently overridden.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;

type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ConfigError>> + Send + 'a>>;

/// Loads a configuration file together with everything it includes.
pub struct ConfigLoader {
	/// Directory relative includes are resolved against.
	base_path: PathBuf,
	/// Files currently being loaded, outermost first.
	include_stack: Vec<PathBuf>,
	/// Which file defined each top-level section.
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			include_stack: Vec::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads, merges and validates the configuration rooted at `config_path`.
	pub async fn load_config(&mut self, config_path: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let path = self.resolve_path(config_path.as_ref())?;
		let mut merged = toml::map::Map::new();
		self.load_into(&path, &mut merged).await?;

		tracing::debug!(sections = merged.len(), "Loaded configuration");

		let combined = toml::to_string(&toml::Value::Table(merged)).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize combined config: {}", e))
		})?;
		combined.parse()
	}

	fn load_into<'a>(
		&'a mut self,
		path: &'a Path,
		merged: &'a mut toml::map::Map<String, toml::Value>,
	) -> LoadFuture<'a> {
		Box::pin(async move {
			let canonical = fs::canonicalize(path).await.map_err(|e| {
				ConfigError::Io(std::io::Error::new(
					e.kind(),
					format!("Cannot resolve path {}: {}", path.display(), e),
				))
			})?;

			if self.include_stack.contains(&canonical) {
				return Err(ConfigError::Validation(format!(
					"Circular include detected: {} was already loaded",
					canonical.display()
				)));
			}

			let content = fs::read_to_string(&canonical).await?;
			let resolved = resolve_env_vars(&content)?;
			let mut document: toml::Value = toml::from_str(&resolved)?;
			let table = document.as_table_mut().ok_or_else(|| {
				ConfigError::Parse(format!("{} is not a TOML table", canonical.display()))
			})?;

			let includes = match table.remove("include") {
				Some(value) => Self::parse_includes(&value)?,
				None => Vec::new(),
			};

			for (section, value) in std::mem::take(table) {
				if let Some(existing) = self.section_sources.get(&section) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' found in {} and {}. \
						Each top-level section must be unique across all configuration files.",
						section,
						existing.display(),
						canonical.display()
					)));
				}
				self.section_sources
					.insert(section.clone(), canonical.clone());
				merged.insert(section, value);
			}

			self.include_stack.push(canonical);
			for include in includes {
				let include_path = self.resolve_path(&include)?;
				self.load_into(&include_path, merged).await?;
			}
			self.include_stack.pop();

			Ok(())
		})
	}

	fn parse_includes(value: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
		match value {
			toml::Value::String(path) => Ok(vec![PathBuf::from(path)]),
			toml::Value::Array(items) => items
				.iter()
				.map(|item| {
					item.as_str().map(PathBuf::from).ok_or_else(|| {
						ConfigError::Validation("Include array must contain only strings".into())
					})
				})
				.collect(),
			_ => Err(ConfigError::Validation(
				"Include must be a string or array of strings".into(),
			)),
		}
	}

	fn resolve_path(&self, path: &Path) -> Result<PathBuf, ConfigError> {
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}

		Ok(resolved)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tests::MINIMAL;
	use std::fs;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_single_file_config() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("config.toml"), MINIMAL).unwrap();

		let config = Config::from_file(dir.path().join("config.toml")).await.unwrap();
		assert_eq!(config.marketplace.id, "quill-test");
		assert_eq!(config.payment.primary, "mock");
	}

	#[tokio::test]
	async fn test_nested_includes_are_merged() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("main.toml"),
			r#"
include = ["backends.toml"]
[marketplace]
id = "split"
"#,
		)
		.unwrap();
		fs::write(
			dir.path().join("backends.toml"),
			r#"
include = "payment.toml"
[storage]
primary = "file"
[storage.implementations.file]
storage_path = "./data"

[roles]
primary = "memory"
[roles.implementations.memory]

[reference]
primary = "memory"
[reference.implementations.memory]
"#,
		)
		.unwrap();
		fs::write(
			dir.path().join("payment.toml"),
			r#"
[payment]
primary = "mock"
[payment.implementations.mock]
approve = false
"#,
		)
		.unwrap();

		let mut loader = ConfigLoader::new(dir.path());
		let config = loader.load_config("main.toml").await.unwrap();
		assert_eq!(config.marketplace.id, "split");
		assert_eq!(config.storage.primary, "file");
		assert_eq!(
			config.payment.primary_config().and_then(|c| c.get("approve")),
			Some(&toml::Value::Boolean(false))
		);
	}

	#[tokio::test]
	async fn test_duplicate_section_error() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("main.toml"),
			"include = [\"dup.toml\"]\n[marketplace]\nid = \"a\"\n",
		)
		.unwrap();
		fs::write(dir.path().join("dup.toml"), "[marketplace]\nid = \"b\"\n").unwrap();

		let mut loader = ConfigLoader::new(dir.path());
		let err = loader.load_config("main.toml").await.unwrap_err();
		assert!(err.to_string().contains("Duplicate section 'marketplace'"));
	}

	#[tokio::test]
	async fn test_include_cycle_detected() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("a.toml"), "include = \"b.toml\"\n[x]\n").unwrap();
		fs::write(dir.path().join("b.toml"), "include = \"a.toml\"\n[y]\n").unwrap();

		let mut loader = ConfigLoader::new(dir.path());
		let err = loader.load_config("a.toml").await.unwrap_err();
		assert!(err.to_string().contains("Circular include"));
	}

	#[tokio::test]
	async fn test_missing_include_reported() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("main.toml"), "include = [\"nope.toml\"]\n").unwrap();

		let mut loader = ConfigLoader::new(dir.path());
		let err = loader.load_config("main.toml").await.unwrap_err();
		assert!(err.to_string().contains("not found"));
	}
}

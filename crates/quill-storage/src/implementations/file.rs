//! File-based storage backend.
//!
//! Each key is stored as one JSON file under `storage_path`. Writes go to a
//! temporary file that is then renamed over the target, so readers never
//! observe a half-written document. All mutating calls are serialized by a
//! process-wide lock, which is what makes [`compare_and_swap`] atomic.
//!
//! [`compare_and_swap`]: crate::StorageInterface::compare_and_swap

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use quill_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

const DEFAULT_STORAGE_PATH: &str = "./data/storage";
const EXTENSION: &str = "json";

/// File-based storage implementation.
pub struct FileStorage {
	base_path: PathBuf,
	write_lock: Mutex<()>,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			write_lock: Mutex::new(()),
		}
	}

	/// Converts a storage key into a filesystem-safe file name.
	///
	/// Percent-encoding is injective, so distinct keys never share a file,
	/// and it preserves prefixes, so `scan_prefix` can compare encoded names.
	fn file_name(key: &str) -> String {
		urlencoding::encode(key).into_owned()
	}

	fn file_path(&self, key: &str) -> PathBuf {
		self.base_path
			.join(format!("{}.{}", Self::file_name(key), EXTENSION))
	}

	async fn read(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
		match fs::read(path).await {
			Ok(data) => Ok(Some(data)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	/// Writes atomically via a temp file and rename. Caller holds `write_lock`.
	async fn write(&self, path: &Path, value: Vec<u8>) -> Result<(), StorageError> {
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		Self::read(&self.file_path(key))
			.await?
			.ok_or(StorageError::NotFound)
	}

	async fn compare_and_swap(
		&self,
		key: &str,
		expected: Option<&[u8]>,
		value: Vec<u8>,
	) -> Result<bool, StorageError> {
		let _guard = self.write_lock.lock().await;
		let path = self.file_path(key);

		let current = Self::read(&path).await?;
		if current.as_deref() != expected {
			return Ok(false);
		}

		self.write(&path, value).await?;
		Ok(true)
	}

	async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let file_prefix = Self::file_name(prefix);
		let mut values = Vec::new();

		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
				continue;
			}
			let matches = path
				.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(|name| name.starts_with(&file_prefix));
			if !matches {
				continue;
			}

			// A file can disappear between listing and reading.
			match Self::read(&path).await? {
				Some(data) => values.push(data),
				None => tracing::debug!("Skipping vanished file {:?}", path),
			}
		}

		Ok(values)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("storage_path", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(path) if path.trim().is_empty() => {
						Err("storage_path cannot be empty".to_string())
					},
					_ => Ok(()),
				}
			})],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for order files (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn storage(dir: &TempDir) -> FileStorage {
		FileStorage::new(dir.path().to_path_buf())
	}

	#[tokio::test]
	async fn test_write_get_and_persist_across_instances() {
		let dir = TempDir::new().unwrap();
		assert!(storage(&dir)
			.compare_and_swap("orders:abc", None, b"{\"a\":1}".to_vec())
			.await
			.unwrap());

		let reopened = storage(&dir);
		assert_eq!(
			reopened.get_bytes("orders:abc").await.unwrap(),
			b"{\"a\":1}".to_vec()
		);
		assert!(matches!(
			reopened.get_bytes("orders:missing").await,
			Err(StorageError::NotFound)
		));
		assert!(dir.path().join("orders%3Aabc.json").exists());
	}

	#[tokio::test]
	async fn test_keys_differing_only_in_separators_use_distinct_files() {
		let dir = TempDir::new().unwrap();
		let storage = storage(&dir);

		for (key, value) in [
			("orders:a:b", "colon"),
			("orders:a_b", "underscore"),
			("orders:a/b", "slash"),
			("orders:a%3Ab", "literal"),
		] {
			assert!(storage
				.compare_and_swap(key, None, value.as_bytes().to_vec())
				.await
				.unwrap());
		}

		assert_eq!(storage.get_bytes("orders:a:b").await.unwrap(), b"colon".to_vec());
		assert_eq!(
			storage.get_bytes("orders:a_b").await.unwrap(),
			b"underscore".to_vec()
		);
		assert_eq!(storage.get_bytes("orders:a/b").await.unwrap(), b"slash".to_vec());
		assert_eq!(
			storage.get_bytes("orders:a%3Ab").await.unwrap(),
			b"literal".to_vec()
		);
		assert_eq!(storage.scan_prefix("orders:").await.unwrap().len(), 4);
	}

	#[tokio::test]
	async fn test_compare_and_swap_checks_current_contents() {
		let dir = TempDir::new().unwrap();
		let storage = storage(&dir);

		assert!(storage
			.compare_and_swap("orders:1", None, b"v1".to_vec())
			.await
			.unwrap());
		assert!(!storage
			.compare_and_swap("orders:1", Some(b"v0"), b"v2".to_vec())
			.await
			.unwrap());
		assert!(storage
			.compare_and_swap("orders:1", Some(b"v1"), b"v2".to_vec())
			.await
			.unwrap());
		assert_eq!(storage.get_bytes("orders:1").await.unwrap(), b"v2".to_vec());
	}

	#[tokio::test]
	async fn test_scan_prefix_on_missing_directory_is_empty() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().join("not-created-yet"));
		assert!(storage.scan_prefix("orders:").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_scan_prefix_filters_namespace() {
		let dir = TempDir::new().unwrap();
		let storage = storage(&dir);
		storage
			.compare_and_swap("orders:1", None, b"a".to_vec())
			.await
			.unwrap();
		storage
			.compare_and_swap("sessions:1", None, b"b".to_vec())
			.await
			.unwrap();

		assert_eq!(
			storage.scan_prefix("orders:").await.unwrap(),
			vec![b"a".to_vec()]
		);
	}

	#[test]
	fn test_schema_rejects_empty_path() {
		let config: toml::Value = toml::from_str("storage_path = \"  \"").unwrap();
		assert!(FileStorageSchema.validate(&config).is_err());
		let config: toml::Value = toml::from_str("storage_path = \"/tmp/x\"").unwrap();
		assert!(FileStorageSchema.validate(&config).is_ok());
	}
}

//! Storage module for the Quill marketplace.
//!
//! This module provides a byte-level backend abstraction with single-key
//! compare-and-swap, a typed [`StorageService`] on top of it, and the
//! [`OrderStore`] the lifecycle engine uses to read orders and apply
//! filter-guarded conditional updates.

use async_trait::async_trait;
use quill_types::{ConfigSchema, ImplementationRegistry, StorageKey};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

mod order_store;

pub use order_store::{ClaimFilter, OrderStore, UpdateFilter, UpdateResult};

/// Upper bound on compare-and-swap retries when writers keep colliding on
/// the same key.
const MAX_CAS_ATTEMPTS: usize = 32;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when inserting a key that is already present.
	#[error("Already exists: {0}")]
	AlreadyExists(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// Backends store opaque byte values under string keys. The only multi-step
/// guarantee they must provide is [`compare_and_swap`](Self::compare_and_swap),
/// which has to be atomic with respect to every other write on the same key.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Replaces the value under `key` only if it currently equals `expected`.
	///
	/// `expected = None` means the key must be absent. Returns whether the
	/// swap happened.
	async fn compare_and_swap(
		&self,
		key: &str,
		expected: Option<&[u8]>,
		value: Vec<u8>,
	) -> Result<bool, StorageError>;

	/// Returns every value whose key starts with `prefix`.
	async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Signature every storage factory provides.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level storage service that provides typed operations.
///
/// Values are serialized to JSON. Keys come from [`StorageKey::key`], so
/// every item of a namespace shares [`StorageKey::prefix`].
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn encode<T: Serialize>(data: &T) -> Result<Vec<u8>, StorageError> {
		serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
		serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Stores a value only if nothing is stored under the key yet.
	pub async fn insert<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = namespace.key(id);
		let bytes = Self::encode(data)?;
		if self.backend.compare_and_swap(&key, None, bytes).await? {
			Ok(())
		} else {
			Err(StorageError::AlreadyExists(key))
		}
	}

	/// Retrieves and deserializes a value.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&namespace.key(id)).await?;
		Self::decode(&bytes)
	}

	/// Returns every value in a namespace.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
	) -> Result<Vec<T>, StorageError> {
		self.backend
			.scan_prefix(&namespace.prefix())
			.await?
			.iter()
			.map(|bytes| Self::decode(bytes))
			.collect()
	}

	/// Atomically applies `mutate` to a stored value if `predicate` holds.
	///
	/// The predicate is evaluated against the current stored value and the
	/// write is a compare-and-swap against exactly the bytes that were
	/// evaluated, so a concurrent writer can never slip in between the check
	/// and the effect. When the swap loses a race the value is re-read and
	/// the predicate evaluated again. Returns `None` when the key is absent
	/// or the predicate does not hold.
	pub async fn update_if<T, P, M>(
		&self,
		namespace: StorageKey,
		id: &str,
		predicate: P,
		mutate: M,
	) -> Result<Option<T>, StorageError>
	where
		T: Serialize + DeserializeOwned,
		P: Fn(&T) -> bool,
		M: Fn(&mut T),
	{
		let key = namespace.key(id);

		for _ in 0..MAX_CAS_ATTEMPTS {
			let current = match self.backend.get_bytes(&key).await {
				Ok(bytes) => bytes,
				Err(StorageError::NotFound) => return Ok(None),
				Err(e) => return Err(e),
			};

			let mut value: T = Self::decode(&current)?;
			if !predicate(&value) {
				return Ok(None);
			}

			mutate(&mut value);
			let next = Self::encode(&value)?;

			if self
				.backend
				.compare_and_swap(&key, Some(&current), next)
				.await?
			{
				return Ok(Some(value));
			}

			tracing::debug!(key = %key, "Conditional update lost a race, re-evaluating");
		}

		Err(StorageError::Backend(format!(
			"Too much write contention on {}",
			key
		)))
	}
}

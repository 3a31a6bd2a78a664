//! Local persistence for the PackNow client.
//!
//! The client keeps very little state on disk: the authenticated session and
//! a cached profile. Backends store raw bytes under string keys; the typed
//! `StorageService` on top serializes values as JSON under
//! `"<namespace>:<id>"` keys.

use async_trait::async_trait;
use packnow_types::{ConfigSchema, ImplementationRegistry, StorageKey};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Not found")]
	NotFound,
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Backend error: {0}")]
	Backend(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Byte-level key/value backend.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Returns the bytes stored under `key`, or `NotFound` when absent or
	/// expired.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores bytes under `key`. `None` falls back to the backend's
	/// configured time-to-live for the key's namespace.
	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError>;

	/// Removes `key`. Removing an absent key is not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Drops expired entries and returns how many were removed.
	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		Ok(0)
	}
}

/// Builds a backend from its configuration table.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// All known backends as (configuration name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Builds the `primary` backend out of the configured `implementations`,
/// checking its table against the backend's schema first.
pub fn create_storage_service(
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<StorageService, StorageError> {
	let config = implementations.get(primary).ok_or_else(|| {
		StorageError::Configuration(format!(
			"Storage implementation '{}' is not configured",
			primary
		))
	})?;

	let factory = get_all_implementations()
		.into_iter()
		.find_map(|(name, factory)| (name == primary).then_some(factory))
		.ok_or_else(|| {
			StorageError::Configuration(format!("Unknown storage implementation '{}'", primary))
		})?;

	let backend = factory(config)?;
	backend
		.config_schema()
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	debug!(implementation = primary, "Storage backend ready");
	Ok(StorageService::new(backend))
}

/// Typed storage on top of a byte backend.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

fn key_for(namespace: StorageKey, id: &str) -> String {
	format!("{}:{}", namespace.as_str(), id)
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Stores `data` with an explicit time-to-live.
	pub async fn store_with_ttl<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		data: &T,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&key_for(namespace, id), bytes, ttl)
			.await
	}

	/// Stores `data`, creating or overwriting the entry.
	pub async fn store<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		self.store_with_ttl(namespace, id, data, None).await
	}

	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&key_for(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Like `retrieve`, but maps `NotFound` to `None`.
	pub async fn find<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<Option<T>, StorageError> {
		match self.retrieve(namespace, id).await {
			Ok(value) => Ok(Some(value)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	pub async fn remove(&self, namespace: StorageKey, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&key_for(namespace, id)).await
	}

	pub async fn exists(&self, namespace: StorageKey, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&key_for(namespace, id)).await
	}

	pub async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		self.backend.cleanup_expired().await
	}
}

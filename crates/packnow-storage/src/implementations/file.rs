//! File-backed storage.
//!
//! Each key lives in its own file under the configured directory. Files start
//! with a fixed 64-byte header carrying an expiry time, so a stale session is
//! treated as absent even if nothing ever cleaned it up.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use packnow_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, SchemaError, StorageKey,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::{debug, warn};

const DEFAULT_STORAGE_PATH: &str = ".packnow";

fn unix_now() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or_default()
}

/// Header written in front of every stored value.
///
/// Layout, 64 bytes:
/// - `[0..4]`   magic `PKNW`
/// - `[4..6]`   format version, u16 LE
/// - `[6..14]`  expiry, u64 LE Unix seconds, 0 = never
/// - `[14..64]` reserved, zero
#[derive(Debug, Clone, Copy)]
struct FileHeader {
	version: u16,
	expires_at: u64,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"PKNW";
	const VERSION: u16 = 1;
	const SIZE: usize = 64;

	fn new(ttl: Duration) -> Self {
		let expires_at = if ttl.is_zero() {
			0
		} else {
			unix_now().saturating_add(ttl.as_secs())
		};
		Self {
			version: Self::VERSION,
			expires_at,
		}
	}

	fn to_bytes(self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
		bytes[6..14].copy_from_slice(&self.expires_at.to_le_bytes());
		bytes
	}

	fn parse(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE {
			return Err(StorageError::Backend("File too small for header".into()));
		}
		if &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Unrecognized file format".into()));
		}

		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}

		let mut expiry = [0u8; 8];
		expiry.copy_from_slice(&bytes[6..14]);
		Ok(Self {
			version,
			expires_at: u64::from_le_bytes(expiry),
		})
	}

	fn is_expired(&self) -> bool {
		self.expires_at != 0 && unix_now() >= self.expires_at
	}
}

/// Default time-to-live per namespace, from `ttl_<namespace>` keys.
#[derive(Debug, Clone, Default)]
pub struct TtlConfig {
	ttls: HashMap<StorageKey, Duration>,
}

impl TtlConfig {
	fn from_config(config: &toml::Value) -> Self {
		let ttls = StorageKey::all()
			.filter_map(|key| {
				config
					.get(format!("ttl_{}", key.as_str()))
					.and_then(|v| v.as_integer())
					.and_then(|secs| u64::try_from(secs).ok())
					.map(|secs| (key, Duration::from_secs(secs)))
			})
			.collect();
		Self { ttls }
	}

	fn ttl_for(&self, key: StorageKey) -> Duration {
		self.ttls.get(&key).copied().unwrap_or(Duration::ZERO)
	}
}

/// Stores each key as `<base_path>/<sanitized key>.bin`.
pub struct FileStorage {
	base_path: PathBuf,
	ttl_config: TtlConfig,
}

impl FileStorage {
	pub fn new(base_path: PathBuf, ttl_config: TtlConfig) -> Self {
		Self {
			base_path,
			ttl_config,
		}
	}

	fn file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', '\\', ':'], "_");
		self.base_path.join(format!("{}.bin", safe_key))
	}

	fn default_ttl(&self, key: &str) -> Duration {
		key.split(':')
			.next()
			.and_then(|namespace| namespace.parse::<StorageKey>().ok())
			.map(|namespace| self.ttl_config.ttl_for(namespace))
			.unwrap_or(Duration::ZERO)
	}

	/// Reads a file and strips its header. `None` when missing or expired.
	async fn read_live(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
		let path = self.file_path(key);
		let mut data = match fs::read(&path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let header = FileHeader::parse(&data)?;
		if header.is_expired() {
			debug!(key, "Stored entry has expired");
			return Ok(None);
		}
		Ok(Some(data.split_off(FileHeader::SIZE)))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		self.read_live(key).await?.ok_or(StorageError::NotFound)
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let path = self.file_path(key);
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let ttl = ttl.unwrap_or_else(|| self.default_ttl(key));
		let mut file_data = Vec::with_capacity(FileHeader::SIZE + value.len());
		file_data.extend_from_slice(&FileHeader::new(ttl).to_bytes());
		file_data.extend_from_slice(&value);

		// Readers never observe a half-written file.
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, file_data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.file_path(key)).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(self.read_live(key).await?.is_some())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut removed = 0;
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("bin")) {
				continue;
			}
			let expired = match fs::read(&path).await {
				Ok(data) => FileHeader::parse(&data).is_ok_and(|h| h.is_expired()),
				Err(e) => {
					debug!(path = %path.display(), error = %e, "Skipping unreadable file");
					false
				},
			};
			if expired {
				match fs::remove_file(&path).await {
					Ok(()) => removed += 1,
					Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove expired file"),
				}
			}
		}
		Ok(removed)
	}
}

pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), SchemaError> {
		let mut optional = vec![Field::new("storage_path", FieldType::String)];
		optional.extend(StorageKey::all().map(|key| {
			Field::new(
				format!("ttl_{}", key.as_str()),
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			)
		}));
		Schema::new(vec![], optional).validate(config)
	}
}

/// Builds a file backend.
///
/// Configuration:
/// - `storage_path`: directory for stored files (default `.packnow`)
/// - `ttl_sessions`, `ttl_profiles`: seconds until entries expire (0 = never)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	Ok(Box::new(FileStorage::new(
		PathBuf::from(storage_path),
		TtlConfig::from_config(config),
	)))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn storage(dir: &TempDir) -> FileStorage {
		FileStorage::new(dir.path().join("store"), TtlConfig::default())
	}

	#[tokio::test]
	async fn test_set_get_delete() {
		let dir = TempDir::new().unwrap();
		let storage = storage(&dir);

		storage
			.set_bytes("sessions:current", b"{\"a\":1}".to_vec(), None)
			.await
			.unwrap();
		assert_eq!(
			storage.get_bytes("sessions:current").await.unwrap(),
			b"{\"a\":1}".to_vec()
		);
		assert!(storage.exists("sessions:current").await.unwrap());
		assert!(dir.path().join("store/sessions_current.bin").exists());

		storage.delete("sessions:current").await.unwrap();
		assert!(!storage.exists("sessions:current").await.unwrap());
		assert!(matches!(
			storage.get_bytes("sessions:current").await,
			Err(StorageError::NotFound)
		));
		storage.delete("sessions:current").await.unwrap();
	}

	#[tokio::test]
	async fn test_expired_entry_is_absent() {
		let dir = TempDir::new().unwrap();
		let storage = storage(&dir);

		// Expiry set one hour in the past.
		let mut header = FileHeader::new(Duration::ZERO);
		header.expires_at = unix_now() - 3600;
		let mut data = header.to_bytes().to_vec();
		data.extend_from_slice(b"stale");
		std::fs::create_dir_all(dir.path().join("store")).unwrap();
		std::fs::write(dir.path().join("store/sessions_current.bin"), data).unwrap();

		assert!(!storage.exists("sessions:current").await.unwrap());
		assert!(matches!(
			storage.get_bytes("sessions:current").await,
			Err(StorageError::NotFound)
		));
		assert_eq!(storage.cleanup_expired().await.unwrap(), 1);
		assert!(!dir.path().join("store/sessions_current.bin").exists());
	}

	#[tokio::test]
	async fn test_namespace_ttl_applied() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(
			dir.path().to_path_buf(),
			TtlConfig::from_config(&toml::from_str::<toml::Value>("ttl_sessions = 600").unwrap()),
		);

		storage
			.set_bytes("sessions:current", b"x".to_vec(), None)
			.await
			.unwrap();
		storage
			.set_bytes("profiles:current", b"y".to_vec(), None)
			.await
			.unwrap();

		let session = std::fs::read(dir.path().join("sessions_current.bin")).unwrap();
		let header = FileHeader::parse(&session).unwrap();
		assert!(header.expires_at >= unix_now() + 590);

		let profile = std::fs::read(dir.path().join("profiles_current.bin")).unwrap();
		assert_eq!(FileHeader::parse(&profile).unwrap().expires_at, 0);
	}

	#[tokio::test]
	async fn test_foreign_file_rejected() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("sessions_current.bin"), b"not a packnow file").unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf(), TtlConfig::default());

		assert!(matches!(
			storage.get_bytes("sessions:current").await,
			Err(StorageError::Backend(_))
		));
	}

	#[test]
	fn test_ttl_config_from_toml() {
		let config: toml::Value =
			toml::from_str("storage_path = \"/tmp/x\"\nttl_sessions = 604800").unwrap();
		let ttl = TtlConfig::from_config(&config);
		assert_eq!(ttl.ttl_for(StorageKey::Sessions), Duration::from_secs(604800));
		assert_eq!(ttl.ttl_for(StorageKey::Profiles), Duration::ZERO);
		assert!(FileStorageSchema.validate(&config).is_ok());

		let bad: toml::Value = toml::from_str("ttl_sessions = -1").unwrap();
		assert!(FileStorageSchema.validate(&bad).is_err());
	}
}

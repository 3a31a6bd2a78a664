//! Fluent construction of `Config` values for tests.

use crate::{ApiConfig, Config, OrderConfig, SessionConfig, TrackingConfig};
use std::collections::HashMap;
use std::path::Path;

/// Builds a `Config` that uses in-memory session storage unless told
/// otherwise.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	base_url: String,
	timeout_seconds: u64,
	poll_interval_seconds: u64,
	order: OrderConfig,
	session: SessionConfig,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		let mut implementations = HashMap::new();
		implementations.insert(
			"memory".to_string(),
			toml::Value::Table(toml::Table::new()),
		);
		Self {
			base_url: "http://127.0.0.1:8000/api/v1".to_string(),
			timeout_seconds: 5,
			poll_interval_seconds: 1,
			order: OrderConfig::default(),
			session: SessionConfig {
				primary: "memory".to_string(),
				implementations,
			},
		}
	}

	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = url.into();
		self
	}

	pub fn timeout_seconds(mut self, seconds: u64) -> Self {
		self.timeout_seconds = seconds;
		self
	}

	pub fn poll_interval_seconds(mut self, seconds: u64) -> Self {
		self.poll_interval_seconds = seconds;
		self
	}

	pub fn estimate_distance_km(mut self, km: f64) -> Self {
		self.order.estimate_distance_km = km;
		self
	}

	/// Switches session storage to files under `dir`.
	pub fn file_sessions(mut self, dir: &Path) -> Self {
		let mut table = toml::Table::new();
		table.insert(
			"storage_path".to_string(),
			toml::Value::String(dir.display().to_string()),
		);
		self.session
			.implementations
			.insert("file".to_string(), toml::Value::Table(table));
		self.session.primary = "file".to_string();
		self
	}

	pub fn build(self) -> Config {
		Config {
			api: ApiConfig {
				base_url: self.base_url,
				timeout_seconds: self.timeout_seconds,
			},
			order: self.order,
			tracking: TrackingConfig {
				poll_interval_seconds: self.poll_interval_seconds,
			},
			session: self.session,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_built_config_is_valid() {
		let config = ConfigBuilder::new()
			.base_url("http://127.0.0.1:9000/api/v1")
			.poll_interval_seconds(2)
			.build();
		assert!(config.validate().is_ok());
		assert_eq!(config.session.primary, "memory");
	}

	#[test]
	fn test_file_sessions() {
		let dir = tempfile::tempdir().unwrap();
		let config = ConfigBuilder::new().file_sessions(dir.path()).build();
		assert!(config.validate().is_ok());
		assert_eq!(config.session.primary, "file");
	}
}

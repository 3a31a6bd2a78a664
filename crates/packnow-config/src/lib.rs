//! Configuration for the PackNow client.
//!
//! Settings are read from a TOML file. String values may reference
//! environment variables as `${NAME}` or `${NAME:-fallback}`, and a file may
//! pull further files in with `include = ["other.toml"]`. Every top-level
//! section must come from exactly one file.

#[cfg(feature = "testing")]
pub mod builders;
mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub use loader::ConfigLoader;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// The full error embeds the whole input document.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
	#[serde(default)]
	pub api: ApiConfig,
	#[serde(default)]
	pub order: OrderConfig,
	#[serde(default)]
	pub tracking: TrackingConfig,
	#[serde(default)]
	pub session: SessionConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Base URL every endpoint path is appended to.
	#[serde(default = "default_base_url")]
	pub base_url: String,
	/// Upper bound for a single request, in seconds.
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			base_url: default_base_url(),
			timeout_seconds: default_timeout_seconds(),
		}
	}
}

impl ApiConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_seconds)
	}
}

fn default_base_url() -> String {
	"http://localhost:8000/api/v1".to_string()
}

fn default_timeout_seconds() -> u64 {
	15
}

/// Defaults applied when composing orders.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderConfig {
	/// Distance sent with estimate requests. The real distance is only known
	/// once a packer is assigned.
	#[serde(default = "default_estimate_distance_km")]
	pub estimate_distance_km: f64,
	/// Pickup latitude used when the user gives none.
	#[serde(default = "default_lat")]
	pub default_lat: f64,
	/// Pickup longitude used when the user gives none.
	#[serde(default = "default_lng")]
	pub default_lng: f64,
}

impl Default for OrderConfig {
	fn default() -> Self {
		Self {
			estimate_distance_km: default_estimate_distance_km(),
			default_lat: default_lat(),
			default_lng: default_lng(),
		}
	}
}

fn default_estimate_distance_km() -> f64 {
	5.0
}

// Mumbai
fn default_lat() -> f64 {
	19.0760
}

fn default_lng() -> f64 {
	72.8777
}

/// Order status tracking settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackingConfig {
	#[serde(default = "default_poll_interval_seconds")]
	pub poll_interval_seconds: u64,
}

impl Default for TrackingConfig {
	fn default() -> Self {
		Self {
			poll_interval_seconds: default_poll_interval_seconds(),
		}
	}
}

impl TrackingConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_seconds)
	}
}

fn default_poll_interval_seconds() -> u64 {
	5
}

/// Where the session is persisted between invocations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Implementation name mapped to its raw configuration table.
	pub implementations: HashMap<String, toml::Value>,
}

impl Default for SessionConfig {
	fn default() -> Self {
		let mut file = toml::Table::new();
		file.insert(
			"storage_path".to_string(),
			toml::Value::String(".packnow".to_string()),
		);
		let mut implementations = HashMap::new();
		implementations.insert("file".to_string(), toml::Value::Table(file));
		Self {
			primary: "file".to_string(),
			implementations,
		}
	}
}

impl SessionConfig {
	/// Raw configuration table of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

/// Resolves `${VAR}` and `${VAR:-default}` references in `input`.
///
/// Input is capped at 1 MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;
	for cap in re.captures_iter(input) {
		let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						name.as_str()
					)))
				},
			},
		};
		result.push_str(&input[last..whole.start()]);
		result.push_str(&value);
		last = whole.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from `path`, following includes.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = match path.parent() {
			Some(dir) if !dir.as_os_str().is_empty() => dir,
			_ => Path::new("."),
		};
		let file_name = path.file_name().ok_or_else(|| {
			ConfigError::Validation(format!("Invalid path: {}", path.display()))
		})?;

		let mut loader = ConfigLoader::new(base_dir);
		loader.load_config(file_name).await
	}

	/// Checks value ranges and cross-section references.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let base_url = self.api.base_url.trim();
		if base_url.is_empty() {
			return Err(ConfigError::Validation("API base_url cannot be empty".into()));
		}
		if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
			return Err(ConfigError::Validation(format!(
				"API base_url must start with http:// or https://, got '{}'",
				base_url
			)));
		}
		if !(1..=300).contains(&self.api.timeout_seconds) {
			return Err(ConfigError::Validation(
				"API timeout_seconds must be between 1 and 300".into(),
			));
		}

		let order = &self.order;
		if !order.estimate_distance_km.is_finite() || order.estimate_distance_km < 0.0 {
			return Err(ConfigError::Validation(
				"Order estimate_distance_km must be a non-negative number".into(),
			));
		}
		if !(-90.0..=90.0).contains(&order.default_lat) {
			return Err(ConfigError::Validation(
				"Order default_lat must be between -90 and 90".into(),
			));
		}
		if !(-180.0..=180.0).contains(&order.default_lng) {
			return Err(ConfigError::Validation(
				"Order default_lng must be between -180 and 180".into(),
			));
		}

		if !(1..=3600).contains(&self.tracking.poll_interval_seconds) {
			return Err(ConfigError::Validation(
				"Tracking poll_interval_seconds must be between 1 and 3600".into(),
			));
		}

		if self.session.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one session implementation must be configured".into(),
			));
		}
		if self.session.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Session primary implementation cannot be empty".into(),
			));
		}
		if !self
			.session
			.implementations
			.contains_key(&self.session.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary session storage '{}' not found in implementations",
				self.session.primary
			)));
		}

		Ok(())
	}
}

/// Parses a TOML document, resolving environment variables first, and
/// validates the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("PACKNOW_TEST_HOST", "api.packnow.in");
		std::env::set_var("PACKNOW_TEST_PORT", "8443");

		let input = "base_url = \"https://${PACKNOW_TEST_HOST}:${PACKNOW_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "base_url = \"https://api.packnow.in:8443\"");

		std::env::remove_var("PACKNOW_TEST_HOST");
		std::env::remove_var("PACKNOW_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "path = \"${PACKNOW_TEST_UNSET_DIR:-/var/lib/packnow}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "path = \"/var/lib/packnow\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let err = resolve_env_vars("token = \"${PACKNOW_TEST_MISSING}\"").unwrap_err();
		assert!(err.to_string().contains("PACKNOW_TEST_MISSING"));
	}

	#[test]
	fn test_empty_document_uses_defaults() {
		let config: Config = "".parse().unwrap();
		assert_eq!(config.api.base_url, "http://localhost:8000/api/v1");
		assert_eq!(config.api.timeout(), Duration::from_secs(15));
		assert_eq!(config.order.estimate_distance_km, 5.0);
		assert_eq!(config.tracking.poll_interval(), Duration::from_secs(5));
		assert_eq!(config.session.primary, "file");
		assert!(config.session.primary_config().is_some());
	}

	#[test]
	fn test_full_document() {
		std::env::set_var("PACKNOW_TEST_API", "https://api.packnow.in/api/v1");
		let config: Config = r#"
[api]
base_url = "${PACKNOW_TEST_API}"
timeout_seconds = 30

[order]
estimate_distance_km = 12.5
default_lat = 12.9716
default_lng = 77.5946

[tracking]
poll_interval_seconds = 10

[session]
primary = "memory"
[session.implementations.memory]
"#
		.parse()
		.unwrap();
		std::env::remove_var("PACKNOW_TEST_API");

		assert_eq!(config.api.base_url, "https://api.packnow.in/api/v1");
		assert_eq!(config.api.timeout_seconds, 30);
		assert_eq!(config.order.default_lat, 12.9716);
		assert_eq!(config.tracking.poll_interval_seconds, 10);
		assert_eq!(config.session.primary, "memory");
	}

	#[test]
	fn test_rejects_bad_base_url() {
		let err = "[api]\nbase_url = \"localhost:8000\"".parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("http:// or https://"));
	}

	#[test]
	fn test_rejects_out_of_range_values() {
		assert!("[api]\ntimeout_seconds = 0".parse::<Config>().is_err());
		assert!("[tracking]\npoll_interval_seconds = 0".parse::<Config>().is_err());
		assert!("[order]\nestimate_distance_km = -1.0".parse::<Config>().is_err());
		assert!("[order]\ndefault_lat = 91.0".parse::<Config>().is_err());
	}

	#[test]
	fn test_primary_must_be_configured() {
		let err = r#"
[session]
primary = "file"
[session.implementations.memory]
"#
		.parse::<Config>()
		.unwrap_err();
		assert!(err
			.to_string()
			.contains("Primary session storage 'file' not found"));
	}
}

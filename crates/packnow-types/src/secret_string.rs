//! Redacting string type for credentials.
//!
//! Access tokens, refresh tokens and passwords are wrapped in `SecretString`
//! so they are zeroed on drop and never show up in logs or debug output.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "***REDACTED***";

/// A credential string that zeroes its memory on drop and redacts itself in
/// `Debug`, `Display` and default serialization.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	pub fn new(s: String) -> Self {
		Self(Zeroizing::new(s))
	}

	/// Exposes the secret. Only call this where the raw value has to leave the
	/// process, e.g. when building an `Authorization` header.
	pub fn expose_secret(&self) -> &str {
		&self.0
	}

	/// Exposes the secret to a closure, limiting where the raw value lives.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString({})", REDACTED)
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::new(s.to_string())
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretString {}

// Serialization always redacts; use `exposed` for fields that must round-trip.
impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(SecretString::new(s))
	}
}

/// Serde adapter that writes the raw value. Used for request bodies sent to
/// the API and for the persisted session, never for logs.
pub mod exposed {
	use super::SecretString;
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(value.expose_secret())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
	where
		D: Deserializer<'de>,
	{
		SecretString::deserialize(deserializer)
	}

	/// Same as the parent module for optional values.
	pub mod option {
		use super::SecretString;
		use serde::{Deserialize, Deserializer, Serializer};

		pub fn serialize<S>(value: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			match value {
				Some(secret) => serializer.serialize_some(secret.expose_secret()),
				None => serializer.serialize_none(),
			}
		}

		pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
		where
			D: Deserializer<'de>,
		{
			Option::<String>::deserialize(deserializer).map(|v| v.map(SecretString::new))
		}
	}
}

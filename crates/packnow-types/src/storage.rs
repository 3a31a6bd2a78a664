//! Storage namespaces used by the client.

use std::str::FromStr;

/// Namespaces for persisted client data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// The authenticated session (bearer and refresh tokens).
	Sessions,
	/// Cached profile of the logged-in user.
	Profiles,
}

impl StorageKey {
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Sessions => "sessions",
			StorageKey::Profiles => "profiles",
		}
	}

	pub fn all() -> impl Iterator<Item = Self> {
		[Self::Sessions, Self::Profiles].into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"sessions" => Ok(Self::Sessions),
			"profiles" => Ok(Self::Profiles),
			_ => Err(()),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_storage_key_names_parse_back() {
		for key in StorageKey::all() {
			assert_eq!(key.as_str().parse::<StorageKey>(), Ok(key));
		}
		assert!("orders".parse::<StorageKey>().is_err());
	}
}

//! Authentication types for the PackNow client.
//!
//! Defines the login and registration payloads, the token pair issued by the
//! API, the user profile, and `Session`, the explicit bearer credential that
//! is passed by reference to every authenticated call.

use crate::order::timestamp_serde;
use crate::secret_string::{exposed, SecretString};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Login request body.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
	pub phone: String,
	#[serde(with = "exposed")]
	pub password: SecretString,
}

/// Latitude/longitude pair without an address.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
	pub lat: f64,
	pub lng: f64,
}

/// User registration request body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
	pub name: String,
	pub phone: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(with = "exposed")]
	pub password: SecretString,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub location: Option<GeoPoint>,
}

impl RegisterRequest {
	/// Login credentials for the account being registered.
	pub fn credentials(&self) -> Credentials {
		Credentials {
			phone: self.phone.clone(),
			password: self.password.clone(),
		}
	}
}

/// Tokens issued by the login and refresh endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
	pub access_token: SecretString,
	#[serde(default)]
	pub refresh_token: Option<SecretString>,
	#[serde(default = "default_token_type")]
	pub token_type: String,
}

fn default_token_type() -> String {
	"bearer".to_string()
}

/// Profile of the logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
	pub id: u64,
	pub name: String,
	pub phone: String,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub location: Option<serde_json::Value>,
	#[serde(with = "timestamp_serde")]
	pub created_at: DateTime<Utc>,
}

/// Bearer credential of an authenticated user.
///
/// A session is created by a successful login and destroyed by logout. It is
/// never held in global state; callers hand it to each outbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
	#[serde(with = "exposed")]
	access_token: SecretString,
	#[serde(with = "exposed::option", default)]
	refresh_token: Option<SecretString>,
	token_type: String,
	/// Phone number the session was opened for.
	pub phone: String,
	#[serde(with = "timestamp_serde")]
	pub issued_at: DateTime<Utc>,
}

impl Session {
	/// Opens a session from a freshly issued token pair.
	pub fn new(phone: impl Into<String>, tokens: TokenPair) -> Self {
		Self {
			access_token: tokens.access_token,
			refresh_token: tokens.refresh_token,
			token_type: tokens.token_type,
			phone: phone.into(),
			issued_at: Utc::now(),
		}
	}

	/// Value of the `Authorization` header for this session.
	pub fn authorization(&self) -> String {
		self.access_token.with_exposed(|token| format!("Bearer {}", token))
	}

	pub fn access_token(&self) -> &SecretString {
		&self.access_token
	}

	pub fn refresh_token(&self) -> Option<&SecretString> {
		self.refresh_token.as_ref()
	}

	/// Replaces the tokens after a refresh, keeping the previous refresh
	/// token when the server does not rotate it.
	pub fn rotate(&mut self, tokens: TokenPair) {
		self.access_token = tokens.access_token;
		if tokens.refresh_token.is_some() {
			self.refresh_token = tokens.refresh_token;
		}
		self.token_type = tokens.token_type;
		self.issued_at = Utc::now();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tokens(access: &str, refresh: Option<&str>) -> TokenPair {
		TokenPair {
			access_token: SecretString::from(access),
			refresh_token: refresh.map(SecretString::from),
			token_type: "bearer".to_string(),
		}
	}

	#[test]
	fn test_authorization_header() {
		let session = Session::new("+919876543210", tokens("abc", Some("def")));
		assert_eq!(session.authorization(), "Bearer abc");
		assert!(!format!("{:?}", session).contains("abc"));
	}

	#[test]
	fn test_session_persists_raw_tokens() {
		let session = Session::new("+919876543210", tokens("abc", Some("def")));
		let json = serde_json::to_string(&session).unwrap();
		assert!(json.contains("\"abc\""));

		let restored: Session = serde_json::from_str(&json).unwrap();
		assert_eq!(restored, session);
	}

	#[test]
	fn test_rotate_keeps_refresh_token() {
		let mut session = Session::new("+919876543210", tokens("old", Some("refresh")));
		session.rotate(tokens("new", None));
		assert_eq!(session.access_token().expose_secret(), "new");
		assert_eq!(session.refresh_token().unwrap().expose_secret(), "refresh");
	}

	#[test]
	fn test_credentials_body_exposes_password() {
		let credentials = Credentials {
			phone: "+919876543210".to_string(),
			password: SecretString::from("Secret#123"),
		};
		let json = serde_json::to_value(&credentials).unwrap();
		assert_eq!(json["password"], "Secret#123");
		assert!(!format!("{:?}", credentials).contains("Secret#123"));
	}

	#[test]
	fn test_token_pair_defaults() {
		let pair: TokenPair = serde_json::from_str(r#"{"access_token": "a"}"#).unwrap();
		assert_eq!(pair.token_type, "bearer");
		assert!(pair.refresh_token.is_none());
	}
}

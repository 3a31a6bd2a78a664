//! Session lifecycle: login, registration, refresh and logout.
//!
//! The session is persisted through the configured `StorageService` so a
//! later invocation finds the user still logged in. Nothing here is global;
//! callers get a `Session` value back and pass it to the API themselves.

use packnow_api::{ApiError, AuthInterface};
use packnow_storage::{StorageError, StorageService};
use packnow_types::{
	validate_email, validate_name, validate_password, validate_phone,
	Credentials, GeoPoint, RegisterRequest, SecretString, Session, StorageKey, UserProfile,
	ValidationError,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

const CURRENT: &str = "current";

const LOGIN_FALLBACK: &str = "Login failed. Please check your credentials.";
const REGISTER_FALLBACK: &str = "Registration failed. Please try again.";
const REFRESH_FALLBACK: &str = "Session refresh failed";
const PROFILE_FALLBACK: &str = "Failed to load profile";

#[derive(Debug, Error)]
pub enum SessionError {
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error("{message}")]
	Api {
		message: String,
		#[source]
		source: ApiError,
	},
	#[error("Session storage error: {0}")]
	Storage(#[from] StorageError),
	#[error("Not logged in. Run `packnow login` first.")]
	NotLoggedIn,
	#[error("Session has no refresh token")]
	NoRefreshToken,
	#[error("Your session has expired. Please log in again.")]
	Expired,
}

impl SessionError {
	fn api(source: ApiError, fallback: &str) -> Self {
		SessionError::Api {
			message: source.user_message(fallback),
			source,
		}
	}

	pub fn is_unauthorized(&self) -> bool {
		matches!(self, SessionError::Api { source, .. } if source.is_unauthorized())
	}

	/// True when the server refused the credential itself, as opposed to a
	/// failure that may go away on retry.
	fn rejects_credential(&self) -> bool {
		match self {
			SessionError::NoRefreshToken => true,
			SessionError::Api { source, .. } => {
				source.is_unauthorized()
					|| matches!(source, ApiError::Status { status: 400..=499, .. })
			}
			_ => false,
		}
	}
}

/// Fields collected by the registration form.
#[derive(Debug, Clone)]
pub struct Registration {
	pub name: String,
	pub phone: String,
	/// Empty means "not given".
	pub email: String,
	pub password: SecretString,
	pub location: Option<GeoPoint>,
}

impl Registration {
	/// Checks every field, trimming name and email.
	pub fn validate(&self) -> Result<RegisterRequest, ValidationError> {
		validate_name(self.name.trim())?;
		validate_phone(&self.phone)?;
		validate_email(self.email.trim())?;
		// Every strength rule has to pass, so the first failing one is reported.
		self.password.with_exposed(validate_password)?;

		let email = self.email.trim();
		Ok(RegisterRequest {
			name: self.name.trim().to_string(),
			phone: self.phone.clone(),
			email: (!email.is_empty()).then(|| email.to_string()),
			password: self.password.clone(),
			location: self.location,
		})
	}
}

/// Owns the persisted session and the calls that change it.
pub struct SessionManager {
	auth: Arc<dyn AuthInterface>,
	storage: Arc<StorageService>,
}

impl SessionManager {
	pub fn new(auth: Arc<dyn AuthInterface>, storage: Arc<StorageService>) -> Self {
		Self { auth, storage }
	}

	/// Logs in and persists the new session.
	pub async fn login(&self, phone: &str, password: SecretString) -> Result<Session, SessionError> {
		let phone = phone.trim();
		validate_phone(phone)?;
		if password.is_empty() {
			return Err(ValidationError::Missing { field: "password" }.into());
		}

		self.open_session(Credentials {
			phone: phone.to_string(),
			password,
		})
		.await
	}

	async fn open_session(&self, credentials: Credentials) -> Result<Session, SessionError> {
		let tokens = self
			.auth
			.login(&credentials)
			.await
			.map_err(|e| SessionError::api(e, LOGIN_FALLBACK))?;

		let session = Session::new(credentials.phone, tokens);
		self.storage
			.store(StorageKey::Sessions, CURRENT, &session)
			.await?;
		// A profile cached for a previous account must not leak into this one.
		self.storage.remove(StorageKey::Profiles, CURRENT).await?;
		info!(phone = %session.phone, "Logged in");
		Ok(session)
	}

	/// Creates the account, then logs straight in with the same credentials.
	pub async fn register(&self, registration: &Registration) -> Result<Session, SessionError> {
		let request = registration.validate()?;
		let profile = self
			.auth
			.register(&request)
			.await
			.map_err(|e| SessionError::api(e, REGISTER_FALLBACK))?;
		info!(user_id = profile.id, "Account registered");

		let session = self.open_session(request.credentials()).await?;
		self.storage
			.store(StorageKey::Profiles, CURRENT, &profile)
			.await?;
		Ok(session)
	}

	/// The persisted session, if any.
	pub async fn current(&self) -> Result<Option<Session>, SessionError> {
		Ok(self.storage.find(StorageKey::Sessions, CURRENT).await?)
	}

	/// The persisted session, or `NotLoggedIn`.
	pub async fn require(&self) -> Result<Session, SessionError> {
		self.current().await?.ok_or(SessionError::NotLoggedIn)
	}

	pub async fn is_authenticated(&self) -> Result<bool, SessionError> {
		Ok(self.storage.exists(StorageKey::Sessions, CURRENT).await?)
	}

	/// Exchanges the refresh token for a new pair and persists the result.
	pub async fn refresh(&self, session: &Session) -> Result<Session, SessionError> {
		let refresh_token = session.refresh_token().ok_or(SessionError::NoRefreshToken)?;
		let tokens = self
			.auth
			.refresh(refresh_token)
			.await
			.map_err(|e| SessionError::api(e, REFRESH_FALLBACK))?;

		let mut renewed = session.clone();
		renewed.rotate(tokens);
		self.storage
			.store(StorageKey::Sessions, CURRENT, &renewed)
			.await?;
		debug!("Session refreshed");
		Ok(renewed)
	}

	/// Reaction to a rejected access token: one refresh attempt.
	///
	/// When the refresh token is refused too, the stored session is discarded
	/// and `Expired` is returned. Network failures and timeouts keep the
	/// session so the user can retry.
	pub async fn recover(&self, session: &Session) -> Result<Session, SessionError> {
		match self.refresh(session).await {
			Ok(renewed) => Ok(renewed),
			Err(e) if e.rejects_credential() => {
				warn!(error = %e, "Refresh token rejected, logging out");
				self.logout().await?;
				Err(SessionError::Expired)
			}
			Err(e) => {
				warn!(error = %e, "Session refresh failed, keeping session");
				Err(e)
			}
		}
	}

	/// Forgets the session and any cached profile, and drops expired
	/// entries left behind by earlier sessions.
	pub async fn logout(&self) -> Result<(), SessionError> {
		self.storage.remove(StorageKey::Sessions, CURRENT).await?;
		self.storage.remove(StorageKey::Profiles, CURRENT).await?;
		let purged = self.storage.cleanup_expired().await?;
		info!(purged, "Logged out");
		Ok(())
	}

	/// Profile of the logged-in user, served from cache when available.
	pub async fn current_user(&self, session: &Session) -> Result<UserProfile, SessionError> {
		if let Some(profile) = self
			.storage
			.find::<UserProfile>(StorageKey::Profiles, CURRENT)
			.await?
		{
			return Ok(profile);
		}

		let profile = self
			.auth
			.current_user(session)
			.await
			.map_err(|e| SessionError::api(e, PROFILE_FALLBACK))?;
		self.storage
			.store(StorageKey::Profiles, CURRENT, &profile)
			.await?;
		Ok(profile)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use mockall::mock;
	use packnow_storage::implementations::memory::MemoryStorage;
	use packnow_storage::StorageInterface;
	use packnow_types::{ConfigSchema, TokenPair};
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	mock! {
		Auth {}

		#[async_trait]
		impl AuthInterface for Auth {
			async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, ApiError>;
			async fn login(&self, credentials: &Credentials) -> Result<TokenPair, ApiError>;
			async fn refresh(&self, refresh_token: &SecretString) -> Result<TokenPair, ApiError>;
			async fn current_user(&self, session: &Session) -> Result<UserProfile, ApiError>;
		}
	}

	const PHONE: &str = "+919876543210";

	fn tokens(access: &str) -> TokenPair {
		serde_json::from_value(serde_json::json!({
			"access_token": access,
			"refresh_token": "refresh",
			"token_type": "bearer"
		}))
		.unwrap()
	}

	fn profile() -> UserProfile {
		serde_json::from_value(serde_json::json!({
			"id": 3,
			"name": "Asha Rao",
			"phone": PHONE,
			"created_at": "2026-10-19T09:00:00Z"
		}))
		.unwrap()
	}

	fn manager(auth: MockAuth) -> SessionManager {
		SessionManager::new(
			Arc::new(auth),
			Arc::new(StorageService::new(Box::new(MemoryStorage::new()))),
		)
	}

	fn registration(password: &str) -> Registration {
		Registration {
			name: "Asha Rao".into(),
			phone: PHONE.into(),
			email: String::new(),
			password: SecretString::from(password),
			location: None,
		}
	}

	#[tokio::test]
	async fn test_login_persists_session() {
		let mut auth = MockAuth::new();
		auth.expect_login()
			.withf(|c| c.phone == PHONE && c.password.expose_secret() == "Secret#123")
			.times(1)
			.returning(|_| Ok(tokens("access")));

		let sessions = manager(auth);
		assert!(!sessions.is_authenticated().await.unwrap());

		let session = sessions
			.login(PHONE, SecretString::from("Secret#123"))
			.await
			.unwrap();
		assert_eq!(session.authorization(), "Bearer access");
		assert!(sessions.is_authenticated().await.unwrap());
		assert_eq!(sessions.require().await.unwrap(), session);
	}

	#[tokio::test]
	async fn test_login_rejects_bad_phone_without_request() {
		let mut auth = MockAuth::new();
		auth.expect_login().never();

		let err = manager(auth)
			.login("98765", SecretString::from("Secret#123"))
			.await
			.unwrap_err();
		assert!(matches!(err, SessionError::Validation(ref v) if v.field() == "phone"));
	}

	#[tokio::test]
	async fn test_login_failure_message() {
		let mut auth = MockAuth::new();
		auth.expect_login()
			.returning(|_| Err(ApiError::Unauthorized { detail: None }));

		let err = manager(auth)
			.login(PHONE, SecretString::from("wrong"))
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Login failed. Please check your credentials.");
	}

	#[tokio::test]
	async fn test_register_requires_strong_password() {
		let mut auth = MockAuth::new();
		auth.expect_register().never();

		let err = manager(auth)
			.register(&registration("password"))
			.await
			.unwrap_err();
		assert_eq!(
			err.to_string(),
			"Password must contain at least one uppercase letter"
		);
	}

	#[tokio::test]
	async fn test_register_logs_in() {
		let mut auth = MockAuth::new();
		auth.expect_register()
			.withf(|r| r.name == "Asha Rao" && r.email.is_none())
			.times(1)
			.returning(|_| Ok(profile()));
		auth.expect_login()
			.withf(|c| c.phone == PHONE && c.password.expose_secret() == "Secret#123")
			.times(1)
			.returning(|_| Ok(tokens("access")));
		auth.expect_current_user().never();

		let sessions = manager(auth);
		let session = sessions.register(&registration("Secret#123")).await.unwrap();
		assert_eq!(session.phone, PHONE);

		// The profile returned by registration is cached.
		let user = sessions.current_user(&session).await.unwrap();
		assert_eq!(user.name, "Asha Rao");
	}

	#[tokio::test]
	async fn test_register_failure_uses_detail() {
		let mut auth = MockAuth::new();
		auth.expect_register().returning(|_| {
			Err(ApiError::Status {
				status: 400,
				detail: Some("Phone number already registered".into()),
			})
		});
		auth.expect_login().never();

		let err = manager(auth)
			.register(&registration("Secret#123"))
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Phone number already registered");
	}

	#[tokio::test]
	async fn test_refresh_rotates_and_persists() {
		let mut auth = MockAuth::new();
		auth.expect_login().returning(|_| Ok(tokens("old")));
		auth.expect_refresh()
			.withf(|token| token.expose_secret() == "refresh")
			.times(1)
			.returning(|_| Ok(tokens("new")));

		let sessions = manager(auth);
		let session = sessions
			.login(PHONE, SecretString::from("Secret#123"))
			.await
			.unwrap();
		let renewed = sessions.refresh(&session).await.unwrap();

		assert_eq!(renewed.authorization(), "Bearer new");
		assert_eq!(sessions.require().await.unwrap(), renewed);
	}

	#[tokio::test]
	async fn test_recover_failure_clears_session() {
		let mut auth = MockAuth::new();
		auth.expect_login().returning(|_| Ok(tokens("old")));
		auth.expect_refresh()
			.returning(|_| Err(ApiError::Unauthorized { detail: None }));

		let sessions = manager(auth);
		let session = sessions
			.login(PHONE, SecretString::from("Secret#123"))
			.await
			.unwrap();

		let err = sessions.recover(&session).await.unwrap_err();
		assert!(matches!(err, SessionError::Expired));
		assert!(!sessions.is_authenticated().await.unwrap());
	}

	#[tokio::test]
	async fn test_recover_refused_refresh_token_clears_session() {
		let mut auth = MockAuth::new();
		auth.expect_login().returning(|_| Ok(tokens("old")));
		auth.expect_refresh().returning(|_| {
			Err(ApiError::Status {
				status: 400,
				detail: Some("Invalid refresh token".into()),
			})
		});

		let sessions = manager(auth);
		let session = sessions
			.login(PHONE, SecretString::from("Secret#123"))
			.await
			.unwrap();

		assert!(matches!(
			sessions.recover(&session).await,
			Err(SessionError::Expired)
		));
		assert!(!sessions.is_authenticated().await.unwrap());
	}

	#[tokio::test]
	async fn test_recover_timeout_keeps_session() {
		let mut auth = MockAuth::new();
		auth.expect_login().returning(|_| Ok(tokens("old")));
		auth.expect_refresh()
			.times(1)
			.returning(|_| Err(ApiError::Timeout(Duration::from_secs(15))));

		let sessions = manager(auth);
		let session = sessions
			.login(PHONE, SecretString::from("Secret#123"))
			.await
			.unwrap();

		let err = sessions.recover(&session).await.unwrap_err();
		assert!(matches!(
			err,
			SessionError::Api {
				source: ApiError::Timeout(_),
				..
			}
		));
		assert!(sessions.is_authenticated().await.unwrap());
		assert_eq!(sessions.require().await.unwrap(), session);
	}

	#[tokio::test]
	async fn test_recover_network_failure_keeps_session() {
		let mut auth = MockAuth::new();
		auth.expect_login().returning(|_| Ok(tokens("old")));
		auth.expect_refresh()
			.returning(|_| Err(ApiError::Network("connection refused".into())));

		let sessions = manager(auth);
		let session = sessions
			.login(PHONE, SecretString::from("Secret#123"))
			.await
			.unwrap();

		assert!(sessions.recover(&session).await.is_err());
		assert!(sessions.is_authenticated().await.unwrap());
	}

	/// Memory backend that counts cleanup runs.
	struct PurgeCounting {
		inner: MemoryStorage,
		purges: Arc<AtomicUsize>,
	}

	#[async_trait]
	impl StorageInterface for PurgeCounting {
		async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
			self.inner.get_bytes(key).await
		}

		async fn set_bytes(
			&self,
			key: &str,
			value: Vec<u8>,
			ttl: Option<Duration>,
		) -> Result<(), StorageError> {
			self.inner.set_bytes(key, value, ttl).await
		}

		async fn delete(&self, key: &str) -> Result<(), StorageError> {
			self.inner.delete(key).await
		}

		async fn exists(&self, key: &str) -> Result<bool, StorageError> {
			self.inner.exists(key).await
		}

		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			self.inner.config_schema()
		}

		async fn cleanup_expired(&self) -> Result<usize, StorageError> {
			self.purges.fetch_add(1, Ordering::SeqCst);
			Ok(2)
		}
	}

	#[tokio::test]
	async fn test_logout_purges_expired_entries() {
		let mut auth = MockAuth::new();
		auth.expect_login().returning(|_| Ok(tokens("access")));

		let purges = Arc::new(AtomicUsize::new(0));
		let storage = StorageService::new(Box::new(PurgeCounting {
			inner: MemoryStorage::new(),
			purges: purges.clone(),
		}));
		let sessions = SessionManager::new(Arc::new(auth), Arc::new(storage));
		sessions
			.login(PHONE, SecretString::from("Secret#123"))
			.await
			.unwrap();
		assert_eq!(purges.load(Ordering::SeqCst), 0);

		sessions.logout().await.unwrap();
		assert_eq!(purges.load(Ordering::SeqCst), 1);
		assert!(!sessions.is_authenticated().await.unwrap());
	}

	#[tokio::test]
	async fn test_logout_and_require() {
		let mut auth = MockAuth::new();
		auth.expect_login().returning(|_| Ok(tokens("access")));

		let sessions = manager(auth);
		sessions
			.login(PHONE, SecretString::from("Secret#123"))
			.await
			.unwrap();
		sessions.logout().await.unwrap();

		assert!(matches!(
			sessions.require().await,
			Err(SessionError::NotLoggedIn)
		));
		// Logging out twice is harmless.
		sessions.logout().await.unwrap();
	}

	#[tokio::test]
	async fn test_current_user_fetches_once() {
		let mut auth = MockAuth::new();
		auth.expect_login().returning(|_| Ok(tokens("access")));
		auth.expect_current_user()
			.times(1)
			.returning(|_| Ok(profile()));

		let sessions = manager(auth);
		let session = sessions
			.login(PHONE, SecretString::from("Secret#123"))
			.await
			.unwrap();
		assert_eq!(sessions.current_user(&session).await.unwrap().id, 3);
		assert_eq!(sessions.current_user(&session).await.unwrap().id, 3);
	}
}

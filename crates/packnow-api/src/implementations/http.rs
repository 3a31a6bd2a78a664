//! `reqwest` implementation of the API traits.
//!
//! One pooled client is shared by all calls. Every call carries the session's
//! bearer token where the endpoint requires one and is bounded by the
//! configured timeout; expiry surfaces as `ApiError::Timeout` like any other
//! failed request.

use crate::{ApiError, AuthInterface, EstimateInterface, OrderInterface};
use async_trait::async_trait;
use packnow_config::ApiConfig;
use packnow_types::{
	CreateOrderRequest, CreatedOrder, Credentials, EstimateRequest, MaterialEstimate, Order,
	OrderId, PriceBreakdown, RegisterRequest, SecretString, Session, TokenPair, UserProfile,
};
use reqwest::{header::AUTHORIZATION, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Pulls the human-readable explanation out of an error body.
///
/// The server answers errors with `{"detail": "..."}`, or with a list of
/// `{"msg": "..."}` entries when the request body failed validation.
pub fn extract_detail(body: &str) -> Option<String> {
	let value: serde_json::Value = serde_json::from_str(body).ok()?;
	match value.get("detail")? {
		serde_json::Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
		serde_json::Value::Array(items) => items
			.iter()
			.find_map(|item| item.get("msg").and_then(|m| m.as_str()))
			.map(str::to_string),
		_ => None,
	}
}

/// HTTP client for the PackNow API.
#[derive(Clone)]
pub struct HttpApi {
	client: reqwest::Client,
	base_url: String,
	timeout: Duration,
}

impl HttpApi {
	pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
		let client = reqwest::Client::builder()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(10)
			.timeout(timeout)
			.build()
			.map_err(|e| ApiError::Network(e.to_string()))?;

		Ok(Self {
			client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
			timeout,
		})
	}

	pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
		Self::new(config.base_url.trim(), config.timeout())
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	fn authorized(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
		request.header(AUTHORIZATION, session.authorization())
	}

	/// Sends the request and turns non-2xx responses into errors.
	async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
		let response = match tokio::time::timeout(self.timeout, request.send()).await {
			Err(_) => return Err(ApiError::Timeout(self.timeout)),
			Ok(Err(e)) if e.is_timeout() => return Err(ApiError::Timeout(self.timeout)),
			Ok(Err(e)) => return Err(ApiError::Network(e.to_string())),
			Ok(Ok(response)) => response,
		};

		let status = response.status();
		debug!(url = %response.url(), status = status.as_u16(), "API response");
		if status.is_success() {
			return Ok(response);
		}

		let body = response.text().await.unwrap_or_default();
		let detail = extract_detail(&body);
		if status == StatusCode::UNAUTHORIZED {
			Err(ApiError::Unauthorized { detail })
		} else {
			Err(ApiError::Status {
				status: status.as_u16(),
				detail,
			})
		}
	}

	async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
		let response = self.execute(request).await?;
		response.json::<T>().await.map_err(|e| {
			if e.is_timeout() {
				ApiError::Timeout(self.timeout)
			} else {
				ApiError::Decode(e.to_string())
			}
		})
	}
}

#[async_trait]
impl EstimateInterface for HttpApi {
	async fn estimate_materials(
		&self,
		session: &Session,
		request: &EstimateRequest,
	) -> Result<MaterialEstimate, ApiError> {
		let builder = self
			.client
			.post(self.url("/orders/estimate/materials"))
			.json(request);
		self.send(self.authorized(builder, session)).await
	}

	async fn estimate_price(
		&self,
		session: &Session,
		request: &EstimateRequest,
	) -> Result<PriceBreakdown, ApiError> {
		let builder = self
			.client
			.post(self.url("/orders/estimate/price"))
			.json(request);
		self.send(self.authorized(builder, session)).await
	}
}

#[async_trait]
impl OrderInterface for HttpApi {
	async fn create_order(
		&self,
		session: &Session,
		request: &CreateOrderRequest,
	) -> Result<CreatedOrder, ApiError> {
		let builder = self.client.post(self.url("/orders")).json(request);
		self.send(self.authorized(builder, session)).await
	}

	async fn get_order(&self, session: &Session, id: OrderId) -> Result<Order, ApiError> {
		let builder = self.client.get(self.url(&format!("/orders/{}", id)));
		self.send(self.authorized(builder, session)).await
	}

	async fn list_orders(&self, session: &Session) -> Result<Vec<Order>, ApiError> {
		let builder = self.client.get(self.url("/orders"));
		self.send(self.authorized(builder, session)).await
	}

	async fn cancel_order(&self, session: &Session, id: OrderId) -> Result<(), ApiError> {
		let builder = self.client.delete(self.url(&format!("/orders/{}", id)));
		self.execute(self.authorized(builder, session)).await?;
		Ok(())
	}
}

#[async_trait]
impl AuthInterface for HttpApi {
	async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, ApiError> {
		let builder = self
			.client
			.post(self.url("/auth/register/user"))
			.json(request);
		self.send(builder).await
	}

	async fn login(&self, credentials: &Credentials) -> Result<TokenPair, ApiError> {
		let builder = self.client.post(self.url("/auth/login/user")).json(credentials);
		self.send(builder).await
	}

	async fn refresh(&self, refresh_token: &SecretString) -> Result<TokenPair, ApiError> {
		let builder = refresh_token.with_exposed(|token| {
			self.client
				.post(self.url("/auth/refresh"))
				.query(&[("refresh_token", token)])
		});
		self.send(builder).await
	}

	async fn current_user(&self, session: &Session) -> Result<UserProfile, ApiError> {
		let builder = self.client.get(self.url("/users/me"));
		self.send(self.authorized(builder, session)).await
	}
}

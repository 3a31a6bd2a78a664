//! Client side of the PackNow HTTP API.
//!
//! The API is split along the three services the client talks to: estimates,
//! orders and authentication. Each is a trait so the workflow and session
//! logic can be exercised without a server; `implementations::http` provides
//! the real `reqwest` client.

use async_trait::async_trait;
use packnow_types::{
	CreateOrderRequest, CreatedOrder, Credentials, EstimateRequest, MaterialEstimate, Order,
	OrderId, PriceBreakdown, RegisterRequest, SecretString, Session, TokenPair, UserProfile,
};
use std::time::Duration;
use thiserror::Error;

pub mod implementations {
	pub mod http;
}

pub use implementations::http::{extract_detail, HttpApi};

/// Why a request did not produce a usable response.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
	/// Connection refused, DNS failure, reset, ...
	#[error("Network error: {0}")]
	Network(String),
	#[error("Request timed out after {}s", .0.as_secs())]
	Timeout(Duration),
	/// The bearer token was rejected or has expired.
	#[error("{}", unauthorized_message(.detail))]
	Unauthorized { detail: Option<String> },
	/// Any other non-2xx response.
	#[error("{}", status_message(*.status, .detail))]
	Status { status: u16, detail: Option<String> },
	/// A 2xx response whose body did not have the expected shape.
	#[error("Unexpected response: {0}")]
	Decode(String),
}

fn unauthorized_message(detail: &Option<String>) -> String {
	detail
		.clone()
		.unwrap_or_else(|| "Session expired, please log in again".to_string())
}

fn status_message(status: u16, detail: &Option<String>) -> String {
	detail
		.clone()
		.unwrap_or_else(|| format!("Request failed with status {}", status))
}

impl ApiError {
	/// Server-provided explanation, taken from the response body.
	pub fn detail(&self) -> Option<&str> {
		match self {
			ApiError::Unauthorized { detail } | ApiError::Status { detail, .. } => {
				detail.as_deref()
			},
			_ => None,
		}
	}

	/// Message to show the user: the server's explanation when there is one,
	/// otherwise `fallback`.
	pub fn user_message(&self, fallback: &str) -> String {
		self.detail().unwrap_or(fallback).to_string()
	}

	pub fn is_unauthorized(&self) -> bool {
		matches!(self, ApiError::Unauthorized { .. })
	}
}

/// Materials and price quotes for a prospective order.
#[async_trait]
pub trait EstimateInterface: Send + Sync {
	async fn estimate_materials(
		&self,
		session: &Session,
		request: &EstimateRequest,
	) -> Result<MaterialEstimate, ApiError>;

	async fn estimate_price(
		&self,
		session: &Session,
		request: &EstimateRequest,
	) -> Result<PriceBreakdown, ApiError>;
}

/// Orders of the authenticated user.
#[async_trait]
pub trait OrderInterface: Send + Sync {
	async fn create_order(
		&self,
		session: &Session,
		request: &CreateOrderRequest,
	) -> Result<CreatedOrder, ApiError>;

	async fn get_order(&self, session: &Session, id: OrderId) -> Result<Order, ApiError>;

	/// All orders of the user, newest first.
	async fn list_orders(&self, session: &Session) -> Result<Vec<Order>, ApiError>;

	async fn cancel_order(&self, session: &Session, id: OrderId) -> Result<(), ApiError>;
}

/// Account and token endpoints.
#[async_trait]
pub trait AuthInterface: Send + Sync {
	async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, ApiError>;

	async fn login(&self, credentials: &Credentials) -> Result<TokenPair, ApiError>;

	/// Exchanges a refresh token for a new token pair.
	async fn refresh(&self, refresh_token: &SecretString) -> Result<TokenPair, ApiError>;

	async fn current_user(&self, session: &Session) -> Result<UserProfile, ApiError>;
}

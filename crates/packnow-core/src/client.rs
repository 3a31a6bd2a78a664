//! Wiring of the configured services into one client.

use crate::monitoring::StatusTracker;
use crate::orders::OrderBook;
use crate::session::SessionManager;
use crate::workflow::{OrderDraft, OrderWorkflow};
use packnow_api::{AuthInterface, EstimateInterface, HttpApi, OrderInterface};
use packnow_config::Config;
use packnow_storage::{create_storage_service, StorageService};
use packnow_types::{Order, OrderId, Session};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while assembling the client.
#[derive(Debug, Error)]
pub enum ClientError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Entry point for everything the command line does.
pub struct PackNowClient {
	config: Config,
	estimates: Arc<dyn EstimateInterface>,
	orders: Arc<dyn OrderInterface>,
	sessions: SessionManager,
}

impl PackNowClient {
	/// Validates `config`, then builds the HTTP API client and the session
	/// store it names.
	pub fn from_config(config: Config) -> Result<Self, ClientError> {
		let session_config = config.session.primary_config().ok_or_else(|| {
			ClientError::MissingComponent(format!(
				"session storage '{}'",
				config.session.primary
			))
		})?;
		config
			.validate()
			.map_err(|e| ClientError::Config(e.to_string()))?;

		let storage = create_storage_service(
			&config.session.primary,
			&config.session.implementations,
		)
		.map_err(|e| ClientError::Config(e.to_string()))?;
		debug!(storage = %config.session.primary, config = ?session_config, "Session storage ready");

		let api = Arc::new(
			HttpApi::from_config(&config.api).map_err(|e| ClientError::Config(e.to_string()))?,
		);
		Ok(Self::with_services(
			config,
			api.clone(),
			api.clone(),
			api,
			Arc::new(storage),
		))
	}

	/// Assembles a client from already constructed services.
	pub fn with_services(
		config: Config,
		estimates: Arc<dyn EstimateInterface>,
		orders: Arc<dyn OrderInterface>,
		auth: Arc<dyn AuthInterface>,
		storage: Arc<StorageService>,
	) -> Self {
		Self {
			config,
			estimates,
			orders,
			sessions: SessionManager::new(auth, storage),
		}
	}

	pub fn sessions(&self) -> &SessionManager {
		&self.sessions
	}

	pub fn orders(&self) -> OrderBook {
		OrderBook::new(self.orders.clone())
	}

	/// An empty draft at the configured default pickup coordinates.
	pub fn new_draft(&self) -> OrderDraft {
		OrderDraft::new(self.config.order.default_lat, self.config.order.default_lng)
	}

	/// Starts the creation workflow for `draft`.
	pub fn workflow(&self, draft: OrderDraft) -> OrderWorkflow {
		OrderWorkflow::new(
			self.estimates.clone(),
			self.orders.clone(),
			draft,
			self.config.order.estimate_distance_km,
		)
	}

	/// Starts polling `order_id` at the configured interval. `known` is the
	/// copy of the order the caller already shows.
	pub fn track(&self, session: Session, order_id: OrderId, known: Option<Order>) -> StatusTracker {
		StatusTracker::start(
			self.orders.clone(),
			session,
			order_id,
			self.config.tracking.poll_interval(),
			known,
		)
	}
}

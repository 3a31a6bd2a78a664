//! Command handlers.
//!
//! Each handler prints its result to stdout. Failures bubble up as
//! `CliError` and are reported by `main`.

mod auth;
mod create;
mod orders;

pub use auth::{login, logout, register, whoami, RegisterArgs};
pub use create::{create_order, CreateArgs};
pub use orders::{cancel_order, list_orders, show_order, track_order};

use packnow_config::ConfigError;
use packnow_core::{ClientError, OrderError, SessionError, WorkflowError};
use packnow_types::ValidationError;
use thiserror::Error;

/// Errors reported to the user by the binary.
#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Client(#[from] ClientError),
	#[error(transparent)]
	Session(#[from] SessionError),
	#[error(transparent)]
	Workflow(#[from] WorkflowError),
	#[error(transparent)]
	Order(#[from] OrderError),
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error("Input error: {0}")]
	Io(#[from] std::io::Error),
}

/// Runs `$call` once more with a refreshed session when the access token
/// was rejected. `$session` must be a mutable binding used by `$call`.
///
/// If the refresh fails too, the stored session is discarded and the user
/// is told to log in again.
macro_rules! authorized {
	($client:expr, $session:ident, $call:expr) => {{
		match $call {
			Err(e) if e.is_unauthorized() => {
				tracing::debug!("Access token rejected, refreshing session");
				$session = $client.sessions().recover(&$session).await?;
				$call
			}
			other => other,
		}
	}};
}

pub(crate) use authorized;

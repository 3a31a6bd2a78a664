//! Order creation workflow.
//!
//! A workflow walks one draft through `Drafting -> Reviewing -> Submitted`.
//! While drafting, the draft is editable and nothing touches the network.
//! Requesting an estimate fires the materials and price quotes together and
//! only moves to `Reviewing` when both succeed; the draft is then frozen
//! until the user goes back. Confirming creates the order and ends the
//! workflow.

pub mod draft;

pub use draft::{OrderDraft, ValidatedDraft};

use once_cell::sync::Lazy;
use packnow_api::{ApiError, EstimateInterface, OrderInterface};
use packnow_types::{Estimate, OrderId, Session, ValidationError};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

const ESTIMATE_FALLBACK: &str = "Failed to get estimate";
const CREATE_FALLBACK: &str = "Failed to create order";

#[derive(Debug, Error)]
pub enum WorkflowError {
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// A request was sent and failed. `message` is what the user should see.
	#[error("{message}")]
	RequestFailure {
		message: String,
		#[source]
		source: ApiError,
	},
	#[error("Cannot {operation} while {phase}")]
	InvalidState {
		operation: &'static str,
		phase: Phase,
	},
	#[error("The draft cannot be edited while an estimate is being reviewed")]
	DraftFrozen,
}

impl WorkflowError {
	fn request(source: ApiError, fallback: &str) -> Self {
		WorkflowError::RequestFailure {
			message: source.user_message(fallback),
			source,
		}
	}

	/// True when the failure was a rejected or expired credential.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, WorkflowError::RequestFailure { source, .. } if source.is_unauthorized())
	}
}

/// Coarse position of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
	Drafting,
	Reviewing,
	Submitted,
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Phase::Drafting => "drafting",
			Phase::Reviewing => "reviewing",
			Phase::Submitted => "submitted",
		})
	}
}

static TRANSITIONS: Lazy<HashMap<Phase, HashSet<Phase>>> = Lazy::new(|| {
	HashMap::from([
		(Phase::Drafting, HashSet::from([Phase::Reviewing])),
		// Re-quoting the frozen draft stays in Reviewing.
		(
			Phase::Reviewing,
			HashSet::from([Phase::Reviewing, Phase::Drafting, Phase::Submitted]),
		),
		(Phase::Submitted, HashSet::new()),
	])
});

impl Phase {
	pub fn can_transition_to(&self, to: Phase) -> bool {
		TRANSITIONS.get(self).is_some_and(|next| next.contains(&to))
	}
}

/// Full workflow state.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
	Drafting,
	Reviewing {
		estimate: Estimate,
		/// Parameters that produced `estimate`.
		request: ValidatedDraft,
	},
	Submitted {
		order_id: OrderId,
	},
}

impl WorkflowState {
	pub fn phase(&self) -> Phase {
		match self {
			WorkflowState::Drafting => Phase::Drafting,
			WorkflowState::Reviewing { .. } => Phase::Reviewing,
			WorkflowState::Submitted { .. } => Phase::Submitted,
		}
	}
}

/// Drives one draft from editing to a created order.
pub struct OrderWorkflow {
	estimates: Arc<dyn EstimateInterface>,
	orders: Arc<dyn OrderInterface>,
	distance_km: f64,
	draft: OrderDraft,
	state: WorkflowState,
}

impl OrderWorkflow {
	/// Starts in `Drafting`. `distance_km` is sent with every estimate.
	pub fn new(
		estimates: Arc<dyn EstimateInterface>,
		orders: Arc<dyn OrderInterface>,
		draft: OrderDraft,
		distance_km: f64,
	) -> Self {
		Self {
			estimates,
			orders,
			distance_km,
			draft,
			state: WorkflowState::Drafting,
		}
	}

	pub fn state(&self) -> &WorkflowState {
		&self.state
	}

	pub fn phase(&self) -> Phase {
		self.state.phase()
	}

	pub fn draft(&self) -> &OrderDraft {
		&self.draft
	}

	/// Mutable access to the draft. Only granted while drafting.
	pub fn draft_mut(&mut self) -> Result<&mut OrderDraft, WorkflowError> {
		match self.state {
			WorkflowState::Drafting => Ok(&mut self.draft),
			_ => Err(WorkflowError::DraftFrozen),
		}
	}

	pub fn estimate(&self) -> Option<&Estimate> {
		match &self.state {
			WorkflowState::Reviewing { estimate, .. } => Some(estimate),
			_ => None,
		}
	}

	pub fn order_id(&self) -> Option<OrderId> {
		match self.state {
			WorkflowState::Submitted { order_id } => Some(order_id),
			_ => None,
		}
	}

	fn transition(&mut self, next: WorkflowState) {
		let from = self.phase();
		let to = next.phase();
		if !from.can_transition_to(to) {
			// Callers check the phase first; reaching this is a bug.
			warn!(%from, %to, "Rejected workflow transition");
			return;
		}
		info!(%from, %to, "Order workflow transition");
		self.state = next;
	}

	/// Validates the draft and quotes it.
	///
	/// Both quotes are requested concurrently. The workflow moves to
	/// `Reviewing` only when both succeed; otherwise state and any previous
	/// estimate are left exactly as they were and the first failure is
	/// returned.
	pub async fn request_estimate(&mut self, session: &Session) -> Result<&Estimate, WorkflowError> {
		let phase = self.phase();
		if phase == Phase::Submitted {
			return Err(WorkflowError::InvalidState {
				operation: "request an estimate",
				phase,
			});
		}

		let validated = self.draft.validate()?;
		let request = validated.estimate_request(self.distance_km);
		debug!(category = %request.category, "Requesting estimate");

		let (materials, pricing) = tokio::try_join!(
			self.estimates.estimate_materials(session, &request),
			self.estimates.estimate_price(session, &request),
		)
		.map_err(|e| {
			warn!(error = %e, "Estimate request failed");
			WorkflowError::request(e, ESTIMATE_FALLBACK)
		})?;

		let estimate = Estimate::new(materials, pricing);
		info!(final_price = estimate.final_price(), "Estimate received");
		self.transition(WorkflowState::Reviewing {
			estimate,
			request: validated,
		});

		self.estimate().ok_or(WorkflowError::InvalidState {
			operation: "request an estimate",
			phase,
		})
	}

	/// Creates the order from the reviewed draft.
	///
	/// On failure the workflow stays in `Reviewing` with its estimate so the
	/// user can retry.
	pub async fn confirm_order(&mut self, session: &Session) -> Result<OrderId, WorkflowError> {
		let request = match &self.state {
			WorkflowState::Reviewing { request, .. } => request.create_request(),
			other => {
				return Err(WorkflowError::InvalidState {
					operation: "confirm the order",
					phase: other.phase(),
				})
			},
		};

		let created = self
			.orders
			.create_order(session, &request)
			.await
			.map_err(|e| {
				warn!(error = %e, "Order creation failed");
				WorkflowError::request(e, CREATE_FALLBACK)
			})?;

		info!(order_id = %created.id, "Order created");
		self.transition(WorkflowState::Submitted {
			order_id: created.id,
		});
		Ok(created.id)
	}

	/// Discards the estimate and unfreezes the draft.
	pub fn return_to_drafting(&mut self) -> Result<(), WorkflowError> {
		let phase = self.phase();
		if phase != Phase::Reviewing {
			return Err(WorkflowError::InvalidState {
				operation: "return to drafting",
				phase,
			});
		}
		self.transition(WorkflowState::Drafting);
		Ok(())
	}
}

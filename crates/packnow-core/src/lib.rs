//! Client-side logic of PackNow.
//!
//! Ties the API, configuration and storage crates together: the order
//! creation workflow, the session lifecycle, order history and the
//! background status tracker. `PackNowClient` builds all of them from a
//! `Config`.

pub mod client;
pub mod monitoring;
pub mod orders;
pub mod session;
pub mod workflow;

pub use client::{ClientError, PackNowClient};
pub use monitoring::StatusTracker;
pub use orders::{OrderBook, OrderError};
pub use session::{Registration, SessionError, SessionManager};
pub use workflow::{OrderDraft, OrderWorkflow, Phase, ValidatedDraft, WorkflowError, WorkflowState};

//! Background polling of order status.

pub mod status;

pub use status::StatusTracker;

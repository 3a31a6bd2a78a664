//! Common types module for the PackNow client.
//!
//! This module defines the core data types shared by every PackNow crate:
//! packaging categories and dimensions, estimate snapshots, server-side orders
//! and their status progression, authentication payloads and the explicit
//! `Session` credential that accompanies every outbound request.

/// Authentication payloads and the bearer session.
pub mod auth;
/// Estimate snapshots returned by the estimate endpoints.
pub mod estimate;
/// Order parameters, server-side orders and the status progression.
pub mod order;
/// Self-registration of pluggable implementations.
pub mod registry;
/// Configuration schema validation for implementation-specific TOML tables.
pub mod schema;
/// Redacting string wrapper for tokens and passwords.
pub mod secret_string;
/// Storage namespaces.
pub mod storage;
/// Display helpers for prices, distances and dates.
pub mod utils;
/// Client-side validation of user input.
pub mod validation;

// Re-export all types for convenient access
pub use auth::*;
pub use estimate::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use schema::*;
pub use secret_string::SecretString;
pub use storage::*;
pub use utils::{
	format_currency, format_date, format_distance, format_material_name, format_quantity,
};
pub use validation::*;

//! Builders for assembling configurations in tests.

pub mod config;

pub use config::ConfigBuilder;

//! Registry trait for pluggable backends.
//!
//! Session storage backends are selected by name from configuration. Every
//! backend module exposes a `Registry` struct implementing this trait so the
//! name it answers to and the factory that builds it live next to each other.

/// Binds a configuration name to a factory function.
pub trait ImplementationRegistry {
	/// Key under `[<section>.implementations]` that selects this backend,
	/// e.g. "file" for `session.implementations.file`.
	const NAME: &'static str;

	/// Factory function type defined by the owning module.
	type Factory;

	/// Returns the factory for this backend.
	fn factory() -> Self::Factory;
}

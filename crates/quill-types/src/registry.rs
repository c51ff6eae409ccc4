//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Each backend module (storage, roles, reference data, payment) exposes a
/// `Registry` type implementing this trait so the service binary can wire
/// backends by the name used in configuration, for example `memory` for
/// `[storage.implementations.memory]`.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Returns the factory that builds this implementation from its config table.
	fn factory() -> Self::Factory;
}

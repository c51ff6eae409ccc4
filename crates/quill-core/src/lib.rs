//! Order lifecycle engine for the Quill marketplace.
//!
//! The engine enforces the order workflow:
//!
//! ```text
//! pending_payment -> paid -> awaiting_writer_acceptance -> assigned
//!        -> submitted_for_review -> approved -> completed
//!                              \-> feedback -> awaiting_writer_acceptance ...
//! ```
//!
//! Every mutating operation checks the caller's role up front and then
//! performs exactly one conditional write whose filter carries the full
//! precondition (status, ownership, counters). The engine keeps no mutable
//! state of its own; concurrent callers are arbitrated by the order store.

use thiserror::Error;

pub mod builder;
pub mod engine;
pub mod transitions;

pub use builder::{BuilderError, LifecycleBuilder, LifecycleFactories};
pub use engine::OrderLifecycle;
pub use transitions::Operation;

/// Errors returned by lifecycle operations.
///
/// All kinds except [`DependencyFailure`](Self::DependencyFailure) are
/// business-rule outcomes and final for that attempt.
#[derive(Debug, Error)]
pub enum LifecycleError {
	/// The order does not exist, is not in the expected state, or is not
	/// owned by the caller. The three cases are reported identically.
	#[error("order not found or not in expected state")]
	NotFoundOrInvalidState,
	/// The caller lacks the role required for the operation.
	#[error("not authorized: {0}")]
	NotAuthorized(String),
	/// The assignment target does not hold the writer role.
	#[error("writer not found")]
	WriterNotFound,
	/// The order has used up its feedback rounds.
	#[error("feedback request limit of {limit} reached")]
	LimitExceeded { limit: u32 },
	/// The request payload failed validation.
	#[error("invalid input: {0}")]
	InvalidInput(String),
	/// The payment gateway refused the charge.
	#[error("payment declined: {0}")]
	PaymentDeclined(String),
	/// A store, role or payment call failed or timed out.
	#[error("dependency failure: {0}")]
	DependencyFailure(String),
}

impl LifecycleError {
	/// Whether the caller may retry the same request unchanged.
	pub fn is_retryable(&self) -> bool {
		matches!(self, LifecycleError::DependencyFailure(_))
	}
}

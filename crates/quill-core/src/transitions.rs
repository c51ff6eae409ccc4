//! Order status transition table.
//!
//! Each mutating [`Operation`] names the statuses it may start from and the
//! status it leaves the order in. The engine turns the source set into the
//! filter of its conditional write, so the table below is the single place
//! the workflow is defined.

use quill_types::OrderStatus;
use std::fmt;

/// A mutating lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
	ConfirmPayment,
	AssignWriter,
	AcceptAssignment,
	DeclineAssignment,
	SubmitWork,
	Approve,
	RequestFeedback,
	Complete,
}

impl Operation {
	/// Statuses the operation may be applied in.
	pub fn sources(&self) -> &'static [OrderStatus] {
		use OrderStatus::*;

		match self {
			Operation::ConfirmPayment => &[PendingPayment],
			Operation::AssignWriter => &[Paid, Feedback],
			Operation::AcceptAssignment | Operation::DeclineAssignment => {
				&[AwaitingWriterAcceptance]
			},
			Operation::SubmitWork => &[Assigned],
			Operation::Approve | Operation::RequestFeedback => &[SubmittedForReview],
			Operation::Complete => &[Approved],
		}
	}

	/// Status the order is in after the operation succeeds.
	pub fn target(&self) -> OrderStatus {
		match self {
			Operation::ConfirmPayment => OrderStatus::Paid,
			Operation::AssignWriter => OrderStatus::AwaitingWriterAcceptance,
			Operation::AcceptAssignment => OrderStatus::Assigned,
			Operation::DeclineAssignment => OrderStatus::Paid,
			Operation::SubmitWork => OrderStatus::SubmittedForReview,
			Operation::Approve => OrderStatus::Approved,
			Operation::RequestFeedback => OrderStatus::Feedback,
			Operation::Complete => OrderStatus::Completed,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Operation::ConfirmPayment => "confirm_payment",
			Operation::AssignWriter => "assign_writer",
			Operation::AcceptAssignment => "accept_assignment",
			Operation::DeclineAssignment => "decline_assignment",
			Operation::SubmitWork => "submit_work",
			Operation::Approve => "approve",
			Operation::RequestFeedback => "request_feedback",
			Operation::Complete => "complete",
		}
	}
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

//! Order documents and the workflow status enumeration.
//!
//! An order is placed by a customer, paid for, assigned to a writer who
//! accepts or declines, worked on, submitted, and finally approved or sent
//! back with feedback. Everything the lifecycle engine needs to enforce that
//! workflow lives on the [`Order`] document itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{OrderId, ReferenceId, UserId};

/// Status of an order in the marketplace workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	/// Order has been placed and is waiting for payment.
	PendingPayment,
	/// Payment has been confirmed; the order can be assigned.
	Paid,
	/// A writer has been assigned and has not yet responded.
	AwaitingWriterAcceptance,
	/// The assigned writer accepted and is working on the order.
	Assigned,
	/// Work has been submitted and awaits the customer's review.
	SubmittedForReview,
	/// The customer approved the submitted work.
	Approved,
	/// The customer requested changes; the order can be reassigned.
	Feedback,
	/// The order has been closed out.
	Completed,
}

impl OrderStatus {
	/// All statuses in workflow order.
	pub const ALL: [OrderStatus; 8] = [
		OrderStatus::PendingPayment,
		OrderStatus::Paid,
		OrderStatus::AwaitingWriterAcceptance,
		OrderStatus::Assigned,
		OrderStatus::SubmittedForReview,
		OrderStatus::Approved,
		OrderStatus::Feedback,
		OrderStatus::Completed,
	];

	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::PendingPayment => "pending_payment",
			OrderStatus::Paid => "paid",
			OrderStatus::AwaitingWriterAcceptance => "awaiting_writer_acceptance",
			OrderStatus::Assigned => "assigned",
			OrderStatus::SubmittedForReview => "submitted_for_review",
			OrderStatus::Approved => "approved",
			OrderStatus::Feedback => "feedback",
			OrderStatus::Completed => "completed",
		}
	}

	/// Whether an order in this status may carry a writer.
	pub fn allows_writer(&self) -> bool {
		match self {
			OrderStatus::PendingPayment | OrderStatus::Paid => false,
			OrderStatus::AwaitingWriterAcceptance
			| OrderStatus::Assigned
			| OrderStatus::SubmittedForReview
			| OrderStatus::Approved
			| OrderStatus::Feedback
			| OrderStatus::Completed => true,
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
	type Err = UnknownStatus;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		OrderStatus::ALL
			.into_iter()
			.find(|status| status.as_str() == s)
			.ok_or_else(|| UnknownStatus(s.to_string()))
	}
}

/// Foreign references into the reference data tables.
///
/// All six are required when an order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
	pub order_type_id: ReferenceId,
	pub level_id: ReferenceId,
	pub pages_id: ReferenceId,
	pub urgency_id: ReferenceId,
	pub style_id: ReferenceId,
	pub language_id: ReferenceId,
}

impl Classification {
	/// Returns the name of the first blank reference, if any.
	pub fn first_missing(&self) -> Option<&'static str> {
		[
			("order_type_id", &self.order_type_id),
			("level_id", &self.level_id),
			("pages_id", &self.pages_id),
			("urgency_id", &self.urgency_id),
			("style_id", &self.style_id),
			("language_id", &self.language_id),
		]
		.into_iter()
		.find(|(_, id)| id.is_blank())
		.map(|(name, _)| name)
	}
}

/// Optional extras a customer can purchase with an order.
///
/// The lifecycle engine never looks at these; they are stored and returned
/// exactly as provided.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddOns {
	pub is_high_priority: bool,
	pub top_writer: bool,
	pub plagiarism_report: bool,
	pub one_page_summary: bool,
	pub extra_quality_check: bool,
	pub initial_draft: bool,
	pub sms_update: bool,
	pub full_text_copy_sources: bool,
	pub same_paper_from_another_writer: bool,
	pub sources_count: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub preferred_writer_number: Option<u32>,
}

/// Payload used to place a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
	pub title: String,
	#[serde(default)]
	pub description: String,
	pub price: Decimal,
	#[serde(flatten)]
	pub classification: Classification,
	#[serde(flatten, default)]
	pub add_ons: AddOns,
}

/// An order document as persisted by the order store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: OrderId,
	/// The customer who placed the order. Never changes.
	pub customer_id: UserId,
	/// The writer currently attached to the order, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub writer_id: Option<UserId>,
	pub title: String,
	#[serde(default)]
	pub description: String,
	pub price: Decimal,
	#[serde(flatten)]
	pub classification: Classification,
	#[serde(flatten)]
	pub add_ons: AddOns,
	/// Current workflow status.
	pub status: OrderStatus,
	/// Work submitted by the writer.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
	/// Latest feedback text from the customer.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub feedback: Option<String>,
	/// Number of feedback rounds requested so far.
	#[serde(default)]
	pub feedback_request_count: u32,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub paid_at: Option<DateTime<Utc>>,
	/// Token of the payment confirmation currently charging this order.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment_claim: Option<String>,
	/// Gateway reference of the captured charge.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment_reference: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub assignment_date: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub assignment_acceptance_date: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub assignment_decline_date: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub submission_date: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub approval_date: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub feedback_date: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub completion_date: Option<DateTime<Utc>>,
}

impl Order {
	/// Builds a freshly placed order owned by `customer_id`.
	pub fn place(id: OrderId, customer_id: UserId, new: NewOrder, now: DateTime<Utc>) -> Self {
		Self {
			id,
			customer_id,
			writer_id: None,
			title: new.title,
			description: new.description,
			price: new.price,
			classification: new.classification,
			add_ons: new.add_ons,
			status: OrderStatus::PendingPayment,
			content: None,
			feedback: None,
			feedback_request_count: 0,
			created_at: now,
			updated_at: now,
			paid_at: None,
			payment_claim: None,
			payment_reference: None,
			assignment_date: None,
			assignment_acceptance_date: None,
			assignment_decline_date: None,
			submission_date: None,
			approval_date: None,
			feedback_date: None,
			completion_date: None,
		}
	}

	/// Checks the writer/status invariant.
	pub fn writer_consistent(&self) -> bool {
		self.writer_id.is_none() || self.status.allows_writer()
	}
}

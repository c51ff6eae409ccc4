//! Mutating lifecycle operations.
//!
//! Each operation follows the same shape: check the caller's role, validate
//! the payload, then issue one conditional update whose filter holds the
//! whole precondition. Zero matches is always a failure.

use super::{require_role, require_role_manager, require_staff, require_text, OrderLifecycle};
use crate::{LifecycleError, Operation};
use chrono::Utc;
use quill_storage::{UpdateFilter, UpdateResult};
use quill_types::{
	truncate_id, Actor, NewOrder, Order, OrderId, PaymentReceipt, PaymentRequest, Role, UserId,
};
use tracing::instrument;
use uuid::Uuid;

impl OrderLifecycle {
	/// Runs the conditional update for `op`, mapping zero matches to
	/// [`LifecycleError::NotFoundOrInvalidState`].
	async fn transition<F>(
		&self,
		op: Operation,
		order_id: &OrderId,
		filter: UpdateFilter,
		mutation: F,
	) -> Result<Order, LifecycleError>
	where
		F: Fn(&mut Order),
	{
		let target = op.target();
		let UpdateResult {
			matched_count,
			order,
		} = self
			.bounded(
				"order update",
				self.orders.conditional_update(order_id, &filter, |order| {
					mutation(order);
					order.status = target;
				}),
			)
			.await?;

		match order {
			Some(order) if matched_count > 0 => {
				tracing::info!(operation = %op, status = %order.status, "Order transitioned");
				Ok(order)
			},
			_ => {
				tracing::debug!(operation = %op, "Precondition not met");
				Err(LifecycleError::NotFoundOrInvalidState)
			},
		}
	}

	/// Places a new order for the calling customer in `pending_payment`.
	#[instrument(skip_all, fields(actor = %actor.id))]
	pub async fn create_order(&self, actor: &Actor, new: NewOrder) -> Result<Order, LifecycleError> {
		require_role(actor, Role::Customer)?;
		require_text("title", &new.title)?;
		if let Some(field) = new.classification.first_missing() {
			return Err(LifecycleError::InvalidInput(format!("{} is required", field)));
		}
		if new.price.is_sign_negative() {
			return Err(LifecycleError::InvalidInput(
				"price must not be negative".into(),
			));
		}

		let order = Order::place(OrderId::generate(), actor.id.clone(), new, Utc::now());
		self.bounded("order insert", self.orders.insert(&order))
			.await?;

		tracing::info!(order_id = %truncate_id(order.id.as_str()), "Order placed");
		Ok(order)
	}

	/// Charges the order price and moves the order to `paid`.
	///
	/// Only the owning customer may pay. The order is first claimed with a
	/// conditional write, so only one confirmation at a time reaches the
	/// gateway. A declined charge releases the claim. A charge with an
	/// unknown outcome keeps it, leaving the order blocked until reconciled.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id.as_str()), actor = %actor.id))]
	pub async fn confirm_payment(
		&self,
		actor: &Actor,
		order_id: &OrderId,
		request: &PaymentRequest,
	) -> Result<(Order, PaymentReceipt), LifecycleError> {
		require_role(actor, Role::Customer)?;

		let op = Operation::ConfirmPayment;
		let owned = UpdateFilter::status_in(op.sources()).customer(&actor.id);
		let token = Uuid::new_v4().to_string();

		let claimed = self
			.bounded(
				"payment claim",
				self.orders
					.conditional_update(order_id, &owned.clone().unclaimed(), |order| {
						order.payment_claim = Some(token.clone());
					}),
			)
			.await?
			.order
			.ok_or(LifecycleError::NotFoundOrInvalidState)?;

		let receipt = match self.charge(order_id, claimed.price, request).await {
			Ok(receipt) => receipt,
			Err(LifecycleError::PaymentDeclined(reason)) => {
				self.release_claim(order_id, &owned, &token).await;
				return Err(LifecycleError::PaymentDeclined(reason));
			},
			Err(e) => {
				tracing::error!(error = %e, "Payment outcome unknown, order stays claimed");
				return Err(e);
			},
		};

		let now = Utc::now();
		let paid = self
			.transition(op, order_id, owned.claimed_by(&token), |order| {
				order.paid_at = Some(now);
				order.payment_claim = None;
				order.payment_reference = Some(receipt.reference.clone());
			})
			.await
			.inspect_err(|_| {
				tracing::error!(
					reference = %receipt.reference,
					"Payment captured but the claimed order could not be marked paid"
				);
			})?;

		Ok((paid, receipt))
	}

	/// Drops the claim taken with `token` after a declined charge.
	///
	/// A failure here leaves the claim in place; the decline is still what
	/// the customer is told.
	async fn release_claim(&self, order_id: &OrderId, owned: &UpdateFilter, token: &str) {
		let filter = owned.clone().claimed_by(token);
		let released = self
			.bounded(
				"payment claim release",
				self.orders.conditional_update(order_id, &filter, |order| {
					order.payment_claim = None;
				}),
			)
			.await;

		match released {
			Ok(result) if result.matched_count > 0 => {
				tracing::debug!("Released payment claim after decline");
			},
			Ok(_) => tracing::warn!("Payment claim was already gone"),
			Err(e) => tracing::error!(error = %e, "Failed to release payment claim"),
		}
	}

	/// Offers the order to `writer_id`.
	///
	/// Legal from `paid` and `feedback`. The target's writer role is checked
	/// on every call rather than trusted from an earlier listing.
	///
	/// Reassigning a `feedback` order only replaces the writer and the
	/// assignment date. The previous cycle's content, submission, acceptance
	/// and feedback fields are kept as history until overwritten.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id.as_str()), actor = %actor.id, writer = %writer_id))]
	pub async fn assign_writer(
		&self,
		actor: &Actor,
		order_id: &OrderId,
		writer_id: &UserId,
	) -> Result<Order, LifecycleError> {
		require_staff(actor)?;
		if writer_id.is_blank() {
			return Err(LifecycleError::InvalidInput("writer_id is required".into()));
		}

		if !self.holds_role(writer_id, Role::Writer).await? {
			tracing::info!("Assignment target does not hold the writer role");
			return Err(LifecycleError::WriterNotFound);
		}

		let op = Operation::AssignWriter;
		let now = Utc::now();
		self.transition(op, order_id, UpdateFilter::status_in(op.sources()), |order| {
			order.writer_id = Some(writer_id.clone());
			order.assignment_date = Some(now);
		})
		.await
	}

	/// Records the assigned writer's answer to an assignment offer.
	///
	/// Accepting starts the work. Declining returns the order to `paid`
	/// without a writer so it can be offered again.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id.as_str()), actor = %actor.id, accept = accept))]
	pub async fn respond_to_assignment(
		&self,
		actor: &Actor,
		order_id: &OrderId,
		accept: bool,
	) -> Result<Order, LifecycleError> {
		require_role(actor, Role::Writer)?;

		let now = Utc::now();
		if accept {
			let op = Operation::AcceptAssignment;
			let filter = UpdateFilter::status_in(op.sources()).writer(&actor.id);
			self.transition(op, order_id, filter, |order| {
				order.assignment_acceptance_date = Some(now);
			})
			.await
		} else {
			let op = Operation::DeclineAssignment;
			let filter = UpdateFilter::status_in(op.sources()).writer(&actor.id);
			self.transition(op, order_id, filter, |order| {
				order.writer_id = None;
				order.assignment_date = None;
				order.assignment_decline_date = Some(now);
			})
			.await
		}
	}

	/// Hands in the writer's work for customer review.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id.as_str()), actor = %actor.id))]
	pub async fn submit_work(
		&self,
		actor: &Actor,
		order_id: &OrderId,
		content: &str,
	) -> Result<Order, LifecycleError> {
		require_role(actor, Role::Writer)?;
		require_text("content", content)?;

		let op = Operation::SubmitWork;
		let filter = UpdateFilter::status_in(op.sources()).writer(&actor.id);
		let now = Utc::now();
		self.transition(op, order_id, filter, |order| {
			order.content = Some(content.to_string());
			order.submission_date = Some(now);
		})
		.await
	}

	/// Accepts the submitted work on behalf of the owning customer.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id.as_str()), actor = %actor.id))]
	pub async fn approve_order(&self, actor: &Actor, order_id: &OrderId) -> Result<Order, LifecycleError> {
		require_role(actor, Role::Customer)?;

		let op = Operation::Approve;
		let filter = UpdateFilter::status_in(op.sources()).customer(&actor.id);
		let now = Utc::now();
		self.transition(op, order_id, filter, |order| {
			order.approval_date = Some(now);
		})
		.await
	}

	/// Sends submitted work back with feedback.
	///
	/// The feedback bound is part of the write filter, so two concurrent
	/// requests can never push the counter past the limit. When the write
	/// matches nothing, the owner is told whether the limit was the cause.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id.as_str()), actor = %actor.id))]
	pub async fn request_feedback(
		&self,
		actor: &Actor,
		order_id: &OrderId,
		feedback: &str,
	) -> Result<Order, LifecycleError> {
		require_role(actor, Role::Customer)?;
		require_text("feedback", feedback)?;

		let op = Operation::RequestFeedback;
		let limit = self.settings.feedback_request_limit;
		let owned = UpdateFilter::status_in(op.sources()).customer(&actor.id);
		let filter = owned.clone().feedback_requests_below(limit);
		let now = Utc::now();

		let result = self
			.transition(op, order_id, filter, |order| {
				order.feedback = Some(feedback.to_string());
				order.feedback_date = Some(now);
				order.feedback_request_count += 1;
			})
			.await;

		match result {
			Err(LifecycleError::NotFoundOrInvalidState) => {
				// Only the owner of a reviewable order learns about the limit.
				let current = self
					.bounded("order lookup", self.orders.find_by_id(order_id))
					.await?;
				match current {
					Some(order) if owned.matches(&order) && order.feedback_request_count >= limit => {
						Err(LifecycleError::LimitExceeded { limit })
					},
					_ => Err(LifecycleError::NotFoundOrInvalidState),
				}
			},
			other => other,
		}
	}

	/// Closes out an approved order.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id.as_str()), actor = %actor.id))]
	pub async fn complete_order(&self, actor: &Actor, order_id: &OrderId) -> Result<Order, LifecycleError> {
		require_staff(actor)?;

		let op = Operation::Complete;
		let now = Utc::now();
		self.transition(op, order_id, UpdateFilter::status_in(op.sources()), |order| {
			order.completion_date = Some(now);
		})
		.await
	}

	/// Associates `role` with `user_id`. Granting a held role succeeds.
	#[instrument(skip_all, fields(actor = %actor.id, user = %user_id, role = %role))]
	pub async fn grant_role(&self, actor: &Actor, user_id: &UserId, role: Role) -> Result<(), LifecycleError> {
		require_role_manager(actor, role)?;
		if user_id.is_blank() {
			return Err(LifecycleError::InvalidInput("user_id is required".into()));
		}
		self.bounded("role grant", self.roles.grant(user_id, role))
			.await
	}

	/// Removes `role` from `user_id`.
	///
	/// Orders already assigned to a writer who loses the role stay assigned;
	/// only new assignments check the role.
	#[instrument(skip_all, fields(actor = %actor.id, user = %user_id, role = %role))]
	pub async fn revoke_role(&self, actor: &Actor, user_id: &UserId, role: Role) -> Result<(), LifecycleError> {
		require_role_manager(actor, role)?;
		if user_id.is_blank() {
			return Err(LifecycleError::InvalidInput("user_id is required".into()));
		}
		self.bounded("role revoke", self.roles.revoke(user_id, role))
			.await
	}
}

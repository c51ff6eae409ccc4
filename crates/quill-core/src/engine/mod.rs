//! The order lifecycle engine.
//!
//! [`OrderLifecycle`] owns the collaborator services and exposes one method
//! per marketplace action. Mutations live in `commands`, read paths in
//! `queries`.

mod commands;
mod queries;


use crate::LifecycleError;
use quill_config::EngineConfig;
use quill_payment::{PaymentError, PaymentService};
use quill_reference::ReferenceService;
use quill_roles::RoleService;
use quill_storage::OrderStore;
use quill_types::{Actor, OrderId, PaymentReceipt, PaymentRequest, Role, UserId};
use rust_decimal::Decimal;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Coordinates order state changes across the store, the role resolver,
/// the payment gateway and reference enrichment.
pub struct OrderLifecycle {
	orders: OrderStore,
	roles: RoleService,
	reference: ReferenceService,
	payment: PaymentService,
	settings: EngineConfig,
}

impl OrderLifecycle {
	pub fn new(
		orders: OrderStore,
		roles: RoleService,
		reference: ReferenceService,
		payment: PaymentService,
		settings: EngineConfig,
	) -> Self {
		Self {
			orders,
			roles,
			reference,
			payment,
			settings,
		}
	}

	pub fn settings(&self) -> &EngineConfig {
		&self.settings
	}

	fn call_timeout(&self) -> Duration {
		self.settings.call_timeout()
	}

	/// Runs a collaborator call under the configured timeout.
	///
	/// Both an error from the call and running out of time surface as
	/// [`LifecycleError::DependencyFailure`].
	async fn bounded<T, E, F>(&self, call: &'static str, fut: F) -> Result<T, LifecycleError>
	where
		E: Display,
		F: Future<Output = Result<T, E>>,
	{
		match tokio::time::timeout(self.call_timeout(), fut).await {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(e)) => {
				tracing::warn!(call, error = %e, "Dependency call failed");
				Err(LifecycleError::DependencyFailure(format!(
					"{} failed: {}",
					call, e
				)))
			},
			Err(_) => {
				tracing::warn!(call, timeout_ms = self.settings.call_timeout_ms, "Dependency call timed out");
				Err(LifecycleError::DependencyFailure(format!(
					"{} timed out after {}ms",
					call, self.settings.call_timeout_ms
				)))
			},
		}
	}

	/// Checks the role resolver, distinguishing an absent role from a
	/// failed check.
	async fn holds_role(&self, user: &UserId, role: Role) -> Result<bool, LifecycleError> {
		self.bounded("role lookup", self.roles.has_role(user, role))
			.await
	}

	async fn charge(
		&self,
		order_id: &OrderId,
		amount: Decimal,
		request: &PaymentRequest,
	) -> Result<PaymentReceipt, LifecycleError> {
		match tokio::time::timeout(
			self.call_timeout(),
			self.payment.charge(order_id, amount, request),
		)
		.await
		{
			Ok(Ok(receipt)) => Ok(receipt),
			Ok(Err(PaymentError::Declined(reason))) => Err(LifecycleError::PaymentDeclined(reason)),
			Ok(Err(e)) => Err(LifecycleError::DependencyFailure(e.to_string())),
			Err(_) => Err(LifecycleError::DependencyFailure(format!(
				"payment timed out after {}ms",
				self.settings.call_timeout_ms
			))),
		}
	}
}

fn require_role(actor: &Actor, role: Role) -> Result<(), LifecycleError> {
	if actor.has_role(role) {
		Ok(())
	} else {
		Err(LifecycleError::NotAuthorized(format!(
			"{} role required",
			role
		)))
	}
}

fn require_staff(actor: &Actor) -> Result<(), LifecycleError> {
	if actor.is_staff() {
		Ok(())
	} else {
		Err(LifecycleError::NotAuthorized("staff role required".into()))
	}
}

/// Staff manage customer and writer roles; staff roles need a super admin.
fn require_role_manager(actor: &Actor, role: Role) -> Result<(), LifecycleError> {
	require_staff(actor)?;
	if matches!(role, Role::Admin | Role::SuperAdmin) && !actor.has_role(Role::SuperAdmin) {
		return Err(LifecycleError::NotAuthorized(format!(
			"super_admin role required to manage {}",
			role
		)));
	}
	Ok(())
}

fn require_text(field: &str, value: &str) -> Result<(), LifecycleError> {
	if value.trim().is_empty() {
		Err(LifecycleError::InvalidInput(format!("{} is required", field)))
	} else {
		Ok(())
	}
}

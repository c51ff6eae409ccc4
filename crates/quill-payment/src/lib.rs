//! Payment gateway abstraction.
//!
//! Confirming payment is the only transition out of `pending_payment`. The
//! gateway charges the order price using the method the customer chose and
//! either returns a receipt or declines.

use async_trait::async_trait;
use quill_types::{ConfigSchema, ImplementationRegistry, OrderId, PaymentReceipt, PaymentRequest};
use rust_decimal::Decimal;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod mock;
}

/// Errors that can occur while charging an order.
#[derive(Debug, Error)]
pub enum PaymentError {
	/// The gateway refused the charge.
	#[error("Payment declined: {0}")]
	Declined(String),
	/// The gateway could not be reached or answered unexpectedly.
	#[error("Payment gateway error: {0}")]
	Gateway(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for payment gateways.
#[async_trait]
pub trait PaymentInterface: Send + Sync {
	/// Charges `amount` for `order_id`.
	async fn process_payment(
		&self,
		order_id: &OrderId,
		amount: Decimal,
		request: &PaymentRequest,
	) -> Result<PaymentReceipt, PaymentError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Signature every payment gateway factory provides.
pub type PaymentFactory = fn(&toml::Value) -> Result<Box<dyn PaymentInterface>, PaymentError>;

/// Registry trait for payment implementations.
pub trait PaymentRegistry: ImplementationRegistry<Factory = PaymentFactory> {}

/// Get all registered payment implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, PaymentFactory)> {
	use implementations::mock;

	vec![(mock::Registry::NAME, mock::Registry::factory())]
}

/// Service wrapping the configured payment gateway.
pub struct PaymentService {
	gateway: Box<dyn PaymentInterface>,
}

impl PaymentService {
	pub fn new(gateway: Box<dyn PaymentInterface>) -> Self {
		Self { gateway }
	}

	pub async fn charge(
		&self,
		order_id: &OrderId,
		amount: Decimal,
		request: &PaymentRequest,
	) -> Result<PaymentReceipt, PaymentError> {
		if amount.is_sign_negative() {
			return Err(PaymentError::Declined(format!(
				"Cannot charge a negative amount: {}",
				amount
			)));
		}

		let receipt = self
			.gateway
			.process_payment(order_id, amount, request)
			.await?;
		tracing::info!(
			order_id = %quill_types::truncate_id(order_id.as_str()),
			reference = %receipt.reference,
			amount = %receipt.amount,
			"Payment accepted"
		);
		Ok(receipt)
	}
}

//! Stub gateway that settles every charge locally.
//!
//! Approves (or, with `approve = false`, declines) every request without
//! contacting any provider. Used until a real gateway is integrated.

use crate::{PaymentError, PaymentFactory, PaymentInterface, PaymentRegistry};
use async_trait::async_trait;
use quill_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, OrderId, PaymentReceipt,
	PaymentRequest, Schema, ValidationError,
};
use rust_decimal::Decimal;

pub struct MockGateway {
	approve: bool,
}

impl MockGateway {
	pub fn new(approve: bool) -> Self {
		Self { approve }
	}
}

#[async_trait]
impl PaymentInterface for MockGateway {
	async fn process_payment(
		&self,
		order_id: &OrderId,
		amount: Decimal,
		request: &PaymentRequest,
	) -> Result<PaymentReceipt, PaymentError> {
		if !self.approve {
			return Err(PaymentError::Declined(format!(
				"mock gateway declines all charges (order {})",
				order_id
			)));
		}

		Ok(PaymentReceipt {
			reference: format!("mock-{}", uuid::Uuid::new_v4()),
			amount,
			method: request.method,
		})
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockGatewaySchema)
	}
}

/// Configuration schema for MockGateway.
pub struct MockGatewaySchema;

impl ConfigSchema for MockGatewaySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![Field::new("approve", FieldType::Boolean)]).validate(config)
	}
}

/// Factory function to create the mock gateway from configuration.
///
/// Configuration parameters:
/// - `approve`: whether charges succeed (default: true)
pub fn create_gateway(config: &toml::Value) -> Result<Box<dyn PaymentInterface>, PaymentError> {
	MockGatewaySchema
		.validate(config)
		.map_err(|e| PaymentError::Configuration(e.to_string()))?;

	let approve = config
		.get("approve")
		.and_then(|v| v.as_bool())
		.unwrap_or(true);
	if !approve {
		tracing::warn!("Mock payment gateway configured to decline every charge");
	}
	Ok(Box::new(MockGateway::new(approve)))
}

/// Registry for the mock payment implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = PaymentFactory;

	fn factory() -> Self::Factory {
		create_gateway
	}
}

impl PaymentRegistry for Registry {}

//! API types for the HTTP shell.
//!
//! Request bodies, query parameters, and the structured error type that maps
//! lifecycle failures onto HTTP status codes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::{Order, Role, UserId};

/// Body of `PUT /api/admin/orders/{id}/assign`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignWriterRequest {
	pub writer_id: UserId,
}

/// Body of `PUT /api/writer/orders/{id}/assignment-response`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResponseRequest {
	pub accept: bool,
}

/// Body of `POST /api/writer/orders/{id}/submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitWorkRequest {
	pub content: String,
}

/// Body of `PUT /api/orders/{id}/review/feedback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
	pub feedback: String,
}

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
	Paypal,
	Mastercard,
}

/// Body of `POST /api/orders/{id}/payment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
	pub method: PaymentMethod,
	#[serde(default)]
	pub payment_info: HashMap<String, serde_json::Value>,
}

/// Receipt returned by a payment gateway that accepted a charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
	pub reference: String,
	pub amount: Decimal,
	pub method: PaymentMethod,
}

/// Response of a successful payment confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
	pub order: Order,
	pub receipt: PaymentReceipt,
}

/// Query parameters accepted by the order listing endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOrdersParams {
	pub page: Option<u32>,
	pub page_size: Option<u32>,
	pub status: Option<String>,
	pub user_id: Option<UserId>,
	pub writer_id: Option<UserId>,
}

/// Body of `POST /api/admin/user-roles/assign` and `/revoke`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleRequest {
	pub user_id: UserId,
	pub role: Role,
}

/// Query parameters of `GET /api/admin/users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersParams {
	pub role: Option<String>,
	pub page: Option<u32>,
	pub page_size: Option<u32>,
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
	pub message: String,
}

impl MessageResponse {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Suggested retry delay in seconds
	#[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
	pub retry_after: Option<u64>,
}

/// Structured API error type with HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed or invalid input (400)
	BadRequest { error_type: String, message: String },
	/// Missing caller identity (401)
	Unauthorized { error_type: String, message: String },
	/// Payment was declined (402)
	PaymentRequired { error_type: String, message: String },
	/// Caller lacks the role or ownership required (403)
	Forbidden { error_type: String, message: String },
	/// Referenced entity does not exist (404)
	NotFound { error_type: String, message: String },
	/// Order not found or not in the expected state (409)
	Conflict { error_type: String, message: String },
	/// Business rule limit reached (422)
	UnprocessableEntity { error_type: String, message: String },
	/// A dependency failed; the caller may retry (503)
	ServiceUnavailable {
		error_type: String,
		message: String,
		retry_after: Option<u64>,
	},
	/// Unexpected failure (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::Unauthorized { .. } => 401,
			APIError::PaymentRequired { .. } => 402,
			APIError::Forbidden { .. } => 403,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::ServiceUnavailable { .. } => 503,
			APIError::InternalServerError { .. } => 500,
		}
	}

	fn parts(&self) -> (&str, &str) {
		match self {
			APIError::BadRequest { error_type, message }
			| APIError::Unauthorized { error_type, message }
			| APIError::PaymentRequired { error_type, message }
			| APIError::Forbidden { error_type, message }
			| APIError::NotFound { error_type, message }
			| APIError::Conflict { error_type, message }
			| APIError::UnprocessableEntity { error_type, message }
			| APIError::ServiceUnavailable {
				error_type,
				message,
				..
			}
			| APIError::InternalServerError { error_type, message } => {
				(error_type.as_str(), message.as_str())
			},
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = self.parts();
		let retry_after = match self {
			APIError::ServiceUnavailable { retry_after, .. } => *retry_after,
			_ => None,
		};
		ErrorResponse {
			error: error_type.to_string(),
			message: message.to_string(),
			retry_after,
		}
	}

	pub fn bad_request(error_type: &str, message: impl Into<String>) -> Self {
		APIError::BadRequest {
			error_type: error_type.to_string(),
			message: message.into(),
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let (_, message) = self.parts();
		write!(f, "{} ({})", message, self.status_code())
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_response_carries_retry_hint() {
		let err = APIError::ServiceUnavailable {
			error_type: "DEPENDENCY_FAILURE".into(),
			message: "try again".into(),
			retry_after: Some(2),
		};
		assert_eq!(err.status_code(), 503);
		let body = err.to_error_response();
		assert_eq!(body.error, "DEPENDENCY_FAILURE");
		assert_eq!(body.retry_after, Some(2));
	}

	#[test]
	fn test_payment_request_parses_method() {
		let req: PaymentRequest = serde_json::from_str(
			r#"{"method":"paypal","payment_info":{"email":"a@b.c"}}"#,
		)
		.unwrap();
		assert_eq!(req.method, PaymentMethod::Paypal);
		assert!(serde_json::from_str::<PaymentRequest>(r#"{"method":"bitcoin"}"#).is_err());
	}
}

//! Mapping from lifecycle failures to HTTP errors.

use quill_core::LifecycleError;
use quill_types::APIError;

/// Seconds a client should wait before retrying after a dependency failure.
const RETRY_AFTER_SECONDS: u64 = 5;

pub fn api_error(err: LifecycleError) -> APIError {
	let message = err.to_string();
	match err {
		LifecycleError::NotFoundOrInvalidState => APIError::Conflict {
			error_type: "ORDER_NOT_FOUND_OR_INVALID_STATE".to_string(),
			message,
		},
		LifecycleError::NotAuthorized(_) => APIError::Forbidden {
			error_type: "NOT_AUTHORIZED".to_string(),
			message,
		},
		LifecycleError::WriterNotFound => APIError::NotFound {
			error_type: "WRITER_NOT_FOUND".to_string(),
			message,
		},
		LifecycleError::LimitExceeded { .. } => APIError::UnprocessableEntity {
			error_type: "FEEDBACK_LIMIT_EXCEEDED".to_string(),
			message,
		},
		LifecycleError::InvalidInput(_) => APIError::bad_request("INVALID_INPUT", message),
		LifecycleError::PaymentDeclined(_) => APIError::PaymentRequired {
			error_type: "PAYMENT_DECLINED".to_string(),
			message,
		},
		LifecycleError::DependencyFailure(_) => {
			tracing::warn!(error = %message, "Request failed on a dependency");
			APIError::ServiceUnavailable {
				error_type: "DEPENDENCY_FAILURE".to_string(),
				message,
				retry_after: Some(RETRY_AFTER_SECONDS),
			}
		},
	}
}

//! HTTP handlers, grouped by the audience of each route family.

pub mod admin;
pub mod auth;
pub mod customer;
pub mod errors;
pub mod writer;

use quill_types::{APIError, ListOrdersParams, OrderStatus};

/// Parses the optional `status` query parameter.
pub(crate) fn status_param(params: &ListOrdersParams) -> Result<Option<OrderStatus>, APIError> {
	params
		.status
		.as_deref()
		.map(str::parse::<OrderStatus>)
		.transpose()
		.map_err(|e| APIError::bad_request("INVALID_STATUS", e.to_string()))
}

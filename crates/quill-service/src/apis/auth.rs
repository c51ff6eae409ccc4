//! Caller identity extraction.
//!
//! Authentication happens upstream. The authenticating proxy forwards the
//! verified user id in `X-User-Id` and a comma separated role list in
//! `X-User-Roles`; this module turns those into an [`Actor`].

use axum::{extract::FromRequestParts, http::request::Parts};
use quill_types::{APIError, Actor, Role, UserId};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLES_HEADER: &str = "x-user-roles";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Caller(pub Actor);

impl<S> FromRequestParts<S> for Caller
where
	S: Send + Sync,
{
	type Rejection = APIError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let user_id = parts
			.headers
			.get(USER_ID_HEADER)
			.and_then(|value| value.to_str().ok())
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.ok_or_else(|| APIError::Unauthorized {
				error_type: "MISSING_IDENTITY".to_string(),
				message: format!("{} header is required", USER_ID_HEADER),
			})?;

		let roles = match parts.headers.get(USER_ROLES_HEADER) {
			Some(value) => {
				let value = value.to_str().map_err(|_| {
					APIError::bad_request("INVALID_ROLES", "roles header is not valid text")
				})?;
				parse_roles(value)?
			},
			None => Vec::new(),
		};

		Ok(Caller(Actor::new(UserId::from(user_id), roles)))
	}
}

fn parse_roles(value: &str) -> Result<Vec<Role>, APIError> {
	value
		.split(',')
		.map(str::trim)
		.filter(|role| !role.is_empty())
		.map(|role| {
			role.parse::<Role>()
				.map_err(|e| APIError::bad_request("INVALID_ROLES", e))
		})
		.collect()
}

//! Staff routes under `/api/admin`: order management and role administration.

use super::{auth::Caller, errors::api_error, status_param};
use crate::server::AppState;
use axum::{
	extract::{Path, Query, State},
	response::Json,
};
use quill_types::{
	APIError, AssignWriterRequest, EnrichedOrder, ListOrdersParams, ListUsersParams,
	MessageResponse, Order, OrderFilter, OrderId, OrderStatus, Page, Role, UserPage,
	UserRoleRequest,
};

/// Handles GET /api/admin/orders.
///
/// `user_id`, `writer_id` and `status` narrow the listing and may be combined.
pub async fn list_orders(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Query(params): Query<ListOrdersParams>,
) -> Result<Json<Page<EnrichedOrder>>, APIError> {
	let filter = OrderFilter {
		customer_id: params.user_id.clone(),
		writer_id: params.writer_id.clone(),
		status: status_param(&params)?,
	};
	state
		.engine
		.list_orders(&actor, filter, params.page, params.page_size)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles GET /api/admin/orders/submitted.
pub async fn list_submitted(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Query(params): Query<ListOrdersParams>,
) -> Result<Json<Page<EnrichedOrder>>, APIError> {
	state
		.engine
		.list_by_status(
			&actor,
			OrderStatus::SubmittedForReview,
			params.page,
			params.page_size,
		)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles PUT /api/admin/orders/{id}/assign.
pub async fn assign_writer(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Path(id): Path<OrderId>,
	Json(request): Json<AssignWriterRequest>,
) -> Result<Json<Order>, APIError> {
	state
		.engine
		.assign_writer(&actor, &id, &request.writer_id)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles PUT /api/admin/orders/{id}/complete.
pub async fn complete_order(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Path(id): Path<OrderId>,
) -> Result<Json<Order>, APIError> {
	state
		.engine
		.complete_order(&actor, &id)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles POST /api/admin/user-roles/assign.
pub async fn grant_role(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Json(request): Json<UserRoleRequest>,
) -> Result<Json<MessageResponse>, APIError> {
	state
		.engine
		.grant_role(&actor, &request.user_id, request.role)
		.await
		.map_err(api_error)?;
	Ok(Json(MessageResponse::new(format!(
		"Granted {} to {}",
		request.role, request.user_id
	))))
}

/// Handles POST /api/admin/user-roles/revoke.
pub async fn revoke_role(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Json(request): Json<UserRoleRequest>,
) -> Result<Json<MessageResponse>, APIError> {
	state
		.engine
		.revoke_role(&actor, &request.user_id, request.role)
		.await
		.map_err(api_error)?;
	Ok(Json(MessageResponse::new(format!(
		"Revoked {} from {}",
		request.role, request.user_id
	))))
}

/// Handles GET /api/admin/users?role=writer.
pub async fn list_users(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Query(params): Query<ListUsersParams>,
) -> Result<Json<UserPage>, APIError> {
	let role = params
		.role
		.as_deref()
		.ok_or_else(|| APIError::bad_request("MISSING_ROLE", "role query parameter is required"))?
		.parse::<Role>()
		.map_err(|e| APIError::bad_request("INVALID_ROLE", e))?;

	state
		.engine
		.list_users_with_role(&actor, role, params.page, params.page_size)
		.await
		.map(Json)
		.map_err(api_error)
}

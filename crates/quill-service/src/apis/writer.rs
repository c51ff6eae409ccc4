//! Writer routes under `/api/writer/orders`.

use super::{auth::Caller, errors::api_error, status_param};
use crate::server::AppState;
use axum::{
	extract::{Path, Query, State},
	response::Json,
};
use quill_types::{
	APIError, AssignmentResponseRequest, EnrichedOrder, ListOrdersParams, Order, OrderId, Page,
	SubmitWorkRequest, UserId,
};

/// Handles POST /api/writer/orders/{id}/submit.
pub async fn submit_work(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Path(id): Path<OrderId>,
	Json(request): Json<SubmitWorkRequest>,
) -> Result<Json<Order>, APIError> {
	state
		.engine
		.submit_work(&actor, &id, &request.content)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles PUT /api/writer/orders/{id}/assignment-response.
pub async fn respond_to_assignment(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Path(id): Path<OrderId>,
	Json(request): Json<AssignmentResponseRequest>,
) -> Result<Json<Order>, APIError> {
	state
		.engine
		.respond_to_assignment(&actor, &id, request.accept)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles GET /api/writer/orders/{writer_id}.
pub async fn list_writer_orders(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Path(writer_id): Path<UserId>,
	Query(params): Query<ListOrdersParams>,
) -> Result<Json<Page<EnrichedOrder>>, APIError> {
	let status = status_param(&params)?;
	state
		.engine
		.list_for_writer(&actor, &writer_id, status, params.page, params.page_size)
		.await
		.map(Json)
		.map_err(api_error)
}

//! Customer-facing order routes under `/api/orders`.

use super::{auth::Caller, errors::api_error, status_param};
use crate::server::AppState;
use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::Json,
};
use quill_types::{
	APIError, EnrichedOrder, FeedbackRequest, ListOrdersParams, NewOrder, Order, OrderId, Page,
	PaymentConfirmation, PaymentRequest,
};

/// Handles POST /api/orders.
pub async fn create_order(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Json(request): Json<NewOrder>,
) -> Result<(StatusCode, Json<Order>), APIError> {
	let order = state
		.engine
		.create_order(&actor, request)
		.await
		.map_err(api_error)?;
	Ok((StatusCode::CREATED, Json(order)))
}

/// Handles GET /api/orders/me.
pub async fn list_my_orders(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Query(params): Query<ListOrdersParams>,
) -> Result<Json<Page<EnrichedOrder>>, APIError> {
	let status = status_param(&params)?;
	state
		.engine
		.list_for_customer(&actor, status, params.page, params.page_size)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles GET /api/orders/{id}.
pub async fn get_order(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Path(id): Path<OrderId>,
) -> Result<Json<EnrichedOrder>, APIError> {
	state
		.engine
		.get_order(&actor, &id)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles POST /api/orders/{id}/payment.
pub async fn confirm_payment(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Path(id): Path<OrderId>,
	Json(request): Json<PaymentRequest>,
) -> Result<Json<PaymentConfirmation>, APIError> {
	let (order, receipt) = state
		.engine
		.confirm_payment(&actor, &id, &request)
		.await
		.map_err(api_error)?;
	Ok(Json(PaymentConfirmation { order, receipt }))
}

/// Handles PUT /api/orders/{id}/review/approve.
pub async fn approve_order(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Path(id): Path<OrderId>,
) -> Result<Json<Order>, APIError> {
	state
		.engine
		.approve_order(&actor, &id)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles PUT /api/orders/{id}/review/feedback.
pub async fn request_feedback(
	State(state): State<AppState>,
	Caller(actor): Caller,
	Path(id): Path<OrderId>,
	Json(request): Json<FeedbackRequest>,
) -> Result<Json<Order>, APIError> {
	state
		.engine
		.request_feedback(&actor, &id, &request.feedback)
		.await
		.map(Json)
		.map_err(api_error)
}

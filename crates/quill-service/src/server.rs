//! HTTP server for the Quill marketplace API.
//!
//! Every route resolves the caller from the forwarded identity headers and
//! hands off to one lifecycle engine operation.

use crate::apis::{admin, customer, writer};
use axum::{
	http::HeaderValue,
	response::Json,
	routing::{get, post, put},
	Router,
};
use quill_config::ApiConfig;
use quill_core::OrderLifecycle;
use quill_types::MessageResponse;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{AllowOrigin, Any, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<OrderLifecycle>,
}

/// Starts the HTTP server and runs until interrupted.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<OrderLifecycle>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(AppState { engine }, &api_config);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Quill API server starting on {}", bind_address);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}

/// Builds the application router with its middleware stack.
pub fn router(state: AppState, api_config: &ApiConfig) -> Router {
	let orders = Router::new()
		.route("/", post(customer::create_order))
		.route("/me", get(customer::list_my_orders))
		.route("/{id}", get(customer::get_order))
		.route("/{id}/payment", post(customer::confirm_payment))
		.route("/{id}/review/approve", put(customer::approve_order))
		.route("/{id}/review/feedback", put(customer::request_feedback));

	let admin = Router::new()
		.route("/", get(admin::list_orders))
		.route("/submitted", get(admin::list_submitted))
		.route("/{id}/assign", put(admin::assign_writer))
		.route("/{id}/complete", put(admin::complete_order));

	let writer = Router::new()
		.route("/{id}", get(writer::list_writer_orders))
		.route("/{id}/submit", post(writer::submit_work))
		.route(
			"/{id}/assignment-response",
			put(writer::respond_to_assignment),
		);

	Router::new()
		.route("/health", get(health))
		.nest(
			"/api",
			Router::new()
				.nest("/orders", orders)
				.nest("/admin/orders", admin)
				.route("/admin/user-roles/assign", post(admin::grant_role))
				.route("/admin/user-roles/revoke", post(admin::revoke_role))
				.route("/admin/users", get(admin::list_users))
				.nest("/writer/orders", writer),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(api_config.timeout_seconds)))
				.layer(cors_layer(api_config)),
		)
		.with_state(state)
}

fn cors_layer(api_config: &ApiConfig) -> CorsLayer {
	let Some(cors) = &api_config.cors else {
		return CorsLayer::permissive();
	};

	if cors.allowed_origins.iter().any(|origin| origin == "*") {
		return CorsLayer::permissive();
	}

	let origins: Vec<HeaderValue> = cors
		.allowed_origins
		.iter()
		.filter_map(|origin| match origin.parse::<HeaderValue>() {
			Ok(value) => Some(value),
			Err(_) => {
				tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
				None
			},
		})
		.collect();

	CorsLayer::new()
		.allow_origin(AllowOrigin::list(origins))
		.allow_methods(Any)
		.allow_headers(Any)
}

async fn health() -> Json<MessageResponse> {
	Json(MessageResponse::new("ok"))
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!("Failed to listen for shutdown signal: {}", e);
		return;
	}
	tracing::info!("Shutdown signal received");
}

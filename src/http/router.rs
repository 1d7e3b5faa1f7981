use crate::http::handlers::{ops, orders, webhook};
use crate::http::middleware::admin_auth::require_internal_api_key;
use crate::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

pub fn build(state: AppState, internal_api_key: String) -> Router {
    let admin_routes = Router::new()
        .route(
            "/api/orders/:reference/payment-status",
            get(orders::get_payment_status),
        )
        .route("/api/orders/:reference/payments", get(orders::list_payments))
        .layer(from_fn_with_state(internal_api_key, require_internal_api_key));

    Router::new()
        .route("/health", get(ops::health))
        .route("/ops/liveness", get(ops::liveness))
        .route("/ops/readiness", get(ops::readiness))
        .route("/api/payment-webhook", post(webhook::payment_webhook))
        .merge(admin_routes)
        .with_state(state)
}

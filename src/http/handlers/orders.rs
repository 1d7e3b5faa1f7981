use crate::domain::order::{OrderState, OrderTable};
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PaymentStatusView {
    pub reference: String,
    pub orders: Option<OrderState>,
    pub custom_orders: Option<OrderState>,
}

pub async fn get_payment_status(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> impl IntoResponse {
    let mut view = PaymentStatusView {
        reference: reference.clone(),
        orders: None,
        custom_orders: None,
    };

    for table in OrderTable::ALL {
        match state.store.order_state(table, &reference).await {
            Ok(found) => match table {
                OrderTable::Orders => view.orders = found,
                OrderTable::CustomOrders => view.custom_orders = found,
            },
            Err(e) => {
                return (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": e.to_string()})),
                )
                    .into_response()
            }
        }
    }

    if view.orders.is_none() && view.custom_orders.is_none() {
        return (
            axum::http::StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "order reference not found"})),
        )
            .into_response();
    }

    (axum::http::StatusCode::OK, Json(view)).into_response()
}

pub async fn list_payments(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> impl IntoResponse {
    match state.store.payment_records(&reference).await {
        Ok(items) => (axum::http::StatusCode::OK, Json(items)).into_response(),
        Err(e) => (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

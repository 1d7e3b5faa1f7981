use crate::domain::notification::{ErrorEnvelope, ErrorPayload};
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Guards the order lookup routes used by the admin dashboard.
pub async fn require_internal_api_key(
    State(expected): State<String>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get("X-Internal-Api-Key")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if expected.is_empty() || provided != expected {
        tracing::warn!(path = %request.uri().path(), "admin request without a valid api key");
        let body = ErrorEnvelope {
            error: ErrorPayload {
                code: "UNAUTHORIZED".to_string(),
                message: "invalid or missing X-Internal-Api-Key".to_string(),
                details: None,
            },
        };
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    }

    next.run(request).await
}

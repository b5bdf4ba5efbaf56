// Handlers module
// HTTP handlers for the REST API

pub mod health;
pub mod jokes;
pub mod math;

use axum::{http::StatusCode, response::IntoResponse};

/// Liveness check
/// Returns "OK" with 200 status without touching any dependency
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

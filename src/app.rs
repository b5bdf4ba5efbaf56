use axum::{
    routing::get,
    Router,
};
use std::{sync::Arc, time::Duration};

use crate::{
    handlers::{
        health::health_report,
        jokes::{
            create_joke, delete_joke, get_external_joke, get_paired_jokes, get_random_joke,
            list_jokes,
        },
        liveness,
        math::{get_increment, get_lcm},
    },
    middleware::create_middleware_stack,
    state::AppState,
};

/// Create the Axum router with all endpoints and middleware
pub fn create_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(liveness))
        .route("/api/health", get(health_report))
        // Joke endpoints; static segments win over `:source`
        .route("/api/jokes", get(get_random_joke).post(create_joke))
        .route("/api/jokes/list", get(list_jokes))
        .route("/api/jokes/paired", get(get_paired_jokes))
        // DELETE reads the segment as the joke number
        .route("/api/jokes/:source", get(get_external_joke).delete(delete_joke))
        // Math endpoints
        .route("/api/math/lcm", get(get_lcm))
        .route("/api/math/increment", get(get_increment))
        .with_state(state)
        .layer(create_middleware_stack(request_timeout))
}

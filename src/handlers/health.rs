// Readiness handler
// Reports database and search index connectivity

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{error, warn};

use crate::{
    models::{HealthReport, HealthStatus, ServiceStatus, ServiceStatuses},
    state::AppState,
};

/// Dependency health check
/// GET /api/health
/// 200 when both the database and Elasticsearch answer, 503 otherwise
pub async fn health_report(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (database, elasticsearch) =
        futures::future::join(state.store.health_check(), state.indexer.is_healthy()).await;

    if let Err(err) = &database {
        error!("Database health check failed: {}", err);
    }
    if !elasticsearch {
        warn!("Elasticsearch health check failed");
    }

    let services = ServiceStatuses {
        database: ServiceStatus::from_healthy(database.is_ok()),
        elasticsearch: ServiceStatus::from_healthy(elasticsearch),
    };

    let (status, code) = if services.all_connected() {
        (HealthStatus::Healthy, StatusCode::OK)
    } else {
        (HealthStatus::Unhealthy, StatusCode::SERVICE_UNAVAILABLE)
    };

    let report = HealthReport {
        status,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime().as_secs_f64(),
        services,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (code, Json(report))
}

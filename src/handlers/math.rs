// Math handlers

use axum::{extract::Query, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::debug;

use crate::{
    error::ApiError,
    models::{ApiResponse, IncrementQuery, LcmQuery},
    services::math,
};

/// Least common multiple of a comma separated list
/// GET /api/math/lcm?numbers=12,15,20
pub async fn get_lcm(Query(query): Query<LcmQuery>) -> Result<impl IntoResponse, ApiError> {
    let numbers = query.parse_numbers().map_err(ApiError::Validation)?;
    let lcm = math::lcm(&numbers)?;

    debug!(?numbers, lcm, "Computed LCM");
    Ok((StatusCode::OK, Json(ApiResponse::data(json!({ "lcm": lcm })))))
}

/// GET /api/math/increment?number=-10
pub async fn get_increment(Query(query): Query<IncrementQuery>) -> Result<impl IntoResponse, ApiError> {
    let number = query.parse_number().map_err(ApiError::Validation)?;
    let result = math::increment(number)?;

    Ok((StatusCode::OK, Json(ApiResponse::data(json!({ "result": result })))))
}

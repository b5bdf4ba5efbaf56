// Joke handlers
// HTTP handlers for stored, external and paired jokes

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::{
    clients::ExternalSource,
    error::ApiError,
    models::{ApiResponse, CreateJokeRequest, JokeListQuery},
    state::AppState,
};

/// Get a random joke from the database
/// GET /api/jokes
pub async fn get_random_joke(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    info!("Fetching random joke");

    let response = match state.jokes.random_joke().await? {
        Some(joke) => (
            StatusCode::OK,
            Json(ApiResponse::data(json!({ "joke": joke.text }))),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::failure("No jokes found in database")),
        )
            .into_response(),
    };

    Ok(response)
}

/// Get a joke from one of the external providers
/// GET /api/jokes/:source
pub async fn get_external_joke(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let source = source.parse::<ExternalSource>().map_err(ApiError::Validation)?;
    info!("Fetching joke from {}", source);

    let joke = state.jokes.external_joke(source).await?;

    Ok((StatusCode::OK, Json(ApiResponse::data(json!({ "joke": joke.text })))))
}

/// List stored jokes, optionally filtered by creator and topic
/// GET /api/jokes/list?userName=&topicName=
pub async fn list_jokes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JokeListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_name = query.get_normalized_user_name();
    let topic_name = query.get_normalized_topic_name();
    info!(user = ?user_name, topic = ?topic_name, "Listing jokes");

    let jokes = state
        .jokes
        .list_jokes(user_name.as_deref(), topic_name.as_deref())
        .await?;

    info!("Retrieved {} jokes", jokes.len());
    Ok((StatusCode::OK, Json(ApiResponse::data(jokes))))
}

/// Pair Chuck Norris and dad jokes and stitch each pair together
/// GET /api/jokes/paired
pub async fn get_paired_jokes(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    info!("Building paired jokes");

    let pairs = state.jokes.paired_jokes().await?;

    Ok((StatusCode::OK, Json(ApiResponse::data(pairs))))
}

/// Create a new joke
/// POST /api/jokes
pub async fn create_joke(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateJokeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    request.validate().map_err(ApiError::Validation)?;

    let user_name = request.get_normalized_user_name();
    let topic_name = request.get_normalized_topic_name();

    let joke = state
        .jokes
        .create_joke(
            &request.get_normalized_text(),
            user_name.as_deref(),
            topic_name.as_deref(),
        )
        .await?;

    info!("Successfully created joke number {}", joke.number);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(json!({ "number": joke.number }))),
    ))
}

/// Delete a joke by its display number
/// DELETE /api/jokes/:number
pub async fn delete_joke(
    State(state): State<Arc<AppState>>,
    Path(number): Path<String>,
) -> Result<Response, ApiError> {
    let number = parse_joke_number(&number)?;
    info!("Deleting joke number {}", number);

    if !state.jokes.delete_joke(number).await? {
        return Ok((StatusCode::NOT_FOUND, Json(ApiResponse::failure("Joke not found"))).into_response());
    }

    info!("Successfully deleted joke number {}", number);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::message("Joke deleted successfully")),
    )
        .into_response())
}

/// Digits only (`^\d+$`). Values past `i32::MAX` can never match a stored number.
fn parse_joke_number(raw: &str) -> Result<i32, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::validation("Number must be a valid positive integer"));
    }

    raw.parse::<i32>()
        .map_err(|_| ApiError::validation("Number is out of range"))
}

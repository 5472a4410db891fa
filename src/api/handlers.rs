use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::core::redis::RedisHealth;
use crate::core::time::format_offset;
use crate::core::{metrics, state::AppState};
use crate::schemas::{HealthResponse, RootResponse};
use crate::services::content;

/// Login page payload: the rendering layer only needs the quiz title.
pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let quiz_title = content::load_parameters(&state.settings().quiz().params_file)
        .map(|params| params.quiz_title)
        .unwrap_or_else(|_| content::DEFAULT_QUIZ_TITLE.to_string());

    Json(RootResponse {
        message: "Cactus quiz service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        quiz_title,
    })
}

pub(crate) async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = format_offset(time::OffsetDateTime::now_utc());

    if let Err(err) = sqlx::query("SELECT 1").execute(state.db()).await {
        tracing::error!(error = %err, "Health check failed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "status": "unhealthy", "error": err.to_string() })),
        )
            .into_response();
    }

    let status = match state.sessions().redis().health().await {
        RedisHealth::Healthy => "healthy",
        RedisHealth::Disconnected | RedisHealth::Unhealthy(_) => "degraded",
    };

    Json(HealthResponse { status: status.to_string(), timestamp }).into_response()
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

pub(crate) async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "status": 404, "detail": "Page not found" })),
    )
}

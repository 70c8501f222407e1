use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashMap;

use crate::api::errors::ApiError;
use crate::core::metrics;
use crate::core::redis::RedisHealth;
use crate::core::state::AppState;
use crate::schemas::{ApiResponse, HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<ApiResponse<RootResponse>> {
    let api = state.settings().api();
    Json(ApiResponse::ok(RootResponse {
        message: api.project_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_prefix: api.api_v1_str.clone(),
    }))
}

pub(crate) async fn healthz(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let mut status = "healthy".to_string();
    let mut components = HashMap::new();

    let redis = match state.redis().health().await {
        RedisHealth::Healthy => "healthy".to_string(),
        RedisHealth::Disconnected => "disconnected".to_string(),
        RedisHealth::Unhealthy(error) => {
            status = "degraded".to_string();
            format!("unhealthy: {error}")
        }
    };
    components.insert("redis".to_string(), redis);

    match sqlx::query("SELECT 1").execute(state.db()).await {
        Ok(_) => {
            components.insert("database".to_string(), "healthy".to_string());
        }
        Err(err) => {
            components.insert("database".to_string(), format!("unhealthy: {err}"));
            status = "unhealthy".to_string();
        }
    }

    Json(ApiResponse::ok(HealthResponse {
        service: "learnhub-api".to_string(),
        status,
        components,
    }))
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => ApiError::ServiceUnavailable("Metrics exporter is not installed".to_string())
            .into_response(),
    }
}

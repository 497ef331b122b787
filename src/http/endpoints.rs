//! Service endpoints that live beside the relay route.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::http::server::AppState;

pub const SERVICE_NAME: &str = "path-relay";

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        service: SERVICE_NAME,
    })
}

pub async fn api_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let relay = format!("{}<target-url>", state.prefix);
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "relay": relay,
            "api": "/api",
        },
        "usage": {
            "example": format!("{}https://example.com/some/file.png?size=large", state.prefix),
            "note": "append the target URL as-is; a missing scheme defaults to https",
        },
    }))
}

pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": format!("{} is running", SERVICE_NAME),
        "docs": "/api",
        "health": "/health",
    }))
}

pub async fn not_found(State(state): State<AppState>) -> Response {
    let relay = format!("{}*", state.prefix);
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "endpoint not found",
            "availableEndpoints": ["/", "/health", "/api", relay],
        })),
    )
        .into_response()
}

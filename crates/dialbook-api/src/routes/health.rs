//! Health check endpoint.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// `up` or `down` per database configuration key.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub databases: BTreeMap<String, &'static str>,
}

/// GET /health
///
/// Answers 503 as soon as one database does not respond.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let report = match &state.database_health {
        Some(checker) => checker.check().await,
        None => BTreeMap::new(),
    };

    let mut healthy = true;
    let mut databases = BTreeMap::new();
    for (key, up) in report {
        if !up {
            tracing::warn!(config_key = %key, "database health check failed");
            healthy = false;
        }
        databases.insert(key, if up { "up" } else { "down" });
    }

    let (code, status) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            databases,
        }),
    )
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

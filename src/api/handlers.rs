use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use crate::http::request::request_id;
use crate::http::response::{self, plain, CONFIG_DISABLED};
use crate::http::server::AppState;
use crate::observability::metrics::{self, UpdateOutcome};
use crate::store::{keys, Settings, StoreError};

#[derive(Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}

/// Effective configuration with secrets removed.
pub async fn get_config(State(state): State<AppState>) -> Result<Json<Settings>, StatusCode> {
    let store = state.store.clone();
    let mut settings = tokio::task::spawn_blocking(move || store.effective())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Config read failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    keys::redact(&mut settings);
    metrics::record_read();
    Ok(Json(settings))
}

/// Apply a partial configuration. Reached only through the gate.
pub async fn patch_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers).to_string();

    let fragment = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(fragment)) => fragment,
        Ok(_) => {
            metrics::record_update(UpdateOutcome::Rejected, start);
            return plain(StatusCode::BAD_REQUEST, "Config update must be a JSON object");
        }
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "Unparseable config update");
            metrics::record_update(UpdateOutcome::Rejected, start);
            return plain(StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", e));
        }
    };

    if fragment.is_empty() {
        metrics::record_update(UpdateOutcome::Rejected, start);
        return plain(StatusCode::BAD_REQUEST, "Config update is empty");
    }

    // A request timeout drops this future but not the blocking task, so an
    // update that times out may still be written.
    let store = state.store.clone();
    match tokio::task::spawn_blocking(move || store.apply_update(fragment)).await {
        Ok(Ok(report)) => {
            let outcome = if report.is_committed() {
                UpdateOutcome::Applied
            } else {
                UpdateOutcome::Rejected
            };
            tracing::debug!(request_id = %request_id, outcome = outcome.as_str(), "Config update handled");
            metrics::record_update(outcome, start);
            response::update_report(&report)
        }
        Ok(Err(StoreError::Disabled)) => {
            tracing::debug!(request_id = %request_id, "Config update refused, edits disabled");
            metrics::record_update(UpdateOutcome::Disabled, start);
            plain(StatusCode::NOT_FOUND, CONFIG_DISABLED)
        }
        Ok(Err(e)) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to persist config");
            metrics::record_update(UpdateOutcome::Failed, start);
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save config")
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Config update task failed");
            metrics::record_update(UpdateOutcome::Failed, start);
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save config")
        }
    }
}

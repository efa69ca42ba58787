use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::http::request::request_id;
use crate::http::response::{plain, CONFIG_DISABLED};
use crate::http::server::AppState;
use crate::observability::metrics::{self, UpdateOutcome};

/// Refuses config updates while `configDialog` is off.
///
/// Runs before the body is read, so the content of a refused update is
/// irrelevant.
pub async fn require_config_dialog(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let store = state.store.clone();

    match tokio::task::spawn_blocking(move || store.edits_enabled()).await {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            tracing::debug!(
                request_id = %request_id(request.headers()),
                "Config update refused, edits disabled"
            );
            metrics::record_update(UpdateOutcome::Disabled, start);
            plain(StatusCode::NOT_FOUND, CONFIG_DISABLED)
        }
        Err(e) => {
            tracing::error!(error = %e, "Gate check failed");
            metrics::record_update(UpdateOutcome::Failed, start);
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read config")
        }
    }
}

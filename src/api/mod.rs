//! Config Endpoint.
//!
//! ```text
//! GET   /api/v1/config  → effective configuration (JSON, never gated)
//! PATCH /api/v1/config  → gate.rs (configDialog) → handlers::patch_config
//! GET   /health         → liveness
//! ```

pub mod gate;
pub mod handlers;

use axum::{
    handler::Handler,
    http::{header, HeaderValue},
    middleware,
    routing::get,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::http::server::AppState;
use self::gate::require_config_dialog;
use self::handlers::*;

pub const CONFIG_PATH: &str = "/api/v1/config";

pub fn setup_api_router(state: AppState) -> Router {
    let gated_patch =
        patch_config.layer(middleware::from_fn_with_state(state.clone(), require_config_dialog));

    Router::new()
        .route(CONFIG_PATH, get(get_config).patch(gated_patch))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .route("/health", get(health))
        .with_state(state)
}

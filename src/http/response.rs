//! Response construction.
//!
//! Update outcomes are answered in plain text; reads in JSON.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::store::UpdateReport;

/// Body sent when remote edits are switched off.
pub const CONFIG_DISABLED: &str = "Config is disabled";

/// Plain-text response.
pub fn plain(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

/// Map a store report to a response: 200 when committed, 400 otherwise.
pub fn update_report(report: &UpdateReport) -> Response {
    let status = if report.is_committed() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    plain(status, report.to_string())
}

//! Static asset handlers, embedded at compile time

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const VCAT_UI_CSS: &str = include_str!("../../../static/vcat-ui.css");
const UPLOAD_JS: &str = include_str!("../../../static/upload.js");

fn asset(content_type: &'static str, body: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", content_type),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        body,
    )
        .into_response()
}

/// GET /static/vcat-ui.css
pub async fn serve_vcat_ui_css() -> Response {
    asset("text/css", VCAT_UI_CSS)
}

/// GET /static/upload.js
pub async fn serve_upload_js() -> Response {
    asset("application/javascript", UPLOAD_JS)
}

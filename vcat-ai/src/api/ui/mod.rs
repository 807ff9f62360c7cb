//! HTML pages
//!
//! - `/`: upload form, allowed categories and recent uploads
//! - `/history/view`: every upload with its results
//!
//! Pages are rendered server side with `format!`; the upload form posts to
//! `/upload` from `static/upload.js`.

use axum::{routing::get, Router};

use crate::AppState;

mod history_page;
mod root;
mod static_assets;

use history_page::history_page;
use root::root_page;
use static_assets::{serve_upload_js, serve_vcat_ui_css};

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_page))
        .route("/history/view", get(history_page))
        .route("/static/vcat-ui.css", get(serve_vcat_ui_css))
        .route("/static/upload.js", get(serve_upload_js))
}

/// Escape text for HTML element content and attribute values
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shared page header with navigation and build identification
pub(crate) fn page_header(title: &str) -> String {
    let git_hash = env!("GIT_HASH");
    format!(
        r#"<header>
    <div>
        <h1>{title}</h1>
        <nav><a href="/">Upload</a><a href="/history/view">History</a></nav>
    </div>
    <div class="build-info">
        vcat-ai v{version}<br>
        {hash} ({profile})<br>
        {built}
    </div>
</header>"#,
        title = escape_html(title),
        version = env!("CARGO_PKG_VERSION"),
        hash = &git_hash[..git_hash.len().min(8)],
        profile = env!("BUILD_PROFILE"),
        built = env!("BUILD_TIMESTAMP"),
    )
}

//! History page: every upload with its results

use axum::extract::State;
use axum::response::Html;

use super::{escape_html, page_header};
use crate::models::UploadHistory;
use crate::{ApiResult, AppState};

fn render_upload(entry: &UploadHistory) -> String {
    let rows: String = entry
        .results
        .iter()
        .map(|r| {
            let class = if r.ai_category.is_uncategorized() {
                r#" class="uncategorized""#
            } else {
                ""
            };
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td{}>{}{}</td></tr>",
                escape_html(&r.vendor_name),
                escape_html(r.description.as_deref().unwrap_or("")),
                escape_html(r.original_category.as_deref().unwrap_or("")),
                class,
                escape_html(r.ai_category.label()),
                if r.from_cache { r#" <span class="muted">(cached)</span>"# } else { "" },
            )
        })
        .collect();

    format!(
        r#"<section class="card" id="upload-{id}">
    <h2>{name} <span class="muted">#{id}, {at}, {count} vendors</span></h2>
    <table>
        <thead><tr><th>Vendor</th><th>Description</th><th>Original Category</th><th>AI Category</th></tr></thead>
        <tbody>{rows}</tbody>
    </table>
</section>"#,
        id = entry.upload.id,
        name = escape_html(&entry.upload.filename),
        at = entry.upload.uploaded_at.format("%Y-%m-%d %H:%M:%S UTC"),
        count = entry.results.len(),
        rows = rows,
    )
}

/// GET /history/view
pub async fn history_page(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let history = state.store.list_history().await?;

    let body = if history.is_empty() {
        r#"<section class="card"><p class="muted">No uploads yet.</p></section>"#.to_string()
    } else {
        history.iter().map(render_upload).collect::<String>()
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Upload History</title>
    <link rel="stylesheet" href="/static/vcat-ui.css">
</head>
<body>
{header}
<div class="container">
{body}
</div>
</body>
</html>
"#,
        header = page_header("Upload History"),
        body = body,
    );

    Ok(Html(html))
}

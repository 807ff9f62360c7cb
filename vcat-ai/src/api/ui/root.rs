//! Landing page: upload form, categories, recent uploads

use axum::extract::State;
use axum::response::Html;
use vcat_common::Category;

use super::{escape_html, page_header};
use crate::{ApiResult, AppState};

const RECENT_UPLOADS: usize = 10;

/// GET /
pub async fn root_page(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let summaries = state.store.upload_summaries().await?;

    let categories: String = Category::labels()
        .into_iter()
        .map(|label| format!(r#"<span class="category-tag">{}</span>"#, escape_html(label)))
        .collect();

    let recent = if summaries.is_empty() {
        r#"<p class="muted">No uploads yet.</p>"#.to_string()
    } else {
        let rows: String = summaries
            .iter()
            .take(RECENT_UPLOADS)
            .map(|s| {
                format!(
                    "<tr><td><a href=\"/history/view#upload-{id}\">#{id}</a></td><td>{name}</td><td>{at}</td><td>{count}</td></tr>",
                    id = s.id,
                    name = escape_html(&s.filename),
                    at = s.uploaded_at.format("%Y-%m-%d %H:%M:%S UTC"),
                    count = s.vendor_count,
                )
            })
            .collect();
        format!(
            "<table><thead><tr><th>Upload</th><th>File</th><th>Uploaded</th><th>Vendors</th></tr></thead><tbody>{}</tbody></table>\
             <p class=\"muted\"><a href=\"/history/view\">Full history</a></p>",
            rows
        )
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Vendor Categorization</title>
    <link rel="stylesheet" href="/static/vcat-ui.css">
</head>
<body>
{header}
<div class="container">
    <section class="card">
        <h2>Upload vendor file</h2>
        <p class="muted">CSV or TSV with a <code>vendor_name</code> column; <code>description</code> and <code>category</code> are optional.</p>
        <form id="upload-form" enctype="multipart/form-data">
            <input type="file" name="file" accept=".csv,.tsv" required>
            <button id="upload-button" type="submit">Upload &amp; classify</button>
        </form>
        <div id="upload-status" class="status"></div>
    </section>
    <section id="upload-results" class="card" hidden></section>
    <section class="card">
        <h2>Categories</h2>
        <div class="categories">{categories}</div>
    </section>
    <section class="card">
        <h2>Recent uploads</h2>
        {recent}
    </section>
</div>
<script src="/static/upload.js"></script>
</body>
</html>
"#,
        header = page_header("Vendor Categorization"),
        categories = categories,
        recent = recent,
    );

    Ok(Html(html))
}

//! Category list endpoint

use axum::{routing::get, Json, Router};
use vcat_common::Category;

use crate::AppState;

/// GET /categories
///
/// Allowed category labels in presentation order.
pub async fn list_categories() -> Json<Vec<&'static str>> {
    Json(Category::labels())
}

pub fn category_routes() -> Router<AppState> {
    Router::new().route("/categories", get(list_categories))
}

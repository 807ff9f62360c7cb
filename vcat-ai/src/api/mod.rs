//! HTTP API handlers for vcat-ai

pub mod cache;
pub mod categories;
pub mod health;
pub mod history;
pub mod settings;
pub mod ui;
pub mod upload;

pub use cache::cache_routes;
pub use categories::category_routes;
pub use health::health_routes;
pub use history::history_routes;
pub use settings::settings_routes;
pub use ui::ui_routes;
pub use upload::upload_routes;

//! HTTP API module
//!
//! Local view layer for the popup: intent endpoints, the rendered status, and
//! the per-tab message stream content scripts listen on.

pub mod app_state;
pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use app_state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/toggle", post(toggle_handler))
        .route("/active", post(active_handler))
        .route("/features/:feature", post(feature_handler))
        .route("/developer/unlock", post(developer_unlock_handler))
        .route("/developer/settings", post(developer_settings_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .route("/tabs/:tab/focus", post(focus_tab_handler))
        .route("/tabs/:tab/messages", get(tab_messages_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! API routes module

pub mod conversations;
pub mod export;
pub mod files;
pub mod indexes;
pub mod query;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // File upload/download/delete routes
        .nest("/files", files::router())
        // Streaming chat query routes
        .nest("/query", query::router())
        // Conversation persistence routes
        .nest("/conversations", conversations::router())
        // Document index routes
        .nest("/indexes", indexes::router())
        // Deck export routes
        .nest("/export", export::router())
}

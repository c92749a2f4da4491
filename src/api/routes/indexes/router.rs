//! Router for the document index API
//!
//! Index records name an uploaded document collection and carry the
//! suggested questions shown when a conversation is scoped to them.

use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use uuid::Uuid;

use super::public;
use crate::api::state::AppState;
use crate::chat::db;

type SharedState = Arc<RwLock<AppState>>;

fn shared_db(state: &SharedState) -> tokio_rusqlite::Connection {
    state
        .read()
        .expect("Unable to read shared state")
        .db
        .clone()
}

async fn create_index(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<public::CreateIndexRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = shared_db(&state);
    let id = payload.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let index = db::create_index(&db, &id, &payload.name, &payload.questions).await?;
    Ok(axum::Json(index).into_response())
}

async fn index_list(
    State(state): State<SharedState>,
) -> Result<axum::Json<public::IndexesResponse>, crate::api::public::ApiError> {
    let db = shared_db(&state);
    let indexes = db::list_indexes(&db).await?;
    Ok(axum::Json(public::IndexesResponse { indexes }))
}

async fn get_index(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = shared_db(&state);
    let Some(index) = db::find_index(&db, &id).await? else {
        return Ok((StatusCode::NOT_FOUND, format!("Index {} not found", id)).into_response());
    };
    Ok(axum::Json(index).into_response())
}

async fn delete_index(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = shared_db(&state);
    if !db::delete_index(&db, &id).await? {
        return Ok((StatusCode::NOT_FOUND, format!("Index {} not found", id)).into_response());
    }
    Ok(axum::Json(json!({ "success": true })).into_response())
}

/// Create the indexes router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(index_list).post(create_index))
        .route("/{id}", get(get_index).delete(delete_index))
}

//! Router for the conversations API
//!
//! Conversations own an ordered message list that is append or
//! replace-in-place only, mirroring how the chat UI sends and edits
//! messages.

use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
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

async fn create_conversation(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<public::CreateConversationRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = shared_db(&state);
    let id = payload.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let name = payload.name.unwrap_or_else(|| "New conversation".to_string());
    let conversation = db::create_conversation(&db, &id, &name).await?;
    Ok(axum::Json(conversation).into_response())
}

async fn conversation_list(
    State(state): State<SharedState>,
) -> Result<axum::Json<public::ConversationsResponse>, crate::api::public::ApiError> {
    let db = shared_db(&state);
    let conversations = db::list_conversations(&db).await?;
    Ok(axum::Json(public::ConversationsResponse { conversations }))
}

async fn get_conversation(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = shared_db(&state);
    let Some(conversation) = db::find_conversation(&db, &id).await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            format!("Conversation {} not found", id),
        )
            .into_response());
    };
    Ok(axum::Json(conversation).into_response())
}

async fn delete_conversation(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = shared_db(&state);
    if !db::delete_conversation(&db, &id).await? {
        return Ok((
            StatusCode::NOT_FOUND,
            format!("Conversation {} not found", id),
        )
            .into_response());
    }
    Ok(axum::Json(json!({ "success": true })).into_response())
}

async fn delete_all_conversations(
    State(state): State<SharedState>,
) -> Result<axum::Json<serde_json::Value>, crate::api::public::ApiError> {
    let db = shared_db(&state);
    db::delete_all_conversations(&db).await?;
    Ok(axum::Json(json!({ "success": true })))
}

/// Append a message at the end of the conversation
async fn append_message(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    axum::Json(payload): axum::Json<public::AppendMessageRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = shared_db(&state);
    if db::find_conversation(&db, &id).await?.is_none() {
        return Ok((
            StatusCode::NOT_FOUND,
            format!("Conversation {} not found", id),
        )
            .into_response());
    }
    let position = db::append_message(&db, &id, &payload.message).await?;
    Ok(axum::Json(public::AppendMessageResponse { position }).into_response())
}

/// Replace a message in place, preserving its position
async fn replace_message(
    State(state): State<SharedState>,
    Path((id, position)): Path<(String, usize)>,
    axum::Json(payload): axum::Json<public::AppendMessageRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = shared_db(&state);
    if !db::replace_message(&db, &id, position, &payload.message).await? {
        return Ok((
            StatusCode::NOT_FOUND,
            format!("No message at position {} in conversation {}", position, id),
        )
            .into_response());
    }
    Ok(axum::Json(json!({ "success": true })).into_response())
}

/// Clear all messages in a conversation, keeping the conversation
async fn clear_messages(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = shared_db(&state);
    if db::find_conversation(&db, &id).await?.is_none() {
        return Ok((
            StatusCode::NOT_FOUND,
            format!("Conversation {} not found", id),
        )
            .into_response());
    }
    db::clear_messages(&db, &id).await?;
    Ok(axum::Json(json!({ "success": true })).into_response())
}

/// Associate a document index with a conversation
async fn set_index(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    axum::Json(payload): axum::Json<public::SetIndexRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = shared_db(&state);
    if db::find_index(&db, &payload.index_id).await?.is_none() {
        return Ok((
            StatusCode::NOT_FOUND,
            format!("Index {} not found", payload.index_id),
        )
            .into_response());
    }
    if !db::set_conversation_index(&db, &id, &payload.index_id).await? {
        return Ok((
            StatusCode::NOT_FOUND,
            format!("Conversation {} not found", id),
        )
            .into_response());
    }
    Ok(axum::Json(json!({ "success": true })).into_response())
}

/// Create the conversations router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/",
            get(conversation_list)
                .post(create_conversation)
                .delete(delete_all_conversations),
        )
        .route("/{id}", get(get_conversation).delete(delete_conversation))
        .route(
            "/{id}/messages",
            post(append_message).delete(clear_messages),
        )
        .route("/{id}/messages/{position}", put(replace_message))
        .route("/{id}/index", put(set_index))
}

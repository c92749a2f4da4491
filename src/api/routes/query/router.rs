//! Router for the streaming chat query API

use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::sync::{Arc, RwLock};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::Query;
use http::HeaderMap;
use http::header;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::public;
use crate::api::state::AppState;
use crate::chat::db::{append_message, find_conversation, find_index};
use crate::llm::{
    KeyConfiguration, Message, Role, StreamOutcome, consume_stream, request_completion,
};

type SharedState = Arc<RwLock<AppState>>;

/// Run a chat query scoped to a document index and stream the
/// assistant's tokens back as a plain-text body
async fn query_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::QueryParams>,
    headers: HeaderMap,
) -> Result<Response, crate::api::public::ApiError> {
    let (db, config, stop) = {
        let shared_state = state.read().expect("Unable to read shared state");
        (
            shared_state.db.clone(),
            shared_state.config.clone(),
            shared_state.stop_streaming.clone(),
        )
    };

    let key_config = match KeyConfiguration::from_headers(&headers, &config) {
        Ok(key_config) => key_config,
        Err(e) => return Ok((StatusCode::BAD_REQUEST, e.to_string()).into_response()),
    };
    if let Err(e) = key_config.validate() {
        return Ok((StatusCode::BAD_REQUEST, e.to_string()).into_response());
    }

    // Scope the system prompt with the named document collection
    let mut system_message = config.system_message.clone();
    if let Some(index_id) = &params.index_id {
        let Some(index) = find_index(&db, index_id).await? else {
            return Ok((
                StatusCode::NOT_FOUND,
                format!("Index {} not found", index_id),
            )
                .into_response());
        };
        system_message = format!(
            "{} The user's questions are about the document collection \"{}\".",
            system_message, index.name
        );
    }

    // Prior transcript, when the caller asked for persistence
    let conversation = match &params.conversation_id {
        Some(conversation_id) => {
            let Some(conversation) = find_conversation(&db, conversation_id).await? else {
                return Ok((
                    StatusCode::NOT_FOUND,
                    format!("Conversation {} not found", conversation_id),
                )
                    .into_response());
            };
            Some(conversation)
        }
        None => None,
    };

    let user_msg = Message::new(Role::User, &params.message);
    let mut transcript = vec![Message::new(Role::System, &system_message)];
    if let Some(conversation) = &conversation {
        transcript.extend(conversation.messages.iter().cloned());
    }
    transcript.push(user_msg.clone());

    // A new stream clears any stale stop request
    stop.store(false, Ordering::Relaxed);

    // Any provider error here surfaces the provider's body text
    let response = request_completion(&key_config, &transcript).await?;

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let conversation_id = conversation.map(|c| c.id);

    tokio::spawn(async move {
        match consume_stream(response, Some(&tx), &stop).await {
            Ok(StreamOutcome::Completed(text)) => {
                if let Some(conversation_id) = conversation_id {
                    append_message(&db, &conversation_id, &user_msg).await?;
                    let assistant_msg = Message::new(Role::Assistant, &text);
                    append_message(&db, &conversation_id, &assistant_msg).await?;
                }
            }
            Ok(StreamOutcome::Cancelled) => {
                tracing::debug!("Chat stream cancelled by user");
            }
            Err(e) => {
                tracing::error!("Chat stream error: {}. Root cause: {}", e, e.root_cause());
                let _ = tx.send(format!("Something went wrong: {}", e));
            }
        }

        Ok::<(), anyhow::Error>(())
    });

    let body_stream =
        UnboundedReceiverStream::new(rx).map(|chunk| Ok::<_, Infallible>(chunk.into_bytes()));
    let resp = (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body_stream),
    )
        .into_response();

    Ok(resp)
}

/// Request cancellation of the in-progress stream. The flag is polled
/// between reads so an in-flight read finishes first.
async fn stop_handler(State(state): State<SharedState>) -> impl IntoResponse {
    state
        .read()
        .expect("Unable to read shared state")
        .stop_streaming
        .store(true, Ordering::Relaxed);
    axum::Json(json!({ "success": true }))
}

/// Create the query router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(query_handler))
        .route("/stop", post(stop_handler))
}

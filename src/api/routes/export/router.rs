//! Router for the deck export API
//!
//! Runs the same streaming consumer as the chat query, but the
//! accumulated text is parsed as a JSON deck script instead of being
//! relayed as a conversational message.

use std::sync::atomic::Ordering;
use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::Query;
use http::HeaderMap;

use super::public;
use crate::api::state::AppState;
use crate::chat::db::find_index;
use crate::chat::deck::{deck_prompt, parse_deck};
use crate::llm::{
    KeyConfiguration, Message, Role, StreamOutcome, consume_stream, request_completion,
};

type SharedState = Arc<RwLock<AppState>>;

/// Generate a slide deck script for a document collection
async fn deck_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::DeckExportParams>,
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

    let transcript = vec![
        Message::new(Role::System, &system_message),
        Message::new(Role::User, &deck_prompt()),
    ];

    stop.store(false, Ordering::Relaxed);

    let response = request_completion(&key_config, &transcript).await?;
    match consume_stream(response, None, &stop).await? {
        StreamOutcome::Completed(text) => {
            let deck = parse_deck(&text)?;
            Ok(axum::Json(deck).into_response())
        }
        StreamOutcome::Cancelled => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Create the export router
pub fn router() -> Router<SharedState> {
    Router::new().route("/deck", get(deck_handler))
}

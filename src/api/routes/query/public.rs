//! Public types for the chat query API
use serde::Deserialize;

#[derive(Deserialize)]
pub struct QueryParams {
    pub message: String,
    #[serde(rename = "indexId")]
    pub index_id: Option<String>,
    // When set, the user and assistant messages are persisted to this
    // conversation once the stream completes. A cancelled stream
    // persists nothing.
    #[serde(rename = "conversationId")]
    pub conversation_id: Option<String>,
}

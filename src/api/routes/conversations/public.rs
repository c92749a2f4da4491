//! Public types for the conversations API
use serde::{Deserialize, Serialize};

use crate::chat::db::ConversationSummary;
use crate::llm::Message;

#[derive(Deserialize)]
pub struct CreateConversationRequest {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationSummary>,
}

#[derive(Deserialize)]
pub struct AppendMessageRequest {
    #[serde(flatten)]
    pub message: Message,
}

#[derive(Serialize)]
pub struct AppendMessageResponse {
    pub position: usize,
}

#[derive(Deserialize)]
pub struct SetIndexRequest {
    pub index_id: String,
}

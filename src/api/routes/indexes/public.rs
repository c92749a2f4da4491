//! Public types for the document index API
use serde::{Deserialize, Serialize};

use crate::chat::db::DocIndex;

#[derive(Deserialize)]
pub struct CreateIndexRequest {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub questions: Vec<String>,
}

#[derive(Serialize)]
pub struct IndexesResponse {
    pub indexes: Vec<DocIndex>,
}

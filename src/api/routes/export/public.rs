//! Public types for the export API
use serde::Deserialize;

pub use crate::chat::deck::{Deck, DeckSlide};

#[derive(Deserialize)]
pub struct DeckExportParams {
    #[serde(rename = "indexId")]
    pub index_id: Option<String>,
}

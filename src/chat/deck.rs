//! Slide deck generation from an indexed document collection.
//!
//! The model is prompted to answer with a JSON deck script which is
//! parsed into a typed structure. Turning the deck into an actual
//! presentation file stays on the client.

use anyhow::{Error, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const DECK_SLIDE_COUNT: usize = 6;
pub const DECK_BULLETS_MIN: usize = 3;
pub const DECK_BULLETS_MAX: usize = 5;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DeckSlide {
    pub title: String,
    pub content: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Deck {
    pub title: String,
    pub slides: Vec<DeckSlide>,
}

/// Build the prompt asking the model for a deck script in JSON
pub fn deck_prompt() -> String {
    format!(
        r#"create a power point script based on context, response should be in a JSON format similar to the following:
{{
    "title": "powerPointTitle",
    "slides": [
        {{
            "title": "titleName",
            "content": [
                "string","string","string",...
            ]
        }},
...}}
Must be {} slides long and each content array should have {}-{} bullet points for the slide."#,
        DECK_SLIDE_COUNT, DECK_BULLETS_MIN, DECK_BULLETS_MAX
    )
}

/// Parse the accumulated completion text as a deck. Models often wrap
/// the payload in a Markdown code fence so that is stripped first.
pub fn parse_deck(text: &str) -> Result<Deck, Error> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed).trim();

    serde_json::from_str::<Deck>(trimmed)
        .map_err(|e| anyhow!("Deck response was not valid JSON: {}", e))
}

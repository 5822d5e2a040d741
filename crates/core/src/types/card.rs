//! Card search view records

use serde::{Deserialize, Serialize};

/// A card as shown in the search result list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardSearchResult {
    pub id: String,
    pub name: String,
    /// Normal-size image URL
    pub image: Option<String>,
    /// Type line (e.g. "Artifact")
    #[serde(rename = "type")]
    pub type_line: Option<String>,
    #[serde(rename = "setName")]
    pub set_name: Option<String>,
    /// Price as reported by the provider (EUR preferred, else USD)
    pub price: Option<String>,
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub cards: Vec<CardSearchResult>,
    /// More pages are available after this one
    pub has_more: bool,
    /// Total matches across all pages, when the provider reports it
    pub total_cards: Option<u32>,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self::default()
    }
}

//! Wire types for the FACEIT Data API.

use serde::{Deserialize, Serialize};

/// One entry of the error envelope the API embeds in response bodies.
///
/// A non-empty `errors` list means the logical request failed even when
/// the transport returned 200.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub http_status: i32,
}

/// A resolved player record.
///
/// The player lookup and the history lookup are separate requests; the
/// resolver merges the history page into `items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
    #[serde(default)]
    pub player_id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub items: Vec<MatchSummary>,
}

/// One match history entry, most-recent-first per the API contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    #[serde(default)]
    pub match_id: String,
    #[serde(default)]
    pub competition_type: String,
}

/// A page of match history for a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
    #[serde(default)]
    pub items: Vec<MatchSummary>,
}

/// Match detail with the ordered demo download locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchDetail {
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
    #[serde(default)]
    pub match_id: String,
    #[serde(default)]
    pub demo_url: Vec<String>,
}

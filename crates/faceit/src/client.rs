//! FACEIT Data API client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.
//! One instance is created at startup and shared read-only across
//! requests; no call is retried.

use std::time::Duration;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};

use crate::types::{ErrorEntry, HistoryPage, MatchDetail, Player};

const DEFAULT_BASE_URL: &str = "https://open.faceit.com/data/v4";

/// Game identifier used for player and history lookups.
pub const GAME: &str = "csgo";

/// History window: the most recent 20 matches.
pub const HISTORY_LIMIT: u32 = 20;

/// Upper bound on any single API call, body included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the FACEIT client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Upstream(String),

    #[error("invalid API key")]
    InvalidKey,
}

/// FACEIT Data API client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a new client with the given API key.
    pub fn new(api_key: &str) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| Error::InvalidKey)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Overrides the API base URL (self-hosted proxies and tests).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Performs an authenticated GET request and returns the raw body.
    async fn get(&self, endpoint: &str) -> Result<Vec<u8>, Error> {
        let url = format!("{}{}", self.base_url, endpoint);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }

    /// Looks up a player by their in-game (steam) identity.
    pub async fn player_by_game_id(&self, game_player_id: &str) -> Result<Player, Error> {
        let encoded = utf8_percent_encode(game_player_id, NON_ALPHANUMERIC);
        let body = self
            .get(&format!("/players?game={GAME}&game_player_id={encoded}"))
            .await?;
        let player: Player = serde_json::from_slice(&body)?;
        check_envelope(&player.errors)?;
        Ok(player)
    }

    /// Returns the most recent match history page for a player.
    pub async fn player_history(&self, player_id: &str) -> Result<HistoryPage, Error> {
        let encoded = utf8_percent_encode(player_id, NON_ALPHANUMERIC);
        let body = self
            .get(&format!(
                "/players/{encoded}/history?game={GAME}&offset=0&limit={HISTORY_LIMIT}"
            ))
            .await?;
        let page: HistoryPage = serde_json::from_slice(&body)?;
        check_envelope(&page.errors)?;
        Ok(page)
    }

    /// Returns match detail including demo download locations.
    pub async fn match_detail(&self, match_id: &str) -> Result<MatchDetail, Error> {
        let encoded = utf8_percent_encode(match_id, NON_ALPHANUMERIC);
        let body = self.get(&format!("/matches/{encoded}")).await?;
        let detail: MatchDetail = serde_json::from_slice(&body)?;
        check_envelope(&detail.errors)?;
        Ok(detail)
    }
}

/// Rejects responses that carry a non-empty error envelope.
fn check_envelope(errors: &[ErrorEntry]) -> Result<(), Error> {
    match errors.first() {
        Some(first) => Err(Error::Upstream(first.message.clone())),
        None => Ok(()),
    }
}

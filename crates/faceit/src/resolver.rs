//! Latest-match resolution.
//!
//! Turns a steam identity into the most recent non-championship match
//! and its demo download location, using the [`Client`].

use tracing::debug;

use crate::client::{Client, Error};
use crate::types::{MatchDetail, Player};

/// Competition type excluded from replay analysis.
const EXCLUDED_COMPETITION: &str = "championship";

/// Errors from the resolution steps.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("player has no matches in the lookback window")]
    NoRecentMatches,

    #[error("history has no non-championship match")]
    NoEligibleMatch,

    #[error("match {0} has no demo download")]
    NoDemo(String),

    #[error(transparent)]
    Client(#[from] Error),
}

/// Resolves a steam identity to a player record with merged history.
///
/// Fails with [`ResolveError::NoRecentMatches`] when the identity yields
/// zero history entries, i.e. the player is inactive beyond the
/// supported lookback window.
pub async fn resolve_player(client: &Client, identity: &str) -> Result<Player, ResolveError> {
    let mut player = client.player_by_game_id(identity).await?;
    let history = client.player_history(&player.player_id).await?;
    player.items = history.items;

    if player.items.is_empty() {
        return Err(ResolveError::NoRecentMatches);
    }

    debug!(
        player_id = %player.player_id,
        nickname = %player.nickname,
        matches = player.items.len(),
        "player resolved"
    );
    Ok(player)
}

/// Picks the most recent non-championship match from the history.
///
/// The history is ordered most-recent-first, so the first qualifying
/// entry wins. A non-empty history where every entry is a championship
/// is rejected explicitly; no empty match identifier can escape.
pub fn select_latest_eligible_match(player: &Player) -> Result<&str, ResolveError> {
    player
        .items
        .iter()
        .find(|m| m.competition_type != EXCLUDED_COMPETITION)
        .map(|m| m.match_id.as_str())
        .ok_or(ResolveError::NoEligibleMatch)
}

/// Resolves a match to its detail record.
///
/// Fails with [`ResolveError::NoDemo`] when the match carries no demo
/// download location.
pub async fn resolve_match(client: &Client, match_id: &str) -> Result<MatchDetail, ResolveError> {
    let detail = client.match_detail(match_id).await?;

    if detail.demo_url.is_empty() {
        return Err(ResolveError::NoDemo(match_id.to_string()));
    }

    debug!(match_id = %detail.match_id, demos = detail.demo_url.len(), "match resolved");
    Ok(detail)
}

//! FACEIT Data API client and latest-match resolution.
//!
//! Provides an async client for the FACEIT Data API v4 with Bearer
//! token authentication, plus the resolution steps that turn a steam
//! identity into the most recent eligible match and its demo location.

pub mod client;
pub mod resolver;
pub mod types;

pub use client::{Client, Error};
pub use resolver::{ResolveError, resolve_match, resolve_player, select_latest_eligible_match};
pub use types::{MatchDetail, MatchSummary, Player};

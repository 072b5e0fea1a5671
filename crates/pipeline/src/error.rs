//! Pipeline error surface.

use xhair_faceit::ResolveError;
use xhair_replay::{AcquireError, ParseError};

/// One outward-facing failure per pipeline run.
///
/// Every stage failure lands here; none propagates as an uncaught
/// fault to the serving task. All kinds map to the same generic
/// server-error status — the caller always gets a clear message,
/// never a crash or a hang.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Could not find user with steam id: {identity}")]
    PlayerLookup {
        identity: String,
        #[source]
        source: ResolveError,
    },

    #[error("User {identity} has not played for at least 6 months")]
    NoRecentMatches { identity: String },

    #[error("User {identity} has no recent match eligible for analysis")]
    NoEligibleMatch { identity: String },

    #[error("Error getting user {identity} latest match")]
    MatchLookup {
        identity: String,
        #[source]
        source: ResolveError,
    },

    #[error("Demo download failed: {0}")]
    Acquire(#[from] AcquireError),

    #[error("Demo parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// HTTP status for this failure. The outward mapping is a single
    /// generic server-error status for every kind.
    pub fn status(&self) -> u16 {
        500
    }
}

//! Pipeline execution.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use xhair_faceit::{
    Client, ResolveError, resolve_match, resolve_player, select_latest_eligible_match,
};
use xhair_replay::{CrosshairResult, ParserFactory, acquire, extract_crosshair};

use crate::error::PipelineError;

/// One pipeline instance serves one inbound request; instances share
/// only the read-only clients and the parser factory.
pub struct Pipeline {
    faceit: Client,
    http: reqwest::Client,
    parser: Arc<dyn ParserFactory>,
}

impl Pipeline {
    /// Creates a pipeline over the given clients and demo decoder.
    pub fn new(faceit: Client, http: reqwest::Client, parser: Arc<dyn ParserFactory>) -> Self {
        Self {
            faceit,
            http,
            parser,
        }
    }

    /// Runs resolve → acquire → scan for one identity.
    ///
    /// Stages are strictly sequential; no stage starts before the
    /// prior stage's result is available, and none is retried. Each
    /// stage is raced against `cancel` for best-effort cancellation.
    /// The demo artifact is owned by this call from the moment
    /// acquisition returns, so it is released on every exit path.
    pub async fn run(
        &self,
        identity: &str,
        cancel: &CancellationToken,
    ) -> Result<CrosshairResult, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        // -- Resolve --
        let player = tokio::select! {
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            r = resolve_player(&self.faceit, identity) => r.map_err(|e| match e {
                ResolveError::NoRecentMatches => PipelineError::NoRecentMatches {
                    identity: identity.to_string(),
                },
                other => PipelineError::PlayerLookup {
                    identity: identity.to_string(),
                    source: other,
                },
            })?,
        };

        let match_id = select_latest_eligible_match(&player)
            .map_err(|_| PipelineError::NoEligibleMatch {
                identity: identity.to_string(),
            })?
            .to_string();
        info!(identity, match_id = %match_id, "latest eligible match selected");

        let detail = tokio::select! {
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            r = resolve_match(&self.faceit, &match_id) => r.map_err(|e| PipelineError::MatchLookup {
                identity: identity.to_string(),
                source: e,
            })?,
        };

        // Only the first demo location is used.
        let url = detail.demo_url.first().ok_or_else(|| {
            PipelineError::Internal("match detail lost its demo location".into())
        })?;

        // -- Acquire --
        let artifact = tokio::select! {
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            r = acquire(&self.http, &match_id, url) => r?,
        };

        // -- Scan --
        let path = artifact.path().to_path_buf();
        let factory = Arc::clone(&self.parser);
        let target = identity.to_string();
        let scan = tokio::task::spawn_blocking(move || {
            let mut parser = factory.open(&path)?;
            extract_crosshair(parser.as_mut(), &target)
        });

        let result = tokio::select! {
            // Dropping the artifact guard here unlinks the file; the
            // abandoned blocking task keeps its own open handle.
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            joined = scan => match joined {
                Ok(result) => result?,
                // A panic inside the scan surfaces as a JoinError and
                // becomes a reported failure, not a process abort.
                Err(e) => return Err(PipelineError::Internal(format!("scan task failed: {e}"))),
            },
        };

        drop(artifact);
        info!(identity, match_id = %match_id, found = result.found, "pipeline complete");
        Ok(result)
    }
}

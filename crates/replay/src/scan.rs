//! Crosshair scan over a demo's event stream.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::debug;

use crate::parser::{DemoParser, ParseError};

/// Outcome of a scan. `found == false` is a valid terminal state, not
/// an error: the identity never produced a non-empty code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrosshairResult {
    pub found: bool,
    pub code: String,
}

/// Builds the indexed property name for a participant's entity slot.
///
/// Per-slot configuration is stored in a property array keyed by live
/// entity-assignment index, zero-padded to three digits.
pub fn crosshair_property(entity_index: i32) -> String {
    format!("m_szCrosshairCodes.{entity_index:03}")
}

/// Request-scoped state shared with the match-start handler.
struct ScanState {
    identity: String,
    code: Option<String>,
}

/// Scans the stream for the target identity's crosshair code.
///
/// Registers a match-start handler and drives the parser to the end.
/// On every match-start, the participant whose platform identity
/// matches `identity` has its entity's indexed crosshair property
/// read; the entity index is taken from the event itself, since slots
/// are only stable within the participant's current life. Across
/// multiple match-start events the last non-empty read wins — later
/// events reflect the authoritative live-game state.
pub fn extract_crosshair(
    parser: &mut dyn DemoParser,
    identity: &str,
) -> Result<CrosshairResult, ParseError> {
    let state = Arc::new(Mutex::new(ScanState {
        identity: identity.to_string(),
        code: None,
    }));

    let ctx = Arc::clone(&state);
    parser.register_match_start(Box::new(move |event| {
        let mut ctx = ctx.lock().unwrap();
        for player in event.playing {
            if player.platform_id.to_string() != ctx.identity {
                continue;
            }
            let name = crosshair_property(player.entity_index);
            if let Some(value) = player.entity.prop(&name) {
                if !value.is_empty() {
                    debug!(property = %name, "crosshair code read");
                    ctx.code = Some(value);
                }
            }
        }
    }));

    parser.parse_to_end()?;

    let code = state.lock().unwrap().code.take();
    Ok(match code {
        Some(code) => CrosshairResult { found: true, code },
        None => CrosshairResult {
            found: false,
            code: String::new(),
        },
    })
}

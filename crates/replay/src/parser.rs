//! Demo decoder boundary.
//!
//! The bit-level demo format (string tables, entity dictionaries, tick
//! deltas) is decoded by an external component. This module defines the
//! seam: a factory opens an artifact and yields a [`DemoParser`], the
//! scan registers an event handler and drives the parser to the end.
//!
//! Contract: handlers fire synchronously on the driving thread during
//! [`DemoParser::parse_to_end`], and state delivered to a handler
//! reflects the stream position at that event, not any later position.

use std::io;
use std::path::Path;

/// Errors raised while opening or advancing a demo stream.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("demo decode fault: {0}")]
    Decode(String),
}

/// Read access to a participant's backing entity at the current stream
/// position.
pub trait EntityProps {
    /// Indexed property lookup. `None` when the property is absent.
    fn prop(&self, name: &str) -> Option<String>;
}

/// Property maps are a valid entity view; decoder adapters that
/// materialize a snapshot per event can hand one out directly.
impl EntityProps for std::collections::HashMap<String, String> {
    fn prop(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A participant connected and playing at the time of an event.
///
/// `entity_index` is the transient slot of the participant's live
/// entity. It is only stable within the participant's current life,
/// so it must be read at event time, never cached across events.
pub struct LivePlayer<'a> {
    /// Stable numeric platform identity (steam-style).
    pub platform_id: u64,
    /// Current entity slot index.
    pub entity_index: i32,
    /// The participant's backing entity.
    pub entity: &'a dyn EntityProps,
}

/// Match-start event payload with the live participant list.
pub struct MatchStart<'a> {
    pub playing: &'a [LivePlayer<'a>],
}

/// Handler invoked for every match-start event in the stream. The
/// format allows more than one (warmup restart followed by live start).
pub type MatchStartHandler = Box<dyn FnMut(&MatchStart<'_>) + Send>;

/// One pass over a demo's event stream.
pub trait DemoParser: Send {
    /// Registers the match-start handler for this pass.
    fn register_match_start(&mut self, handler: MatchStartHandler);

    /// Drives the stream to the end in a single forward pass; no
    /// seeking, no restart. Blocks the calling thread.
    fn parse_to_end(&mut self) -> Result<(), ParseError>;
}

/// Opens demo artifacts for scanning.
///
/// Implementations position the parser at the start of the decompressed
/// stream. The concrete decoder is supplied by the embedding
/// application.
pub trait ParserFactory: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn DemoParser>, ParseError>;
}

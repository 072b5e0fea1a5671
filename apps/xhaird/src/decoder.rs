//! Demo decoder wiring.
//!
//! The pipeline is decoder-agnostic: it only talks to
//! [`xhair_replay::ParserFactory`]. This module is the single place
//! where the binary chooses a concrete decoder. Deployments that link
//! a real demo decoder swap the factory returned here; nothing else
//! changes.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use xhair_replay::parser::{DemoParser, MatchStartHandler, ParseError, ParserFactory};

/// Returns the parser factory wired into this binary.
pub fn factory() -> Arc<dyn ParserFactory> {
    Arc::new(DrainFactory)
}

struct DrainFactory;

impl ParserFactory for DrainFactory {
    fn open(&self, path: &Path) -> Result<Box<dyn DemoParser>, ParseError> {
        let file = File::open(path)?;
        Ok(Box::new(DrainDecoder { file }))
    }
}

/// Decoder stand-in: consumes the stream to the end without decoding
/// any events, so every scan completes with `found: false`.
struct DrainDecoder {
    file: File,
}

impl DemoParser for DrainDecoder {
    fn register_match_start(&mut self, _handler: MatchStartHandler) {}

    fn parse_to_end(&mut self) -> Result<(), ParseError> {
        io::copy(&mut self.file, &mut io::sink())?;
        Ok(())
    }
}

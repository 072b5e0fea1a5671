//! Temporary demo artifact with scoped release.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// A uniquely named temporary file holding decompressed demo bytes.
///
/// The file is deleted exactly once, when the handle is dropped. The
/// orchestrator owns the handle for the duration of one pipeline run,
/// so every exit path releases the file.
#[derive(Debug)]
pub struct DemoArtifact {
    path: PathBuf,
}

impl DemoArtifact {
    /// Creates the artifact file under the OS temp directory and
    /// returns the handle together with the open file.
    ///
    /// The name combines the match ID with a fresh UUID, so concurrent
    /// requests for the same match never collide.
    pub(crate) fn create(match_id: &str) -> io::Result<(Self, File)> {
        let path = unique_demo_path(match_id);
        let file = File::create(&path)?;
        debug!(path = %path.display(), "demo artifact created");
        Ok((Self { path }, file))
    }

    /// Storage location of the artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DemoArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "demo artifact removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "failed to remove demo artifact: {e}"),
        }
    }
}

/// Builds a collision-free path for a match's demo file.
fn unique_demo_path(match_id: &str) -> PathBuf {
    // Match IDs come from an external API; keep only filename-safe chars.
    let mut safe: String = match_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if safe.is_empty() {
        safe.push_str("demo");
    }

    std::env::temp_dir().join(format!("{safe}-{}.dem", uuid::Uuid::new_v4()))
}

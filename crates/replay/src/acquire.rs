//! Demo download and decompression.

use std::io::{self, Write};

use flate2::write::GzDecoder;
use futures_util::StreamExt;
use tracing::info;

use crate::artifact::DemoArtifact;

/// Errors from demo acquisition.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("demo download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("demo download failed: HTTP {0}")]
    DownloadStatus(u16),

    #[error("gzip decompression failed: {0}")]
    Decompress(io::Error),

    #[error("I/O error: {0}")]
    Io(io::Error),
}

/// Downloads the gzip demo at `url` and materializes the decompressed
/// bytes as a [`DemoArtifact`].
///
/// The body is decompressed chunk by chunk as it arrives, never
/// buffered whole. A failure mid-stream drops the artifact guard,
/// which removes the partial file; on success the guard is returned
/// and the caller controls the deletion point.
pub async fn acquire(
    http: &reqwest::Client,
    match_id: &str,
    url: &str,
) -> Result<DemoArtifact, AcquireError> {
    let resp = http.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(AcquireError::DownloadStatus(status.as_u16()));
    }

    let (artifact, file) = DemoArtifact::create(match_id).map_err(AcquireError::Io)?;
    let mut decoder = GzDecoder::new(file);

    let mut stream = resp.bytes_stream();
    let mut compressed: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        compressed += chunk.len() as u64;
        decoder.write_all(&chunk).map_err(classify_io)?;
    }

    let file = decoder.finish().map_err(classify_io)?;
    let size = file.metadata().map_err(AcquireError::Io)?.len();
    drop(file);

    info!(
        match_id,
        compressed_bytes = compressed,
        demo_bytes = size,
        "demo acquired"
    );
    Ok(artifact)
}

/// Splits decoder write errors into corrupt-stream vs storage faults.
fn classify_io(e: io::Error) -> AcquireError {
    match e.kind() {
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            AcquireError::Decompress(e)
        }
        _ => AcquireError::Io(e),
    }
}

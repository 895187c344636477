// crates/launchpad-rpc/src/handlers/artifact.rs
//
// Artifact transfer handlers: Upload, FetchArtifact, Download.
//
// These run behind the plain HTTP routes rather than the JSON-RPC envelope,
// since their payloads are raw byte streams.

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use launchpad_catalog::ReleaseService;
use launchpad_core::{format_file_size, ArtifactStream, ReleaseError};

use super::parse_channel;

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub channel: String,
    pub version: String,
    pub artifact_ref: String,
    pub file_size: u64,
    pub file_size_formatted: String,
    /// Absolute URL clients download the artifact from.
    pub download_url: String,
}

pub async fn handle_upload(
    service: &ReleaseService,
    channel: &str,
    version: &str,
    release_notes: &str,
    source: &mut (dyn AsyncRead + Send + Unpin),
    authorized: bool,
) -> Result<UploadResponse, ReleaseError> {
    let channel = parse_channel(channel)?;
    let release = service
        .upload(channel, version, release_notes, source, authorized)
        .await?;

    Ok(UploadResponse {
        message: format!("Version {} uploaded successfully", release.version),
        channel: channel.to_string(),
        download_url: release.artifact_ref.download_url(service.base_url()),
        artifact_ref: release.artifact_ref.to_string(),
        file_size: release.file_size,
        file_size_formatted: format_file_size(release.file_size),
        version: release.version,
    })
}

// ---------------------------------------------------------------------------
// FetchArtifact / Download
// ---------------------------------------------------------------------------

/// Open the artifact of `version` in `channel`.
pub async fn handle_fetch_artifact(
    service: &ReleaseService,
    channel: &str,
    version: &str,
) -> Result<ArtifactStream, ReleaseError> {
    let channel = parse_channel(channel)?;
    service.fetch_artifact(channel, version).await
}

/// Open an artifact by the stored name a `DownloadUrl` ends with.
pub async fn handle_download(
    service: &ReleaseService,
    name: &str,
) -> Result<ArtifactStream, ReleaseError> {
    service.download(name).await
}

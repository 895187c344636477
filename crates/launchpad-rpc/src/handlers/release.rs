// crates/launchpad-rpc/src/handlers/release.rs
//
// Release handlers: GetActive, GetActiveInfo, GetHistory, Activate, Delete.

use serde::{Deserialize, Serialize};

use launchpad_catalog::ReleaseService;
use launchpad_core::{ActiveReleaseInfo, Release, ReleaseError};

use super::parse_channel;

/// Request naming only a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRequest {
    /// "game" or "launcher".
    pub channel: String,
}

/// Request naming one version of a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRequest {
    pub channel: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// GetActive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetActiveResponse {
    pub channel: String,
    pub release: Release,
}

pub async fn handle_get_active(
    service: &ReleaseService,
    request: ChannelRequest,
) -> Result<GetActiveResponse, ReleaseError> {
    let channel = parse_channel(&request.channel)?;
    let release = service.get_active(channel).await?;
    Ok(GetActiveResponse {
        channel: channel.to_string(),
        release,
    })
}

// ---------------------------------------------------------------------------
// GetActiveInfo
// ---------------------------------------------------------------------------

/// Handle an update check: the active release in the shape launchers parse.
pub async fn handle_get_active_info(
    service: &ReleaseService,
    request: ChannelRequest,
) -> Result<ActiveReleaseInfo, ReleaseError> {
    let channel = parse_channel(&request.channel)?;
    service.active_info(channel).await
}

// ---------------------------------------------------------------------------
// GetHistory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHistoryResponse {
    pub channel: String,
    /// Newest `release_date` first.
    pub releases: Vec<Release>,
    pub count: usize,
}

pub async fn handle_get_history(
    service: &ReleaseService,
    request: ChannelRequest,
) -> Result<GetHistoryResponse, ReleaseError> {
    let channel = parse_channel(&request.channel)?;
    let releases = service.get_history(channel).await?;
    Ok(GetHistoryResponse {
        channel: channel.to_string(),
        count: releases.len(),
        releases,
    })
}

// ---------------------------------------------------------------------------
// Activate / Delete
// ---------------------------------------------------------------------------

/// Response from a mutation addressed to one version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionChangeResponse {
    pub channel: String,
    pub version: String,
    pub message: String,
}

pub async fn handle_activate(
    service: &ReleaseService,
    request: VersionRequest,
    authorized: bool,
) -> Result<VersionChangeResponse, ReleaseError> {
    let channel = parse_channel(&request.channel)?;
    let release = service
        .activate(channel, &request.version, authorized)
        .await?;
    Ok(VersionChangeResponse {
        channel: channel.to_string(),
        message: format!("Version {} activated successfully", release.version),
        version: release.version,
    })
}

pub async fn handle_delete(
    service: &ReleaseService,
    request: VersionRequest,
    authorized: bool,
) -> Result<VersionChangeResponse, ReleaseError> {
    let channel = parse_channel(&request.channel)?;
    let removed = service.delete(channel, &request.version, authorized).await?;
    Ok(VersionChangeResponse {
        channel: channel.to_string(),
        message: format!("Version {} deleted successfully", removed.version),
        version: removed.version,
    })
}

// crates/launchpad-rpc/src/handlers/node.rs
//
// Node health handler: GetHealth.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use launchpad_catalog::ReleaseService;
use launchpad_core::{Channel, ReleaseError};

// ---------------------------------------------------------------------------
// GetHealth
// ---------------------------------------------------------------------------

/// Request for node health status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetHealthRequest {}

/// Per-channel catalog summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelHealth {
    pub channel: String,
    /// Whether the catalog document could be read.
    pub catalog_ok: bool,
    pub releases: usize,
    pub active_version: Option<String>,
}

/// Response containing node health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHealthResponse {
    /// "healthy" or "degraded".
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub channels: Vec<ChannelHealth>,
}

/// Handle a GetHealth request.
///
/// Reports "degraded" when any channel's catalog cannot be read.
pub async fn handle_get_health(
    service: &ReleaseService,
    _request: GetHealthRequest,
    start_time: Instant,
) -> Result<GetHealthResponse, ReleaseError> {
    let mut channels = Vec::with_capacity(Channel::ALL.len());
    for channel in Channel::ALL {
        let summary = match service.get_history(channel).await {
            Ok(releases) => ChannelHealth {
                channel: channel.to_string(),
                catalog_ok: true,
                releases: releases.len(),
                active_version: releases
                    .iter()
                    .find(|r| r.is_active)
                    .map(|r| r.version.clone()),
            },
            Err(e) => {
                tracing::warn!(channel = %channel, "Health check could not read catalog: {}", e);
                ChannelHealth {
                    channel: channel.to_string(),
                    catalog_ok: false,
                    releases: 0,
                    active_version: None,
                }
            }
        };
        channels.push(summary);
    }

    let healthy = channels.iter().all(|c| c.catalog_ok);
    Ok(GetHealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: start_time.elapsed().as_secs(),
        channels,
    })
}

// crates/launchpad-rpc/src/handlers/admin.rs
//
// Admin handlers: Sweep.

use serde::{Deserialize, Serialize};

use launchpad_catalog::ReleaseService;
use launchpad_core::ReleaseError;

use super::parse_channel;

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// Request to remove artifacts no catalog entry references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRequest {
    pub channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResponse {
    pub channel: String,
    /// Names of the artifacts that were deleted.
    pub removed: Vec<String>,
    pub count: usize,
}

pub async fn handle_sweep(
    service: &ReleaseService,
    request: SweepRequest,
    authorized: bool,
) -> Result<SweepResponse, ReleaseError> {
    let channel = parse_channel(&request.channel)?;
    let removed: Vec<String> = service
        .sweep_orphans(channel, authorized)
        .await?
        .into_iter()
        .map(|r| r.to_string())
        .collect();

    Ok(SweepResponse {
        channel: channel.to_string(),
        count: removed.len(),
        removed,
    })
}

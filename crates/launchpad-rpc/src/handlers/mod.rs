// crates/launchpad-rpc/src/handlers/mod.rs
//
// Handler modules for all RPC endpoints.
// Each module defines request/response types and handler functions
// for a specific API group.

pub mod admin;
pub mod artifact;
pub mod node;
pub mod release;

use launchpad_core::{Channel, ReleaseError};

/// Parse a channel name from request input. Unknown names are `NotFound`.
pub(crate) fn parse_channel(raw: &str) -> Result<Channel, ReleaseError> {
    raw.parse()
}

// crates/launchpad-cli/src/commands/mod.rs
//
// Command module declarations for the Launchpad CLI.

pub mod admin;
pub mod artifact;
pub mod release;
pub mod status;
pub mod token;

use crate::output::OutputFormat;
use crate::rpc_client::RpcClient;

/// Shared state handed to every command.
pub struct Context {
    pub client: RpcClient,
    pub format: OutputFormat,
}

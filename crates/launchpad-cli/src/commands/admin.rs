// crates/launchpad-cli/src/commands/admin.rs
//
// `launchpad sweep`: remove artifacts no catalog entry references.

use serde_json::json;

use launchpad_core::Channel;
use launchpad_rpc::handlers::admin::SweepResponse;

use super::Context;
use crate::output::{format_json, OutputFormat};

/// Run the sweep command.
pub async fn sweep(ctx: &Context, channel: Channel) -> Result<(), Box<dyn std::error::Error>> {
    let value = ctx
        .client
        .call("admin/sweep", json!({ "channel": channel }))
        .await?;
    let resp: SweepResponse = serde_json::from_value(value)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&resp)),
        OutputFormat::Table => {
            if resp.removed.is_empty() {
                println!("No orphaned {} artifacts.", resp.channel);
            } else {
                for name in &resp.removed {
                    println!("  removed {}", name);
                }
                println!("{} orphaned artifact(s) removed", resp.count);
            }
        }
    }
    Ok(())
}

// crates/launchpad-cli/src/commands/status.rs
//
// `launchpad status`: display daemon health and per-channel summary.

use launchpad_rpc::handlers::node::GetHealthResponse;

use super::Context;
use crate::output::{format_json, format_table, ChannelRow, OutputFormat};

/// Run the status command.
pub async fn run(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let value = ctx
        .client
        .call("node/health", serde_json::json!({}))
        .await?;
    let health: GetHealthResponse = serde_json::from_value(value)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&health)),
        OutputFormat::Table => {
            println!("Launchpad v{}", health.version);
            println!();
            println!("Daemon Status");
            println!("-------------");
            println!("  Endpoint: {}", ctx.client.endpoint());
            println!("  Status:   {}", health.status);
            println!("  Uptime:   {}s", health.uptime_seconds);
            println!();
            let rows: Vec<ChannelRow> = health.channels.iter().map(ChannelRow::from).collect();
            println!("{}", format_table(&rows));
        }
    }
    Ok(())
}

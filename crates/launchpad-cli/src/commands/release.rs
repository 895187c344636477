// crates/launchpad-cli/src/commands/release.rs
//
// `launchpad {active, info, history, activate, delete}`: catalog commands.

use serde_json::json;

use launchpad_core::{format_file_size, ActiveReleaseInfo, Channel};
use launchpad_rpc::handlers::release::{GetActiveResponse, GetHistoryResponse, VersionChangeResponse};

use super::Context;
use crate::output::{format_json, format_table, OutputFormat, ReleaseRow};

/// `launchpad active`: show the release currently advertised on a channel.
pub async fn active(ctx: &Context, channel: Channel) -> Result<(), Box<dyn std::error::Error>> {
    let value = ctx
        .client
        .call("release/active", json!({ "channel": channel }))
        .await?;
    let resp: GetActiveResponse = serde_json::from_value(value)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&resp.release)),
        OutputFormat::Table => {
            let release = &resp.release;
            println!("Active {} release", resp.channel);
            println!("  Version:  {}", release.version);
            println!("  Artifact: {}", release.artifact_ref);
            println!("  Size:     {}", format_file_size(release.file_size));
            println!("  Released: {}", release.release_date.to_rfc3339());
            if !release.release_notes.is_empty() {
                println!();
                println!("{}", release.release_notes);
            }
        }
    }
    Ok(())
}

/// `launchpad info`: the update-check payload launchers poll.
pub async fn info(ctx: &Context, channel: Channel) -> Result<(), Box<dyn std::error::Error>> {
    let value = ctx
        .client
        .call("release/active_info", json!({ "channel": channel }))
        .await?;
    let info: ActiveReleaseInfo = serde_json::from_value(value)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&info)),
        OutputFormat::Table => {
            println!("Version:     {}", info.version);
            println!("DownloadUrl: {}", info.download_url);
            println!("FileSize:    {}", format_file_size(info.file_size));
        }
    }
    Ok(())
}

/// `launchpad history`: every release on a channel, newest first.
pub async fn history(ctx: &Context, channel: Channel) -> Result<(), Box<dyn std::error::Error>> {
    let value = ctx
        .client
        .call("release/history", json!({ "channel": channel }))
        .await?;
    let resp: GetHistoryResponse = serde_json::from_value(value)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&resp.releases)),
        OutputFormat::Table => {
            if resp.releases.is_empty() {
                println!("No releases on the {} channel.", resp.channel);
            } else {
                let rows: Vec<ReleaseRow> = resp.releases.iter().map(ReleaseRow::from).collect();
                println!("{}", format_table(&rows));
                println!("{} release(s)", resp.count);
            }
        }
    }
    Ok(())
}

/// `launchpad activate`: make an existing version the active one.
pub async fn activate(
    ctx: &Context,
    channel: Channel,
    version: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    change(ctx, "release/activate", channel, version).await
}

/// `launchpad delete`: remove a version and its artifact.
pub async fn delete(
    ctx: &Context,
    channel: Channel,
    version: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    change(ctx, "release/delete", channel, version).await
}

async fn change(
    ctx: &Context,
    method: &str,
    channel: Channel,
    version: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let value = ctx
        .client
        .call(method, json!({ "channel": channel, "version": version }))
        .await?;
    let resp: VersionChangeResponse = serde_json::from_value(value)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&resp)),
        OutputFormat::Table => println!("{}", resp.message),
    }
    Ok(())
}

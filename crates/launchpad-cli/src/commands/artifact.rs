// crates/launchpad-cli/src/commands/artifact.rs
//
// `launchpad {upload, fetch}`: artifact transfer commands.

use std::path::{Path, PathBuf};

use launchpad_core::Channel;
use launchpad_rpc::handlers::artifact::UploadResponse;

use super::Context;
use crate::output::{format_json, OutputFormat};

/// `launchpad upload`: stream an archive to the daemon as the new active release.
pub async fn upload(
    ctx: &Context,
    channel: Channel,
    version: &str,
    notes: Option<&str>,
    notes_file: Option<&Path>,
    file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let notes = match (notes, notes_file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => tokio::fs::read_to_string(path).await?,
        (None, None) => String::new(),
    };

    if ctx.format == OutputFormat::Table {
        println!("Uploading {} as {} {}...", file.display(), channel, version);
    }
    let value = ctx.client.upload(channel, version, &notes, file).await?;
    let resp: UploadResponse = serde_json::from_value(value)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&resp)),
        OutputFormat::Table => {
            println!("{}", resp.message);
            println!("  Artifact:     {}", resp.artifact_ref);
            println!("  Size:         {}", resp.file_size_formatted);
            println!("  Download URL: {}", resp.download_url);
        }
    }
    Ok(())
}

/// `launchpad fetch`: download a release's artifact.
pub async fn fetch(
    ctx: &Context,
    channel: Channel,
    version: &str,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dest = output.unwrap_or_else(|| PathBuf::from(format!("{}_{}.bin", channel, version)));
    let written = ctx.client.fetch(channel, version, &dest).await?;

    match ctx.format {
        OutputFormat::Json => println!(
            "{}",
            format_json(&serde_json::json!({
                "channel": channel,
                "version": version,
                "path": dest.display().to_string(),
                "bytes": written,
            }))
        ),
        OutputFormat::Table => println!("Wrote {} bytes to {}", written, dest.display()),
    }
    Ok(())
}

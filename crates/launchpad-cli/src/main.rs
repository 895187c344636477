// crates/launchpad-cli/src/main.rs
//
// CLI entrypoint for the Launchpad operator tools.
//
// Provides subcommands for inspecting channel catalogs, uploading and
// fetching artifacts, switching or deleting releases, and checking the
// daemon's health.

mod commands;
mod output;
mod rpc_client;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::Context;
use launchpad_core::Channel;
use output::OutputFormat;
use rpc_client::RpcClient;

/// Launchpad CLI: manage game and launcher releases.
#[derive(Parser, Debug)]
#[command(
    name = "launchpad",
    version = "0.1.0",
    about = "Launchpad CLI for publishing game and launcher releases"
)]
struct Cli {
    /// Daemon endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8000")]
    rpc: String,

    /// Admin bearer token, required for upload, activate, delete and sweep.
    #[arg(long, global = true, env = "LAUNCHPAD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the active release of a channel.
    Active {
        /// Channel: game or launcher.
        #[arg(long)]
        channel: Channel,
    },

    /// Show the update-check payload launchers receive.
    Info {
        #[arg(long)]
        channel: Channel,
    },

    /// List every release of a channel, newest first.
    History {
        #[arg(long)]
        channel: Channel,
    },

    /// Upload an archive as the channel's new active release.
    Upload {
        #[arg(long)]
        channel: Channel,
        /// Version label for the release.
        #[arg(long)]
        version: String,
        /// Release notes text.
        #[arg(long, conflicts_with = "notes_file")]
        notes: Option<String>,
        /// Read release notes from a file.
        #[arg(long)]
        notes_file: Option<PathBuf>,
        /// Archive to upload.
        file: PathBuf,
    },

    /// Download a release's artifact.
    Fetch {
        #[arg(long)]
        channel: Channel,
        #[arg(long)]
        version: String,
        /// Destination path (default: <channel>_<version>.bin).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Make an existing version the active release.
    Activate {
        #[arg(long)]
        channel: Channel,
        #[arg(long)]
        version: String,
    },

    /// Delete a release and its artifact.
    Delete {
        #[arg(long)]
        channel: Channel,
        #[arg(long)]
        version: String,
    },

    /// Remove stored artifacts no release references.
    Sweep {
        #[arg(long)]
        channel: Channel,
    },

    /// Display daemon health and per-channel summary.
    Status,

    /// Print the SHA-256 digest of a token for the daemon's admin_token_sha256.
    HashToken {
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let ctx = Context {
        client: RpcClient::new(&cli.rpc, cli.token.clone()),
        format: OutputFormat::from_flag(cli.json),
    };

    match &cli.command {
        Commands::Active { channel } => commands::release::active(&ctx, *channel).await?,
        Commands::Info { channel } => commands::release::info(&ctx, *channel).await?,
        Commands::History { channel } => commands::release::history(&ctx, *channel).await?,
        Commands::Upload {
            channel,
            version,
            notes,
            notes_file,
            file,
        } => {
            commands::artifact::upload(
                &ctx,
                *channel,
                version,
                notes.as_deref(),
                notes_file.as_deref(),
                file,
            )
            .await?
        }
        Commands::Fetch {
            channel,
            version,
            output,
        } => commands::artifact::fetch(&ctx, *channel, version, output.clone()).await?,
        Commands::Activate { channel, version } => {
            commands::release::activate(&ctx, *channel, version).await?
        }
        Commands::Delete { channel, version } => {
            commands::release::delete(&ctx, *channel, version).await?
        }
        Commands::Sweep { channel } => commands::admin::sweep(&ctx, *channel).await?,
        Commands::Status => commands::status::run(&ctx).await?,
        Commands::HashToken { token } => commands::token::run(token)?,
    }

    Ok(())
}

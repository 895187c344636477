// crates/launchpad-daemon/src/main.rs
//
// Binary entrypoint for the Launchpad release daemon.
//
// Parses CLI arguments, loads configuration, initializes tracing,
// opens the catalog and artifact stores, and serves the release API
// until interrupted.

mod config;

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use config::{expand_tilde, LaunchpadConfig};

use launchpad_catalog::ReleaseService;
use launchpad_core::Channel;
use launchpad_rpc::{LaunchpadRpcServer, RpcConfig, TokenAuthorizer};
use launchpad_store::{FsArtifactStore, JsonCatalogStore};

/// Launchpad daemon: serves game and launcher releases.
#[derive(Parser, Debug)]
#[command(name = "launchpad-daemon", version = "0.1.0", about = "Launchpad release daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.launchpad/config.toml")]
    config: String,

    /// Override the RPC port from the config file.
    #[arg(long)]
    rpc_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config_path = expand_tilde(&args.config);

    // The log level lives in the config, so load it before the subscriber
    // exists and report the outcome afterwards.
    let (mut config, load_error) = match LaunchpadConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (LaunchpadConfig::default(), Some(e.to_string())),
    };
    config.apply_env();
    if let Some(port) = args.rpc_port {
        config.rpc_port = port;
    }

    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    match load_error {
        None => tracing::info!("Loaded configuration from {}", config_path),
        Some(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path,
            e
        ),
    }

    tracing::info!("Launchpad Daemon v0.1.0");
    tracing::info!("Data directory: {}", config.data_dir);
    tracing::info!("Artifact directory: {}", config.artifact_dir);
    tracing::info!("Public base URL: {}", config.base_url);

    let policy = config.format_policy()?;
    tracing::info!(
        "Accepted archive formats: {}",
        policy
            .allowed()
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let catalogs = JsonCatalogStore::open(expand_tilde(&config.data_dir))?;
    let artifacts = FsArtifactStore::open(expand_tilde(&config.artifact_dir))?;
    tracing::info!(
        "Stores opened (catalogs at {}, artifacts at {})",
        catalogs.data_dir().display(),
        artifacts.root().display()
    );

    let service = Arc::new(ReleaseService::new(
        Arc::new(catalogs),
        Arc::new(artifacts),
        policy,
        config.base_url.clone(),
    ));

    // Artifacts left behind by a failed catalog write are cleared at startup.
    for channel in Channel::ALL {
        match service.manager().sweep_orphans(channel).await {
            Ok(removed) if !removed.is_empty() => tracing::info!(
                "Removed {} orphaned {} artifact(s)",
                removed.len(),
                channel
            ),
            Ok(_) => {}
            Err(e) => tracing::warn!(
                "Orphan sweep for {} skipped, no artifacts removed: {}",
                channel,
                e
            ),
        }
    }

    let authorizer = TokenAuthorizer::from_hex_digests(&config.admin_token_sha256);
    if authorizer.is_empty() {
        tracing::warn!(
            "No admin token digests configured; uploads, activation and deletion are disabled"
        );
    }

    let rpc_config = RpcConfig {
        host: config.rpc_host.clone(),
        port: config.rpc_port,
        max_upload_bytes: config.max_upload_bytes,
    };
    let server = LaunchpadRpcServer::new(rpc_config, service, Arc::new(authorizer))
        .with_start_time(Instant::now());

    server.start(shutdown_signal()).await?;

    tracing::info!("Launchpad daemon shut down gracefully");
    Ok(())
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

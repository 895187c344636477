// crates/launchpad-daemon/src/config.rs
//
// Runtime configuration for the Launchpad daemon.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::fs;

use launchpad_core::{ArchiveFormat, FormatPolicy, ReleaseError};

/// Environment variable overriding `base_url`.
pub const BASE_URL_ENV: &str = "LAUNCHPAD_BASE_URL";

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchpadConfig {
    /// Directory holding the per-channel catalog documents.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory holding uploaded artifacts.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Host address for the RPC server.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port for the RPC server.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Public URL prefix clients download from; `DownloadUrl` is
    /// `{base_url}/downloads/{artifact}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Archive formats accepted on upload: "zip", "gzip", "xz", "zstd".
    #[serde(default = "default_allowed_formats")]
    pub allowed_formats: Vec<String>,

    /// Hex SHA-256 digests of the admin bearer tokens.
    /// When empty (default), every mutation is refused.
    #[serde(default)]
    pub admin_token_sha256: Vec<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> String {
    "~/.launchpad/data".to_string()
}

fn default_artifact_dir() -> String {
    "~/.launchpad/downloads".to_string()
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    8000
}

fn default_base_url() -> String {
    "http://localhost:8000/launchpad".to_string()
}

fn default_max_upload_bytes() -> u64 {
    5 * 1024 * 1024 * 1024
}

fn default_allowed_formats() -> Vec<String> {
    vec!["zip".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            artifact_dir: default_artifact_dir(),
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            base_url: default_base_url(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_formats: default_allowed_formats(),
            admin_token_sha256: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl LaunchpadConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: LaunchpadConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Apply `LAUNCHPAD_BASE_URL` if it is set and non-empty.
    pub fn apply_env(&mut self) {
        self.apply_base_url_override(std::env::var(BASE_URL_ENV).ok());
    }

    fn apply_base_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
    }

    /// Build the upload format allow-list. Unknown names are an error.
    pub fn format_policy(&self) -> Result<FormatPolicy, ReleaseError> {
        let formats = self
            .allowed_formats
            .iter()
            .map(|name| name.parse::<ArchiveFormat>())
            .collect::<Result<Vec<_>, _>>()?;
        if formats.is_empty() {
            return Err(ReleaseError::InvalidInput(
                "allowed_formats must name at least one archive format".to_string(),
            ));
        }
        Ok(FormatPolicy::new(formats))
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}

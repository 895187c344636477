// crates/launchpad-cli/src/output.rs
//
// Output formatting utilities for the Launchpad CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

use launchpad_core::{format_file_size, Release};
use launchpad_rpc::handlers::node::ChannelHealth;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// One row of `launchpad history`.
#[derive(Debug, Tabled)]
pub struct ReleaseRow {
    #[tabled(rename = "Version")]
    pub version: String,
    #[tabled(rename = "Active")]
    pub active: String,
    #[tabled(rename = "Size")]
    pub size: String,
    #[tabled(rename = "Released")]
    pub released: String,
    #[tabled(rename = "Artifact")]
    pub artifact: String,
    #[tabled(rename = "Notes")]
    pub notes: String,
}

impl From<&Release> for ReleaseRow {
    fn from(release: &Release) -> Self {
        Self {
            version: release.version.clone(),
            active: if release.is_active { "*" } else { "" }.to_string(),
            size: format_file_size(release.file_size),
            released: release.release_date.format("%Y-%m-%d %H:%M UTC").to_string(),
            artifact: release.artifact_ref.to_string(),
            notes: truncate(first_line(&release.release_notes), 48),
        }
    }
}

/// One row of `launchpad status`.
#[derive(Debug, Tabled)]
pub struct ChannelRow {
    #[tabled(rename = "Channel")]
    pub channel: String,
    #[tabled(rename = "Catalog")]
    pub catalog: String,
    #[tabled(rename = "Releases")]
    pub releases: usize,
    #[tabled(rename = "Active")]
    pub active: String,
}

impl From<&ChannelHealth> for ChannelRow {
    fn from(health: &ChannelHealth) -> Self {
        Self {
            channel: health.channel.clone(),
            catalog: if health.catalog_ok { "ok" } else { "unreadable" }.to_string(),
            releases: health.releases,
            active: health.active_version.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}

/// Truncate to `max_chars` characters, appending "..." if truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

// crates/launchpad-core/src/release.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactRef;

/// One uploaded version of a channel's artifact, plus its metadata.
///
/// The serialized shape is the catalog document format: `artifact_ref` is
/// stored under `download_url`, which is the field name existing catalogs use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Opaque version token, unique within the channel. Compared by equality only.
    pub version: String,
    /// Stored artifact name, derived from channel and version.
    #[serde(rename = "download_url")]
    pub artifact_ref: ArtifactRef,
    /// Free-form notes shown to players.
    #[serde(default)]
    pub release_notes: String,
    /// Artifact size in bytes, measured at upload time.
    #[serde(default)]
    pub file_size: u64,
    /// Creation time. Never changes after the release is created.
    #[serde(with = "timestamp", default = "timestamp::unix_epoch")]
    pub release_date: DateTime<Utc>,
    /// Whether this is the version currently advertised to clients.
    #[serde(default)]
    pub is_active: bool,
}

impl Release {
    /// Build a freshly uploaded release. New uploads are active.
    pub fn new(
        version: impl Into<String>,
        artifact_ref: ArtifactRef,
        release_notes: impl Into<String>,
        file_size: u64,
        release_date: DateTime<Utc>,
    ) -> Self {
        Self {
            version: version.into(),
            artifact_ref,
            release_notes: release_notes.into(),
            file_size,
            release_date,
            is_active: true,
        }
    }
}

/// The projection launchers poll to check for updates.
///
/// Key names are PascalCase because deployed launchers parse exactly these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActiveReleaseInfo {
    pub version: String,
    pub download_url: String,
    pub release_notes: String,
    pub file_size: u64,
}

impl ActiveReleaseInfo {
    /// Project a release into the update-check shape, resolving its download URL
    /// against the public base URL.
    pub fn from_release(release: &Release, base_url: &str) -> Self {
        Self {
            version: release.version.clone(),
            download_url: release.artifact_ref.download_url(base_url),
            release_notes: release.release_notes.clone(),
            file_size: release.file_size,
        }
    }
}

/// Human-readable byte count: "512 bytes", "1.5 KB", "2.0 MB", "1.1 GB".
pub fn format_file_size(size_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size_bytes >= GB {
        format!("{:.1} GB", size_bytes as f64 / GB as f64)
    } else if size_bytes >= MB {
        format!("{:.1} MB", size_bytes as f64 / MB as f64)
    } else if size_bytes >= KB {
        format!("{:.1} KB", size_bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", size_bytes)
    }
}

/// Serde adapter for `release_date`.
///
/// Writes RFC 3339 with a `Z` suffix. Reads RFC 3339, and also the naive
/// `YYYY-MM-DDTHH:MM:SS[.ffffff]` form older catalogs contain, taken as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid release_date: {}", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    pub fn unix_epoch() -> DateTime<Utc> {
        DateTime::<Utc>::default()
    }
}

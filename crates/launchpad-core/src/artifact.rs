// crates/launchpad-core/src/artifact.rs
//
// Artifact naming and format detection.
//
// Stored artifact names are generated from channel + version only. Client
// filenames never reach the filesystem, and every name read back from a
// catalog is re-validated before a store touches it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::AsyncRead;
use uuid::Uuid;

use crate::channel::Channel;
use crate::error::ReleaseError;

/// Number of leading payload bytes needed to recognize every supported format.
pub const MAGIC_LEN: usize = 6;

/// Maximum accepted length of a version token, in bytes.
pub const MAX_VERSION_LEN: usize = 128;

// ---------------------------------------------------------------------------
// ArtifactRef
// ---------------------------------------------------------------------------

/// Name of a stored artifact, e.g. `game-v1.4.2.zip`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    /// Derive the artifact name for a channel/version/format triple.
    ///
    /// Shape: `{channel}-v{slug}.{ext}`. The slug keeps `[A-Za-z0-9._-]`,
    /// replaces everything else with `_` and drops leading dots. When that
    /// changes the version, or the version already ends in something shaped
    /// like the suffix, a short SHA-256 prefix of the raw version is appended.
    /// A name without the suffix is therefore always the literal version, and
    /// two versions never share a slug.
    pub fn derive(channel: Channel, version: &str, format: ArchiveFormat) -> Self {
        let mut slug: String = version
            .chars()
            .map(|c| if is_name_char(c) { c } else { '_' })
            .collect::<String>()
            .trim_start_matches('.')
            .to_string();
        if slug.is_empty() {
            slug.push('_');
        }
        if slug != version || has_digest_suffix(version) {
            let digest = Sha256::digest(version.as_bytes());
            slug = format!("{}-{}", slug, &hex::encode(digest)[..8]);
        }
        Self(format!("{}-v{}.{}", channel.as_str(), slug, format.extension()))
    }

    /// Parse an externally supplied name (e.g. a download path segment).
    pub fn parse(raw: &str) -> Result<Self, ReleaseError> {
        let candidate = Self(raw.to_string());
        candidate.validate()?;
        Ok(candidate)
    }

    /// Wrap a name without validation. Stores call [`ArtifactRef::validate`] on use.
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Check the name is a single, non-hidden path component of safe characters.
    pub fn validate(&self) -> Result<&str, ReleaseError> {
        let name = self.0.as_str();
        let safe = !name.is_empty()
            && !name.starts_with('.')
            && name.len() <= MAX_VERSION_LEN * 2
            && name.chars().all(is_name_char);
        if safe {
            Ok(name)
        } else {
            Err(ReleaseError::InvalidInput(format!("invalid artifact name: {:?}", name)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this name lives in the given channel's namespace.
    pub fn belongs_to(&self, channel: Channel) -> bool {
        self.0
            .strip_prefix(channel.as_str())
            .is_some_and(|rest| rest.starts_with("-v"))
    }

    /// Absolute URL clients download this artifact from.
    ///
    /// Refs that are already absolute `http(s)` URLs pass through unchanged.
    pub fn download_url(&self, base_url: &str) -> String {
        if self.0.starts_with("http://") || self.0.starts_with("https://") {
            return self.0.clone();
        }
        format!("{}/downloads/{}", base_url.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Length of the `-{hash8}` suffix `derive` appends.
const DIGEST_SUFFIX_LEN: usize = 9;

/// Whether `s` ends in `-` followed by eight hex digits (either case, since
/// artifact directories may live on case-insensitive filesystems).
fn has_digest_suffix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= DIGEST_SUFFIX_LEN && {
        let tail = &bytes[bytes.len() - DIGEST_SUFFIX_LEN..];
        tail[0] == b'-' && tail[1..].iter().all(u8::is_ascii_hexdigit)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Trim and validate a version token.
pub fn normalize_version(raw: &str) -> Result<String, ReleaseError> {
    let version = raw.trim();
    if version.is_empty() {
        return Err(ReleaseError::InvalidInput("version is required".to_string()));
    }
    if version.len() > MAX_VERSION_LEN {
        return Err(ReleaseError::InvalidInput(format!(
            "version is longer than {} bytes",
            MAX_VERSION_LEN
        )));
    }
    if version.chars().any(char::is_control) {
        return Err(ReleaseError::InvalidInput(
            "version contains control characters".to_string(),
        ));
    }
    Ok(version.to_string())
}

// ---------------------------------------------------------------------------
// ArchiveFormat
// ---------------------------------------------------------------------------

/// Archive formats an artifact may be uploaded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Zip,
    Gzip,
    Xz,
    Zstd,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Gzip => "gz",
            ArchiveFormat::Xz => "xz",
            ArchiveFormat::Zstd => "zst",
        }
    }

    /// Recognize a format from the leading bytes of a payload.
    pub fn sniff(head: &[u8]) -> Option<ArchiveFormat> {
        const SIGNATURES: &[(&[u8], ArchiveFormat)] = &[
            (b"PK\x03\x04", ArchiveFormat::Zip),
            // Empty archive: end-of-central-directory record only.
            (b"PK\x05\x06", ArchiveFormat::Zip),
            (b"\x1f\x8b", ArchiveFormat::Gzip),
            (b"\xfd7zXZ\x00", ArchiveFormat::Xz),
            (b"\x28\xb5\x2f\xfd", ArchiveFormat::Zstd),
        ];
        SIGNATURES
            .iter()
            .find(|(magic, _)| head.starts_with(magic))
            .map(|(_, format)| *format)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Gzip => "gzip",
            ArchiveFormat::Xz => "xz",
            ArchiveFormat::Zstd => "zstd",
        };
        f.write_str(name)
    }
}

impl FromStr for ArchiveFormat {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "gzip" | "gz" => Ok(ArchiveFormat::Gzip),
            "xz" => Ok(ArchiveFormat::Xz),
            "zstd" | "zst" => Ok(ArchiveFormat::Zstd),
            other => Err(ReleaseError::InvalidInput(format!(
                "unknown archive format: {}",
                other
            ))),
        }
    }
}

/// The archive-format allow-list applied to uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPolicy {
    allowed: Vec<ArchiveFormat>,
}

impl FormatPolicy {
    pub fn new(allowed: Vec<ArchiveFormat>) -> Self {
        Self { allowed }
    }

    pub fn allowed(&self) -> &[ArchiveFormat] {
        &self.allowed
    }

    /// Classify a payload by its leading bytes and check it against the allow-list.
    pub fn check(&self, head: &[u8]) -> Result<ArchiveFormat, ReleaseError> {
        if head.is_empty() {
            return Err(ReleaseError::InvalidInput("artifact payload is empty".to_string()));
        }
        let format = ArchiveFormat::sniff(head).ok_or_else(|| {
            ReleaseError::InvalidInput("artifact is not a recognized archive".to_string())
        })?;
        if !self.allowed.contains(&format) {
            let allowed: Vec<String> = self.allowed.iter().map(|f| f.to_string()).collect();
            return Err(ReleaseError::InvalidInput(format!(
                "{} archives are not allowed (allowed: {})",
                format,
                allowed.join(", ")
            )));
        }
        Ok(format)
    }
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self::new(vec![ArchiveFormat::Zip])
    }
}

// ---------------------------------------------------------------------------
// Staging and reading
// ---------------------------------------------------------------------------

/// A payload written to the store's staging area but not yet visible under a ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    pub id: Uuid,
    pub size: u64,
}

/// An open artifact ready to be streamed to a client.
pub struct ArtifactStream {
    pub artifact_ref: ArtifactRef,
    pub size: u64,
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
}

impl fmt::Debug for ArtifactStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStream")
            .field("artifact_ref", &self.artifact_ref)
            .field("size", &self.size)
            .finish()
    }
}

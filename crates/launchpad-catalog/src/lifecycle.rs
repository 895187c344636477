// crates/launchpad-catalog/src/lifecycle.rs
//
// ReleaseManager: the only writer of channel catalogs.
//
// Every mutation runs as one load -> compute -> replace cycle under the
// channel's lock. Artifact bytes are staged before the lock is taken and
// committed under it, always before the catalog that references them is
// replaced. A failure between the two leaves an orphaned artifact, never a
// catalog entry without its artifact.

use std::io::Cursor;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{info, warn};

use launchpad_core::error::ReleaseError;
use launchpad_core::traits::{ArtifactStore, CatalogStore};
use launchpad_core::{
    normalize_version, ArtifactRef, Catalog, Channel, FormatPolicy, Release, StagedArtifact,
    MAGIC_LEN,
};

use crate::locks::ChannelLocks;

pub struct ReleaseManager {
    catalogs: Arc<dyn CatalogStore>,
    artifacts: Arc<dyn ArtifactStore>,
    policy: FormatPolicy,
    locks: ChannelLocks,
}

impl ReleaseManager {
    pub fn new(
        catalogs: Arc<dyn CatalogStore>,
        artifacts: Arc<dyn ArtifactStore>,
        policy: FormatPolicy,
    ) -> Self {
        Self {
            catalogs,
            artifacts,
            policy,
            locks: ChannelLocks::new(),
        }
    }

    pub fn policy(&self) -> &FormatPolicy {
        &self.policy
    }

    // -----------------------------------------------------------------------
    // create_or_replace
    // -----------------------------------------------------------------------

    /// Store a new artifact for `version` and make it the active release.
    ///
    /// An existing entry with the same version is replaced wholesale. The
    /// payload's format is taken from its leading bytes and checked against
    /// the allow-list before anything is written.
    pub async fn create_or_replace(
        &self,
        channel: Channel,
        version: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
        release_notes: &str,
    ) -> Result<Release, ReleaseError> {
        let version = normalize_version(version)?;

        let head = read_head(source).await?;
        let format = self.policy.check(&head)?;
        let artifact = ArtifactRef::derive(channel, &version, format);

        // Long uploads stream into staging without holding the channel lock.
        let mut payload = Cursor::new(head).chain(source);
        let staged = self.artifacts.stage(&mut payload).await?;

        let _guard = self.locks.lock(channel).await;

        let mut catalog = match self.catalogs.load(channel).await {
            Ok(catalog) => catalog,
            Err(e) => {
                self.discard_staged(staged).await;
                return Err(e);
            }
        };

        let file_size = self.artifacts.commit(staged, &artifact).await?;
        let release = Release::new(
            version.as_str(),
            artifact.clone(),
            release_notes,
            file_size,
            Utc::now(),
        );
        let replaced = catalog.upsert_active(release.clone());
        self.catalogs.replace(channel, &catalog).await?;

        if let Some(previous) = &replaced {
            if previous.artifact_ref != artifact {
                self.delete_unreferenced(channel, &catalog, &previous.artifact_ref)
                    .await;
            }
        }

        info!(
            channel = %channel,
            version = %release.version,
            artifact = %release.artifact_ref,
            file_size = release.file_size,
            replaced = replaced.is_some(),
            "Release uploaded"
        );
        Ok(release)
    }

    // -----------------------------------------------------------------------
    // activate
    // -----------------------------------------------------------------------

    /// Make `version` the channel's single active release. Idempotent.
    pub async fn activate(&self, channel: Channel, version: &str) -> Result<Release, ReleaseError> {
        let version = version.trim();
        let _guard = self.locks.lock(channel).await;

        let mut catalog = self.catalogs.load(channel).await?;
        let release = catalog.activate(version)?.clone();
        self.catalogs.replace(channel, &catalog).await?;

        info!(channel = %channel, version = %release.version, "Release activated");
        Ok(release)
    }

    // -----------------------------------------------------------------------
    // delete
    // -----------------------------------------------------------------------

    /// Remove an inactive release and its artifact.
    ///
    /// The catalog entry is removed even if the artifact cannot be; the
    /// leaked artifact is logged and left for [`ReleaseManager::sweep_orphans`].
    pub async fn delete(&self, channel: Channel, version: &str) -> Result<Release, ReleaseError> {
        let version = version.trim();
        let _guard = self.locks.lock(channel).await;

        let mut catalog = self.catalogs.load(channel).await?;
        let removed = catalog.remove(version)?;
        self.catalogs.replace(channel, &catalog).await?;

        self.delete_unreferenced(channel, &catalog, &removed.artifact_ref)
            .await;

        info!(
            channel = %channel,
            version = %removed.version,
            remaining = catalog.len(),
            "Release deleted"
        );
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // sweep_orphans
    // -----------------------------------------------------------------------

    /// Delete every stored artifact of `channel` the catalog does not
    /// reference. Returns the removed refs.
    ///
    /// An unparseable catalog document fails the sweep with `Io` and deletes
    /// nothing: an empty reading of it would mark every artifact an orphan.
    pub async fn sweep_orphans(&self, channel: Channel) -> Result<Vec<ArtifactRef>, ReleaseError> {
        let _guard = self.locks.lock(channel).await;

        let catalog = self.catalogs.load_strict(channel).await?;
        let stored = self.artifacts.list(channel).await?;

        let mut removed = Vec::new();
        for artifact in stored {
            if is_referenced(&catalog, &artifact) {
                continue;
            }
            match self.artifacts.delete(&artifact).await {
                Ok(()) => removed.push(artifact),
                Err(e) => warn!(
                    channel = %channel,
                    artifact = %artifact,
                    "Failed to remove orphaned artifact: {}",
                    e
                ),
            }
        }

        info!(channel = %channel, removed = removed.len(), "Orphan sweep finished");
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Best-effort removal of an artifact the committed catalog no longer
    /// references. Failures leave an orphan behind and are only logged.
    async fn delete_unreferenced(&self, channel: Channel, catalog: &Catalog, artifact: &ArtifactRef) {
        if is_referenced(catalog, artifact) {
            return;
        }
        if let Err(e) = self.artifacts.delete(artifact).await {
            warn!(
                channel = %channel,
                artifact = %artifact,
                "Artifact left behind after catalog update: {}",
                e
            );
        }
    }

    async fn discard_staged(&self, staged: StagedArtifact) {
        if let Err(e) = self.artifacts.discard(staged).await {
            warn!("Failed to discard staged upload: {}", e);
        }
    }
}

fn is_referenced(catalog: &Catalog, artifact: &ArtifactRef) -> bool {
    catalog
        .releases()
        .iter()
        .any(|r| &r.artifact_ref == artifact)
}

/// Read up to `MAGIC_LEN` leading bytes. Shorter payloads return what they have.
async fn read_head(source: &mut (dyn AsyncRead + Send + Unpin)) -> Result<Vec<u8>, ReleaseError> {
    let mut head = vec![0u8; MAGIC_LEN];
    let mut filled = 0;
    while filled < MAGIC_LEN {
        let n = source
            .read(&mut head[filled..])
            .await
            .map_err(|e| ReleaseError::Io(format!("failed to read upload: {}", e)))?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    head.truncate(filled);
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_store::{FsArtifactStore, JsonCatalogStore};
    use tempfile::TempDir;

    const ZIP: &[u8] = b"PK\x03\x04 zipped build";

    fn manager(tmp: &TempDir) -> ReleaseManager {
        let catalogs = JsonCatalogStore::open(tmp.path().join("data")).unwrap();
        let artifacts = FsArtifactStore::open(tmp.path().join("downloads")).unwrap();
        ReleaseManager::new(Arc::new(catalogs), Arc::new(artifacts), FormatPolicy::default())
    }

    #[tokio::test]
    async fn read_head_handles_short_payloads() {
        assert_eq!(read_head(&mut &b"PK"[..]).await.unwrap(), b"PK");
        assert!(read_head(&mut &b""[..]).await.unwrap().is_empty());
        assert_eq!(read_head(&mut &ZIP[..]).await.unwrap(), &ZIP[..MAGIC_LEN]);
    }

    #[tokio::test]
    async fn upload_trims_version() {
        let tmp = TempDir::new().unwrap();
        let manager = manager(&tmp);

        let release = manager
            .create_or_replace(Channel::Game, "  1.0 \n", &mut &ZIP[..], "")
            .await
            .unwrap();
        assert_eq!(release.version, "1.0");
        assert_eq!(release.artifact_ref.as_str(), "game-v1.0.zip");
        assert_eq!(release.file_size, ZIP.len() as u64);
        assert!(tmp.path().join("downloads/game-v1.0.zip").exists());
    }

    #[tokio::test]
    async fn rejected_payload_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let manager = manager(&tmp);

        let err = manager
            .create_or_replace(Channel::Game, "1.0", &mut &b"\x1f\x8b gzip"[..], "")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(!tmp.path().join("data/versions.json").exists());
        let staged = std::fs::read_dir(tmp.path().join("downloads/.staging"))
            .unwrap()
            .count();
        assert_eq!(staged, 0);
    }

    #[tokio::test]
    async fn format_change_removes_previous_artifact() {
        let tmp = TempDir::new().unwrap();
        let catalogs = JsonCatalogStore::open(tmp.path().join("data")).unwrap();
        let artifacts = FsArtifactStore::open(tmp.path().join("downloads")).unwrap();
        let policy = FormatPolicy::new(vec![
            launchpad_core::ArchiveFormat::Zip,
            launchpad_core::ArchiveFormat::Zstd,
        ]);
        let manager = ReleaseManager::new(Arc::new(catalogs), Arc::new(artifacts), policy);

        manager
            .create_or_replace(Channel::Launcher, "3.0", &mut &ZIP[..], "")
            .await
            .unwrap();
        let release = manager
            .create_or_replace(Channel::Launcher, "3.0", &mut &b"\x28\xb5\x2f\xfd zstd"[..], "")
            .await
            .unwrap();

        assert_eq!(release.artifact_ref.as_str(), "launcher-v3.0.zst");
        assert!(!tmp.path().join("downloads/launcher-v3.0.zip").exists());
        assert!(tmp.path().join("downloads/launcher-v3.0.zst").exists());
    }

    #[tokio::test]
    async fn activate_and_delete_trim_version() {
        let tmp = TempDir::new().unwrap();
        let manager = manager(&tmp);
        manager
            .create_or_replace(Channel::Game, "1.0", &mut &ZIP[..], "")
            .await
            .unwrap();
        manager
            .create_or_replace(Channel::Game, "1.1", &mut &ZIP[..], "")
            .await
            .unwrap();

        manager.activate(Channel::Game, " 1.0 ").await.unwrap();
        let removed = manager.delete(Channel::Game, "1.1 ").await.unwrap();
        assert_eq!(removed.version, "1.1");
    }
}

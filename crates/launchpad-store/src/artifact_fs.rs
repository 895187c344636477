// crates/launchpad-store/src/artifact_fs.rs
//
// Filesystem artifact store.
//
// Layout:
//   {root}/{channel}-v{slug}.{ext}   committed artifacts
//   {root}/.staging/{uuid}.part      uploads in progress
//
// Uploads are streamed into the staging directory and published with a
// rename, so a committed name always refers to a complete file.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use launchpad_core::error::ReleaseError;
use launchpad_core::traits::ArtifactStore;
use launchpad_core::{ArtifactRef, ArtifactStream, Channel, StagedArtifact};

use crate::catalog_file::sync_dir;

const STAGING_DIR: &str = ".staging";
const CHUNK_SIZE: usize = 64 * 1024;

/// Artifact store rooted at a downloads directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
    staging: PathBuf,
}

impl FsArtifactStore {
    /// Open the store, creating the root directory if needed.
    ///
    /// Leftover staged uploads from a previous process are removed: nothing
    /// can still be writing to them.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ReleaseError> {
        let root = root.into();
        let staging = root.join(STAGING_DIR);

        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| {
                ReleaseError::Io(format!("failed to clear {}: {}", staging.display(), e))
            })?;
        }
        fs::create_dir_all(&staging).map_err(|e| {
            ReleaseError::Io(format!("failed to create {}: {}", staging.display(), e))
        })?;

        Ok(Self { root, staging })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn staged_path(&self, id: &Uuid) -> PathBuf {
        self.staging.join(format!("{}.part", id))
    }

    fn artifact_path(&self, artifact: &ArtifactRef) -> Result<PathBuf, ReleaseError> {
        Ok(self.root.join(artifact.validate()?))
    }

    async fn copy_into(
        path: &Path,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> std::io::Result<u64> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut size = 0u64;
        loop {
            let n = source.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await?;
            size += n as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        Ok(size)
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn stage(
        &self,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<StagedArtifact, ReleaseError> {
        let id = Uuid::now_v7();
        let path = self.staged_path(&id);

        match Self::copy_into(&path, source).await {
            Ok(size) => Ok(StagedArtifact { id, size }),
            Err(e) => {
                let _ = tokio::fs::remove_file(&path).await;
                Err(ReleaseError::Io(format!("failed to stage upload: {}", e)))
            }
        }
    }

    async fn commit(
        &self,
        staged: StagedArtifact,
        artifact: &ArtifactRef,
    ) -> Result<u64, ReleaseError> {
        let from = self.staged_path(&staged.id);
        let to = match self.artifact_path(artifact) {
            Ok(path) => path,
            Err(e) => {
                let _ = tokio::fs::remove_file(&from).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&from, &to).await {
            let _ = tokio::fs::remove_file(&from).await;
            return Err(ReleaseError::Io(format!(
                "failed to publish artifact {}: {}",
                artifact, e
            )));
        }
        sync_dir(&self.root);

        tracing::debug!(artifact = %artifact, size = staged.size, "Artifact committed");
        Ok(staged.size)
    }

    async fn discard(&self, staged: StagedArtifact) -> Result<(), ReleaseError> {
        match tokio::fs::remove_file(self.staged_path(&staged.id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ReleaseError::Io(format!("failed to discard staged upload: {}", e))),
        }
    }

    async fn get(&self, artifact: &ArtifactRef) -> Result<ArtifactStream, ReleaseError> {
        let path = self.artifact_path(artifact)?;
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReleaseError::NotFound(format!("artifact {} not found", artifact)))
            }
            Err(e) => {
                return Err(ReleaseError::Io(format!(
                    "failed to open artifact {}: {}",
                    artifact, e
                )))
            }
        };
        let size = file.metadata().await?.len();

        Ok(ArtifactStream {
            artifact_ref: artifact.clone(),
            size,
            reader: Box::new(file),
        })
    }

    async fn delete(&self, artifact: &ArtifactRef) -> Result<(), ReleaseError> {
        let path = self.artifact_path(artifact)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(artifact = %artifact, "Artifact deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ReleaseError::Io(format!(
                "failed to delete artifact {}: {}",
                artifact, e
            ))),
        }
    }

    async fn list(&self, channel: Channel) -> Result<Vec<ArtifactRef>, ReleaseError> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            ReleaseError::Io(format!("failed to list {}: {}", self.root.display(), e))
        })?;

        let mut refs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Ok(artifact) = ArtifactRef::parse(name) {
                if artifact.belongs_to(channel) {
                    refs.push(artifact);
                }
            }
        }
        refs.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(refs)
    }
}

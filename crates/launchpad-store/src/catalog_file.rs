// crates/launchpad-store/src/catalog_file.rs
//
// JSON-document catalog persistence, one file per channel in the data directory.
//
// Replacement is atomic: the new document is written to a temporary file in
// the same directory, fsynced, and renamed over the old one. A reader sees the
// old document or the new one, never a truncated file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use launchpad_core::error::ReleaseError;
use launchpad_core::traits::CatalogStore;
use launchpad_core::{Catalog, Channel};

/// Catalog store backed by `versions.json` / `launcher_versions.json`.
#[derive(Debug, Clone)]
pub struct JsonCatalogStore {
    data_dir: PathBuf,
}

impl JsonCatalogStore {
    /// Open the store rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, ReleaseError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|e| {
            ReleaseError::Io(format!(
                "failed to create data directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the channel's catalog document.
    pub fn document_path(&self, channel: Channel) -> PathBuf {
        self.data_dir.join(channel.catalog_file_name())
    }
}

/// What `read_document` found on disk.
enum Document {
    Absent,
    Parsed(Catalog),
    Corrupt(String),
}

impl JsonCatalogStore {
    async fn read_document(&self, channel: Channel) -> Result<Document, ReleaseError> {
        let path = self.document_path(channel);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::Absent),
            Err(e) => {
                return Err(ReleaseError::Io(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        match serde_json::from_slice::<Catalog>(&bytes) {
            Ok(catalog) => Ok(Document::Parsed(catalog)),
            Err(e) => Ok(Document::Corrupt(format!(
                "catalog document {} is unreadable: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl CatalogStore for JsonCatalogStore {
    async fn load(&self, channel: Channel) -> Result<Catalog, ReleaseError> {
        match self.read_document(channel).await? {
            Document::Absent => Ok(Catalog::new()),
            Document::Parsed(catalog) => Ok(catalog),
            Document::Corrupt(reason) => {
                tracing::warn!(channel = %channel, "{}, treating it as empty", reason);
                Ok(Catalog::new())
            }
        }
    }

    async fn load_strict(&self, channel: Channel) -> Result<Catalog, ReleaseError> {
        match self.read_document(channel).await? {
            Document::Absent => Ok(Catalog::new()),
            Document::Parsed(catalog) => Ok(catalog),
            Document::Corrupt(reason) => Err(ReleaseError::Io(reason)),
        }
    }

    async fn replace(&self, channel: Channel, catalog: &Catalog) -> Result<(), ReleaseError> {
        let json = serde_json::to_vec_pretty(catalog)?;
        let dir = self.data_dir.clone();
        let path = self.document_path(channel);

        tokio::task::spawn_blocking(move || atomic_write(&dir, &path, &json))
            .await
            .map_err(|e| ReleaseError::Io(format!("catalog write task failed: {}", e)))??;

        tracing::debug!(channel = %channel, releases = catalog.len(), "Catalog replaced");
        Ok(())
    }
}

/// Write `data` to `path` through a synced temporary file in `dir`.
fn atomic_write(dir: &Path, path: &Path, data: &[u8]) -> Result<(), ReleaseError> {
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        ReleaseError::Io(format!("failed to create temp file in {}: {}", dir.display(), e))
    })?;
    temp.write_all(data)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| ReleaseError::Io(format!("failed to write catalog temp file: {}", e)))?;
    temp.persist(path).map_err(|e| {
        ReleaseError::Io(format!("failed to persist {}: {}", path.display(), e.error))
    })?;
    sync_dir(dir);
    Ok(())
}

/// Flush a directory entry update. Not every platform supports opening a
/// directory for sync, so failures are ignored.
pub(crate) fn sync_dir(dir: &Path) {
    if let Ok(handle) = fs::File::open(dir) {
        let _ = handle.sync_all();
    }
}

// crates/launchpad-core/src/traits.rs

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::artifact::{ArtifactRef, ArtifactStream, StagedArtifact};
use crate::catalog::Catalog;
use crate::channel::Channel;
use crate::error::ReleaseError;

/// Persistence of one catalog document per channel.
///
/// Implemented by launchpad-store (`JsonCatalogStore`).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Load a channel's catalog. A missing or unparseable document loads as empty.
    async fn load(&self, channel: Channel) -> Result<Catalog, ReleaseError>;

    /// Load a channel's catalog, failing with `Io` when a document exists but
    /// cannot be parsed. Callers that delete data based on what the catalog
    /// does not reference must use this instead of `load`.
    async fn load_strict(&self, channel: Channel) -> Result<Catalog, ReleaseError> {
        self.load(channel).await
    }

    /// Replace a channel's catalog in one step. Concurrent `load` calls see
    /// either the previous document or this one, never a partial write.
    async fn replace(&self, channel: Channel, catalog: &Catalog) -> Result<(), ReleaseError>;
}

/// Storage of artifact blobs by name.
///
/// Implemented by launchpad-store (`FsArtifactStore`).
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stream a payload into the staging area and measure it.
    async fn stage(
        &self,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<StagedArtifact, ReleaseError>;

    /// Publish a staged payload under `artifact`, replacing any blob already
    /// stored there. Returns the stored size. The staged payload is consumed
    /// whether or not the commit succeeds.
    async fn commit(
        &self,
        staged: StagedArtifact,
        artifact: &ArtifactRef,
    ) -> Result<u64, ReleaseError>;

    /// Drop a staged payload that will not be committed.
    async fn discard(&self, staged: StagedArtifact) -> Result<(), ReleaseError>;

    /// Stage and commit in one call.
    async fn put(
        &self,
        artifact: &ArtifactRef,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64, ReleaseError> {
        let staged = self.stage(source).await?;
        self.commit(staged, artifact).await
    }

    /// Open a stored artifact for reading. Fails `NotFound` if absent.
    async fn get(&self, artifact: &ArtifactRef) -> Result<ArtifactStream, ReleaseError>;

    /// Remove a stored artifact. Removing a missing artifact succeeds.
    async fn delete(&self, artifact: &ArtifactRef) -> Result<(), ReleaseError>;

    /// Names of every stored artifact in the channel's namespace.
    async fn list(&self, channel: Channel) -> Result<Vec<ArtifactRef>, ReleaseError>;
}

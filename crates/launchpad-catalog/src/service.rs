// crates/launchpad-catalog/src/service.rs
//
// ReleaseService: the operations the transport boundary calls.
//
// Mutations take an `authorized` flag the boundary computed from its own
// authorization predicate. The service performs no authentication; it only
// refuses mutations the boundary did not authorize.

use std::sync::Arc;

use tokio::io::AsyncRead;

use launchpad_core::error::ReleaseError;
use launchpad_core::traits::{ArtifactStore, CatalogStore};
use launchpad_core::{
    ActiveReleaseInfo, ArtifactRef, ArtifactStream, Channel, FormatPolicy, Release,
};

use crate::lifecycle::ReleaseManager;
use crate::query::ReleaseQuery;

pub struct ReleaseService {
    manager: ReleaseManager,
    query: ReleaseQuery,
    artifacts: Arc<dyn ArtifactStore>,
    base_url: String,
}

impl ReleaseService {
    pub fn new(
        catalogs: Arc<dyn CatalogStore>,
        artifacts: Arc<dyn ArtifactStore>,
        policy: FormatPolicy,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            manager: ReleaseManager::new(catalogs.clone(), artifacts.clone(), policy),
            query: ReleaseQuery::new(catalogs),
            artifacts,
            base_url: base_url.into(),
        }
    }

    pub fn manager(&self) -> &ReleaseManager {
        &self.manager
    }

    pub fn query(&self) -> &ReleaseQuery {
        &self.query
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Public reads
    // -----------------------------------------------------------------------

    pub async fn get_active(&self, channel: Channel) -> Result<Release, ReleaseError> {
        self.query
            .get_active(channel)
            .await?
            .ok_or_else(|| no_active_release(channel))
    }

    pub async fn get_history(&self, channel: Channel) -> Result<Vec<Release>, ReleaseError> {
        self.query.get_history(channel).await
    }

    pub async fn active_info(&self, channel: Channel) -> Result<ActiveReleaseInfo, ReleaseError> {
        self.query
            .active_info(channel, &self.base_url)
            .await?
            .ok_or_else(|| no_active_release(channel))
    }

    /// Open the artifact of a catalogued release.
    pub async fn fetch_artifact(
        &self,
        channel: Channel,
        version: &str,
    ) -> Result<ArtifactStream, ReleaseError> {
        let release = self.query.find(channel, version).await?.ok_or_else(|| {
            ReleaseError::NotFound(format!("version {} not found in {}", version.trim(), channel))
        })?;
        self.artifacts.get(&release.artifact_ref).await
    }

    /// Open an artifact by its stored name, as linked from `DownloadUrl`.
    ///
    /// Only names some catalog entry references are served, so orphans and
    /// staged uploads are never reachable.
    pub async fn download(&self, name: &str) -> Result<ArtifactStream, ReleaseError> {
        let missing = || ReleaseError::NotFound(format!("artifact {} not found", name));
        let artifact = ArtifactRef::parse(name).map_err(|_| missing())?;
        let channel = Channel::ALL
            .into_iter()
            .find(|c| artifact.belongs_to(*c))
            .ok_or_else(missing)?;

        let referenced = self
            .query
            .get_history(channel)
            .await?
            .iter()
            .any(|r| r.artifact_ref == artifact);
        if !referenced {
            return Err(missing());
        }
        self.artifacts.get(&artifact).await
    }

    // -----------------------------------------------------------------------
    // Authorized mutations
    // -----------------------------------------------------------------------

    pub async fn upload(
        &self,
        channel: Channel,
        version: &str,
        release_notes: &str,
        source: &mut (dyn AsyncRead + Send + Unpin),
        authorized: bool,
    ) -> Result<Release, ReleaseError> {
        require(authorized)?;
        self.manager
            .create_or_replace(channel, version, source, release_notes)
            .await
    }

    pub async fn activate(
        &self,
        channel: Channel,
        version: &str,
        authorized: bool,
    ) -> Result<Release, ReleaseError> {
        require(authorized)?;
        self.manager.activate(channel, version).await
    }

    pub async fn delete(
        &self,
        channel: Channel,
        version: &str,
        authorized: bool,
    ) -> Result<Release, ReleaseError> {
        require(authorized)?;
        self.manager.delete(channel, version).await
    }

    pub async fn sweep_orphans(
        &self,
        channel: Channel,
        authorized: bool,
    ) -> Result<Vec<ArtifactRef>, ReleaseError> {
        require(authorized)?;
        self.manager.sweep_orphans(channel).await
    }
}

fn require(authorized: bool) -> Result<(), ReleaseError> {
    if authorized {
        Ok(())
    } else {
        Err(ReleaseError::Unauthorized(
            "this operation requires an administrator token".to_string(),
        ))
    }
}

fn no_active_release(channel: Channel) -> ReleaseError {
    ReleaseError::NotFound(format!("no active release for channel {}", channel))
}

// crates/launchpad-catalog/src/query.rs
//
// Read-only projections over channel catalogs. Takes no lock: the catalog
// store guarantees a load sees a whole document.

use std::sync::Arc;

use launchpad_core::error::ReleaseError;
use launchpad_core::traits::CatalogStore;
use launchpad_core::{ActiveReleaseInfo, Channel, Release};

#[derive(Clone)]
pub struct ReleaseQuery {
    catalogs: Arc<dyn CatalogStore>,
}

impl ReleaseQuery {
    pub fn new(catalogs: Arc<dyn CatalogStore>) -> Self {
        Self { catalogs }
    }

    /// The channel's active release, or `None` for an empty channel.
    pub async fn get_active(&self, channel: Channel) -> Result<Option<Release>, ReleaseError> {
        let catalog = self.catalogs.load(channel).await?;
        Ok(catalog.active().cloned())
    }

    /// Every release, newest `release_date` first.
    pub async fn get_history(&self, channel: Channel) -> Result<Vec<Release>, ReleaseError> {
        let catalog = self.catalogs.load(channel).await?;
        Ok(catalog.history())
    }

    /// The update-check projection of the active release.
    pub async fn active_info(
        &self,
        channel: Channel,
        base_url: &str,
    ) -> Result<Option<ActiveReleaseInfo>, ReleaseError> {
        Ok(self
            .get_active(channel)
            .await?
            .map(|release| ActiveReleaseInfo::from_release(&release, base_url)))
    }

    /// Look up a release by version.
    pub async fn find(&self, channel: Channel, version: &str) -> Result<Option<Release>, ReleaseError> {
        let catalog = self.catalogs.load(channel).await?;
        Ok(catalog.get(version.trim()).cloned())
    }
}

// crates/launchpad-core/src/catalog.rs
//
// The per-channel release catalog and its transitions.
//
// Invariants after every transition below:
//   - at most one release is active
//   - a non-empty catalog has exactly one active release
//   - version keys are unique
//
// Transitions are pure; persistence and locking live in the store and the
// lifecycle manager.

use serde::{Deserialize, Serialize};

use crate::error::ReleaseError;
use crate::release::Release;

/// Ordered collection of a channel's releases, in insertion order.
///
/// Serialized as a bare JSON array, which is the catalog document format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    releases: Vec<Release>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap releases as loaded from storage. No invariant is enforced here;
    /// the next mutating transition normalizes the active flag.
    pub fn from_releases(releases: Vec<Release>) -> Self {
        Self { releases }
    }

    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    pub fn into_releases(self) -> Vec<Release> {
        self.releases
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn get(&self, version: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.version == version)
    }

    pub fn contains(&self, version: &str) -> bool {
        self.get(version).is_some()
    }

    /// The active release, if any.
    pub fn active(&self) -> Option<&Release> {
        self.releases.iter().find(|r| r.is_active)
    }

    /// Insert a release as the new active entry.
    ///
    /// Any entry with the same version is removed wholesale and returned;
    /// every other entry is deactivated. The new entry goes to the end.
    pub fn upsert_active(&mut self, mut release: Release) -> Option<Release> {
        let replaced = self.take_version(&release.version).into_iter().next();

        for existing in &mut self.releases {
            existing.is_active = false;
        }
        release.is_active = true;
        self.releases.push(release);
        replaced
    }

    /// Make `version` the single active release. Re-activating the active
    /// release succeeds without changing anything.
    pub fn activate(&mut self, version: &str) -> Result<&Release, ReleaseError> {
        let idx = self
            .releases
            .iter()
            .position(|r| r.version == version)
            .ok_or_else(|| not_found(version))?;

        for (i, release) in self.releases.iter_mut().enumerate() {
            release.is_active = i == idx;
        }
        Ok(&self.releases[idx])
    }

    /// Remove an inactive release and return it.
    ///
    /// The active release is refused with `InvalidState`, which also covers
    /// the sole release of a well-formed catalog.
    pub fn remove(&mut self, version: &str) -> Result<Release, ReleaseError> {
        if !self.contains(version) {
            return Err(not_found(version));
        }
        if self.releases.iter().any(|r| r.version == version && r.is_active) {
            let reason = if self.releases.len() == 1 {
                format!("version {} is the only release and cannot be deleted", version)
            } else {
                format!(
                    "cannot delete active version {}; activate another version first",
                    version
                )
            };
            return Err(ReleaseError::InvalidState(reason));
        }

        let removed = self
            .take_version(version)
            .into_iter()
            .next()
            .ok_or_else(|| not_found(version))?;

        // A hand-edited catalog may arrive with nothing active.
        if !self.releases.is_empty() && self.active().is_none() {
            if let Some(last) = self.releases.last_mut() {
                last.is_active = true;
            }
        }
        Ok(removed)
    }

    /// Releases sorted by `release_date`, newest first. Equal timestamps keep
    /// insertion order.
    pub fn history(&self) -> Vec<Release> {
        let mut sorted = self.releases.clone();
        sorted.sort_by(|a, b| b.release_date.cmp(&a.release_date));
        sorted
    }

    /// Pull every entry keyed `version` out of the catalog, first one first.
    /// A well-formed catalog yields at most one; a hand-edited document may
    /// carry duplicates, and they all go.
    fn take_version(&mut self, version: &str) -> Vec<Release> {
        let (taken, kept): (Vec<Release>, Vec<Release>) = std::mem::take(&mut self.releases)
            .into_iter()
            .partition(|r| r.version == version);
        self.releases = kept;
        taken
    }

    /// Verify the catalog invariants, describing the first violation found.
    pub fn check_invariants(&self) -> Result<(), ReleaseError> {
        let active = self.releases.iter().filter(|r| r.is_active).count();
        if self.releases.is_empty() && active != 0 {
            return Err(ReleaseError::InvalidState(
                "empty catalog with an active release".to_string(),
            ));
        }
        if !self.releases.is_empty() && active != 1 {
            return Err(ReleaseError::InvalidState(format!(
                "expected exactly one active release, found {}",
                active
            )));
        }
        for (i, release) in self.releases.iter().enumerate() {
            if self.releases[..i].iter().any(|r| r.version == release.version) {
                return Err(ReleaseError::InvalidState(format!(
                    "duplicate version {}",
                    release.version
                )));
            }
        }
        Ok(())
    }
}

fn not_found(version: &str) -> ReleaseError {
    ReleaseError::NotFound(format!("version {} not found", version))
}

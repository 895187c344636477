// crates/launchpad-catalog/tests/lifecycle_scenarios.rs
//
// End-to-end release lifecycle scenarios against the real JSON catalog and
// filesystem artifact stores.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

use launchpad_catalog::{ReleaseManager, ReleaseService};
use launchpad_core::traits::{ArtifactStore, CatalogStore};
use launchpad_core::{
    ArtifactRef, ArtifactStream, Catalog, Channel, FormatPolicy, ReleaseError, StagedArtifact,
};
use launchpad_store::{FsArtifactStore, JsonCatalogStore};

const BUILD_A: &[u8] = b"PK\x03\x04 build a";
const BUILD_B: &[u8] = b"PK\x03\x04 build b with more bytes";

struct Harness {
    tmp: TempDir,
    catalogs: Arc<JsonCatalogStore>,
    artifacts: Arc<FsArtifactStore>,
    service: ReleaseService,
}

impl Harness {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let catalogs = Arc::new(JsonCatalogStore::open(tmp.path().join("data")).unwrap());
        let artifacts = Arc::new(FsArtifactStore::open(tmp.path().join("downloads")).unwrap());
        let service = ReleaseService::new(
            catalogs.clone(),
            artifacts.clone(),
            FormatPolicy::default(),
            "http://localhost:8000",
        );
        Self {
            tmp,
            catalogs,
            artifacts,
            service,
        }
    }

    async fn upload(&self, channel: Channel, version: &str, bytes: &[u8]) -> Result<launchpad_core::Release, ReleaseError> {
        let mut source = bytes;
        self.service
            .upload(channel, version, "", &mut source, true)
            .await
    }

    async fn catalog(&self, channel: Channel) -> Catalog {
        self.catalogs.load(channel).await.unwrap()
    }

    fn artifact_exists(&self, name: &str) -> bool {
        self.tmp.path().join("downloads").join(name).exists()
    }
}

fn active_flags(catalog: &Catalog) -> Vec<(String, bool)> {
    catalog
        .releases()
        .iter()
        .map(|r| (r.version.clone(), r.is_active))
        .collect()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_activates_newest_and_history_lists_newest_first() {
    let h = Harness::new();

    h.upload(Channel::Game, "1.0", BUILD_A).await.unwrap();
    assert_eq!(active_flags(&h.catalog(Channel::Game).await), vec![("1.0".to_string(), true)]);

    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    h.upload(Channel::Game, "1.1", BUILD_A).await.unwrap();
    assert_eq!(
        active_flags(&h.catalog(Channel::Game).await),
        vec![("1.0".to_string(), false), ("1.1".to_string(), true)]
    );

    let history: Vec<String> = h
        .service
        .get_history(Channel::Game)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.version)
        .collect();
    assert_eq!(history, vec!["1.1", "1.0"]);
}

#[tokio::test]
async fn deleting_active_release_is_refused() {
    let h = Harness::new();
    h.upload(Channel::Game, "1.0", BUILD_A).await.unwrap();
    h.upload(Channel::Game, "1.1", BUILD_A).await.unwrap();
    let before = h.catalog(Channel::Game).await;

    let err = h.service.delete(Channel::Game, "1.1", true).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_state");
    assert_eq!(h.catalog(Channel::Game).await, before);
    assert!(h.artifact_exists("game-v1.1.zip"));
}

#[tokio::test]
async fn delete_after_activating_another_release() {
    let h = Harness::new();
    h.upload(Channel::Game, "1.0", BUILD_A).await.unwrap();
    h.upload(Channel::Game, "1.1", BUILD_A).await.unwrap();

    h.service.activate(Channel::Game, "1.0", true).await.unwrap();
    h.service.delete(Channel::Game, "1.1", true).await.unwrap();

    assert_eq!(
        active_flags(&h.catalog(Channel::Game).await),
        vec![("1.0".to_string(), true)]
    );
    assert!(!h.artifact_exists("game-v1.1.zip"));
    assert!(h.artifact_exists("game-v1.0.zip"));
}

#[tokio::test]
async fn reupload_replaces_entry_wholesale() {
    let h = Harness::new();
    let first = h.upload(Channel::Game, "2.0", BUILD_A).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = h.upload(Channel::Game, "2.0", BUILD_B).await.unwrap();

    let catalog = h.catalog(Channel::Game).await;
    assert_eq!(catalog.len(), 1);
    let entry = catalog.get("2.0").unwrap();
    assert_eq!(entry.file_size, BUILD_B.len() as u64);
    assert!(entry.release_date > first.release_date);
    assert_eq!(
        entry.release_date.timestamp_micros(),
        second.release_date.timestamp_micros()
    );

    let mut stream = h.service.fetch_artifact(Channel::Game, "2.0").await.unwrap();
    let mut bytes = Vec::new();
    stream.reader.read_to_end(&mut bytes).await.unwrap();
    assert_eq!(bytes, BUILD_B);
}

// ---------------------------------------------------------------------------
// Boundaries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_version_is_invalid_input() {
    let h = Harness::new();
    let err = h.upload(Channel::Game, "   ", BUILD_A).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_input");
    assert!(h.catalog(Channel::Game).await.is_empty());
}

#[tokio::test]
async fn disallowed_format_is_invalid_input() {
    let h = Harness::new();
    let err = h
        .upload(Channel::Game, "1.0", b"\xfd7zXZ\x00 xz build")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_input");

    let err = h.upload(Channel::Game, "1.0", b"").await.unwrap_err();
    assert_eq!(err.kind(), "invalid_input");
    assert!(h.catalog(Channel::Game).await.is_empty());
}

#[tokio::test]
async fn active_on_empty_channel_is_not_found() {
    let h = Harness::new();
    assert_eq!(h.service.get_active(Channel::Launcher).await.unwrap_err().kind(), "not_found");
    assert_eq!(h.service.active_info(Channel::Launcher).await.unwrap_err().kind(), "not_found");
}

#[tokio::test]
async fn unknown_channel_is_not_found() {
    let err = "beta".parse::<Channel>().unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn unauthorized_mutations_change_nothing() {
    let h = Harness::new();
    h.upload(Channel::Game, "1.0", BUILD_A).await.unwrap();
    h.upload(Channel::Game, "1.1", BUILD_A).await.unwrap();
    let before = h.catalog(Channel::Game).await;

    let mut source = BUILD_B;
    let err = h
        .service
        .upload(Channel::Game, "1.2", "", &mut source, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
    assert_eq!(
        h.service.activate(Channel::Game, "1.0", false).await.unwrap_err().kind(),
        "unauthorized"
    );
    assert_eq!(
        h.service.delete(Channel::Game, "1.0", false).await.unwrap_err().kind(),
        "unauthorized"
    );
    assert_eq!(
        h.service.sweep_orphans(Channel::Game, false).await.unwrap_err().kind(),
        "unauthorized"
    );

    assert_eq!(h.catalog(Channel::Game).await, before);
    assert!(!h.artifact_exists("game-v1.2.zip"));
}

#[tokio::test]
async fn traversal_shaped_version_stays_in_artifact_dir() {
    let h = Harness::new();
    let release = h.upload(Channel::Game, "../../etc", BUILD_A).await.unwrap();

    let name = release.artifact_ref.as_str();
    assert!(!name.contains('/'));
    assert!(name.starts_with("game-v"));
    assert!(h.artifact_exists(name));
    assert!(!h.tmp.path().join("etc").exists());
}

#[tokio::test]
async fn channels_are_independent() {
    let h = Harness::new();
    h.upload(Channel::Game, "1.0", BUILD_A).await.unwrap();
    h.upload(Channel::Launcher, "1.0", BUILD_B).await.unwrap();

    let game = h.service.get_active(Channel::Game).await.unwrap();
    let launcher = h.service.get_active(Channel::Launcher).await.unwrap();
    assert_eq!(game.artifact_ref.as_str(), "game-v1.0.zip");
    assert_eq!(launcher.artifact_ref.as_str(), "launcher-v1.0.zip");
    assert_eq!(launcher.file_size, BUILD_B.len() as u64);
}

#[tokio::test]
async fn download_serves_only_catalogued_artifacts() {
    let h = Harness::new();
    h.upload(Channel::Game, "1.0", BUILD_A).await.unwrap();
    let mut source = BUILD_B;
    h.artifacts
        .put(&launchpad_core::ArtifactRef::new_unchecked("game-v9.9.zip"), &mut source)
        .await
        .unwrap();

    let stream = h.service.download("game-v1.0.zip").await.unwrap();
    assert_eq!(stream.size, BUILD_A.len() as u64);
    assert_eq!(h.service.download("game-v9.9.zip").await.unwrap_err().kind(), "not_found");
    assert_eq!(h.service.download("../data/versions.json").await.unwrap_err().kind(), "not_found");
    assert_eq!(h.service.download("notes.zip").await.unwrap_err().kind(), "not_found");
}

// ---------------------------------------------------------------------------
// Concurrency and invariants
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uploads_are_not_lost() {
    let h = Arc::new(Harness::new());

    let mut tasks = Vec::new();
    for i in 0..16 {
        let h = h.clone();
        tasks.push(tokio::spawn(async move {
            let version = format!("1.{}", i);
            h.upload(Channel::Game, &version, BUILD_A).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let catalog = h.catalog(Channel::Game).await;
    assert_eq!(catalog.len(), 16);
    catalog.check_invariants().unwrap();
    assert_eq!(h.artifacts.list(Channel::Game).await.unwrap().len(), 16);
}

#[tokio::test]
async fn invariant_holds_across_operation_sequence() {
    let h = Harness::new();
    let versions = ["a", "b", "c", "d"];

    for step in 0..32 {
        let version = versions[(step * 3 + step / 4) % versions.len()];
        let _ = match step % 4 {
            0 | 1 => h.upload(Channel::Launcher, version, BUILD_A).await.map(|_| ()),
            2 => h.service.activate(Channel::Launcher, version, true).await.map(|_| ()),
            _ => h.service.delete(Channel::Launcher, version, true).await.map(|_| ()),
        };
        let catalog = h.catalog(Channel::Launcher).await;
        catalog.check_invariants().unwrap();
    }
}

#[tokio::test]
async fn activate_twice_is_idempotent() {
    let h = Harness::new();
    h.upload(Channel::Game, "1.0", BUILD_A).await.unwrap();
    h.upload(Channel::Game, "1.1", BUILD_A).await.unwrap();

    h.service.activate(Channel::Game, "1.0", true).await.unwrap();
    let once = h.catalog(Channel::Game).await;
    h.service.activate(Channel::Game, "1.0", true).await.unwrap();
    assert_eq!(h.catalog(Channel::Game).await, once);
}

// ---------------------------------------------------------------------------
// Orphans
// ---------------------------------------------------------------------------

/// Catalog store whose `replace` can be switched to fail.
struct FlakyCatalogStore {
    inner: JsonCatalogStore,
    fail_replace: AtomicBool,
}

#[async_trait]
impl CatalogStore for FlakyCatalogStore {
    async fn load(&self, channel: Channel) -> Result<Catalog, ReleaseError> {
        self.inner.load(channel).await
    }

    async fn load_strict(&self, channel: Channel) -> Result<Catalog, ReleaseError> {
        self.inner.load_strict(channel).await
    }

    async fn replace(&self, channel: Channel, catalog: &Catalog) -> Result<(), ReleaseError> {
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(ReleaseError::Io("disk full".to_string()));
        }
        self.inner.replace(channel, catalog).await
    }
}

#[tokio::test]
async fn failed_catalog_replace_orphans_artifact_and_sweep_removes_it() {
    let tmp = TempDir::new().unwrap();
    let catalogs = Arc::new(FlakyCatalogStore {
        inner: JsonCatalogStore::open(tmp.path().join("data")).unwrap(),
        fail_replace: AtomicBool::new(false),
    });
    let artifacts = Arc::new(FsArtifactStore::open(tmp.path().join("downloads")).unwrap());
    let manager = ReleaseManager::new(catalogs.clone(), artifacts.clone(), FormatPolicy::default());

    manager
        .create_or_replace(Channel::Game, "1.0", &mut &BUILD_A[..], "")
        .await
        .unwrap();

    catalogs.fail_replace.store(true, Ordering::SeqCst);
    let err = manager
        .create_or_replace(Channel::Game, "1.1", &mut &BUILD_B[..], "")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "io_failure");

    // The catalog still describes the last committed state.
    let catalog = catalogs.load(Channel::Game).await.unwrap();
    assert_eq!(active_flags(&catalog), vec![("1.0".to_string(), true)]);
    assert!(tmp.path().join("downloads/game-v1.0.zip").exists());
    assert!(tmp.path().join("downloads/game-v1.1.zip").exists());

    catalogs.fail_replace.store(false, Ordering::SeqCst);
    let removed: Vec<String> = manager
        .sweep_orphans(Channel::Game)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.to_string())
        .collect();
    assert_eq!(removed, vec!["game-v1.1.zip"]);
    assert!(tmp.path().join("downloads/game-v1.0.zip").exists());
    assert!(!tmp.path().join("downloads/game-v1.1.zip").exists());
}

#[tokio::test]
async fn failed_same_format_reupload_keeps_old_entry_over_new_bytes() {
    let tmp = TempDir::new().unwrap();
    let catalogs = Arc::new(FlakyCatalogStore {
        inner: JsonCatalogStore::open(tmp.path().join("data")).unwrap(),
        fail_replace: AtomicBool::new(false),
    });
    let artifacts = Arc::new(FsArtifactStore::open(tmp.path().join("downloads")).unwrap());
    let manager = ReleaseManager::new(catalogs.clone(), artifacts.clone(), FormatPolicy::default());

    manager
        .create_or_replace(Channel::Game, "1.0", &mut &BUILD_A[..], "first")
        .await
        .unwrap();

    catalogs.fail_replace.store(true, Ordering::SeqCst);
    let err = manager
        .create_or_replace(Channel::Game, "1.0", &mut &BUILD_B[..], "second")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "io_failure");

    let catalog = catalogs.load(Channel::Game).await.unwrap();
    let entry = catalog.get("1.0").unwrap();
    assert_eq!(entry.file_size, BUILD_A.len() as u64);
    assert_eq!(entry.release_notes, "first");
    let on_disk = std::fs::read(tmp.path().join("downloads/game-v1.0.zip")).unwrap();
    assert_eq!(on_disk, BUILD_B);

    // The next successful upload brings the entry back in line.
    catalogs.fail_replace.store(false, Ordering::SeqCst);
    manager
        .create_or_replace(Channel::Game, "1.0", &mut &BUILD_B[..], "second")
        .await
        .unwrap();
    let catalog = catalogs.load(Channel::Game).await.unwrap();
    assert_eq!(catalog.get("1.0").unwrap().file_size, BUILD_B.len() as u64);
}

/// Artifact store whose `delete` always fails.
struct UndeletableArtifactStore {
    inner: FsArtifactStore,
}

#[async_trait]
impl ArtifactStore for UndeletableArtifactStore {
    async fn stage(
        &self,
        source: &mut (dyn tokio::io::AsyncRead + Send + Unpin),
    ) -> Result<StagedArtifact, ReleaseError> {
        self.inner.stage(source).await
    }

    async fn commit(&self, staged: StagedArtifact, artifact: &ArtifactRef) -> Result<u64, ReleaseError> {
        self.inner.commit(staged, artifact).await
    }

    async fn discard(&self, staged: StagedArtifact) -> Result<(), ReleaseError> {
        self.inner.discard(staged).await
    }

    async fn get(&self, artifact: &ArtifactRef) -> Result<ArtifactStream, ReleaseError> {
        self.inner.get(artifact).await
    }

    async fn delete(&self, _artifact: &ArtifactRef) -> Result<(), ReleaseError> {
        Err(ReleaseError::Io("permission denied".to_string()))
    }

    async fn list(&self, channel: Channel) -> Result<Vec<ArtifactRef>, ReleaseError> {
        self.inner.list(channel).await
    }
}

#[tokio::test]
async fn delete_removes_entry_even_when_artifact_cannot_be_removed() {
    let tmp = TempDir::new().unwrap();
    let catalogs = Arc::new(JsonCatalogStore::open(tmp.path().join("data")).unwrap());
    let artifacts = Arc::new(UndeletableArtifactStore {
        inner: FsArtifactStore::open(tmp.path().join("downloads")).unwrap(),
    });
    let manager = ReleaseManager::new(catalogs.clone(), artifacts, FormatPolicy::default());

    manager
        .create_or_replace(Channel::Game, "1.0", &mut &BUILD_A[..], "")
        .await
        .unwrap();
    manager
        .create_or_replace(Channel::Game, "1.1", &mut &BUILD_B[..], "")
        .await
        .unwrap();
    manager.activate(Channel::Game, "1.0").await.unwrap();

    let removed = manager.delete(Channel::Game, "1.1").await.unwrap();
    assert_eq!(removed.version, "1.1");

    let catalog = catalogs.load(Channel::Game).await.unwrap();
    assert_eq!(active_flags(&catalog), vec![("1.0".to_string(), true)]);
    // The artifact leaks until a sweep can remove it.
    assert!(tmp.path().join("downloads/game-v1.1.zip").exists());
}

/// Overwrite the first record's `release_date` with something unparseable.
fn corrupt_first_record(h: &Harness, channel: Channel) {
    let path = h.catalogs.document_path(channel);
    let mut doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    doc[0]["release_date"] = serde_json::Value::String("last tuesday".to_string());
    std::fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
}

#[tokio::test]
async fn sweep_refuses_a_corrupt_catalog() {
    let h = Harness::new();
    h.upload(Channel::Game, "1.0", BUILD_A).await.unwrap();
    h.upload(Channel::Game, "1.1", BUILD_B).await.unwrap();
    corrupt_first_record(&h, Channel::Game);

    // Reads still see an empty catalog.
    assert!(h.catalog(Channel::Game).await.is_empty());

    let err = h.service.sweep_orphans(Channel::Game, true).await.unwrap_err();
    assert_eq!(err.kind(), "io_failure");
    assert!(h.artifact_exists("game-v1.0.zip"));
    assert!(h.artifact_exists("game-v1.1.zip"));
}

#[tokio::test]
async fn sweep_refuses_a_truncated_catalog_on_every_pass() {
    let h = Harness::new();
    h.upload(Channel::Launcher, "3.0", BUILD_A).await.unwrap();
    std::fs::write(h.catalogs.document_path(Channel::Launcher), b"[{\"version\": \"3.0\",").unwrap();

    // A startup sweep runs per channel; repeated passes must stay harmless.
    for _ in 0..2 {
        for channel in Channel::ALL {
            let result = h.service.manager().sweep_orphans(channel).await;
            match channel {
                Channel::Launcher => assert_eq!(result.unwrap_err().kind(), "io_failure"),
                Channel::Game => assert!(result.unwrap().is_empty()),
            }
        }
    }
    assert!(h.artifact_exists("launcher-v3.0.zip"));
}

#[tokio::test]
async fn lookalike_versions_keep_separate_artifacts() {
    let h = Harness::new();
    let first = h.upload(Channel::Game, "1 0", BUILD_A).await.unwrap();
    // The literal spelling of the name "1 0" was stored under.
    let lookalike = first
        .artifact_ref
        .as_str()
        .strip_prefix("game-v")
        .and_then(|rest| rest.strip_suffix(".zip"))
        .unwrap()
        .to_string();
    let second = h.upload(Channel::Game, &lookalike, BUILD_B).await.unwrap();
    assert_ne!(first.artifact_ref, second.artifact_ref);

    for (version, expected) in [("1 0", BUILD_A), (lookalike.as_str(), BUILD_B)] {
        let mut stream = h.service.fetch_artifact(Channel::Game, version).await.unwrap();
        let mut bytes = Vec::new();
        stream.reader.read_to_end(&mut bytes).await.unwrap();
        assert_eq!(bytes, expected);
    }
}

#[tokio::test]
async fn sweep_leaves_other_channels_alone() {
    let h = Harness::new();
    h.upload(Channel::Launcher, "1.0", BUILD_A).await.unwrap();
    let mut source = BUILD_A;
    h.artifacts
        .put(&launchpad_core::ArtifactRef::new_unchecked("launcher-v0.1.zip"), &mut source)
        .await
        .unwrap();

    let removed = h.service.sweep_orphans(Channel::Game, true).await.unwrap();
    assert!(removed.is_empty());
    assert!(h.artifact_exists("launcher-v0.1.zip"));

    let removed = h.service.sweep_orphans(Channel::Launcher, true).await.unwrap();
    assert_eq!(removed.len(), 1);
    assert!(h.artifact_exists("launcher-v1.0.zip"));
}

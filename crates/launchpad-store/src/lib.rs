// crates/launchpad-store/src/lib.rs
//
// launchpad-store: Storage layer for Launchpad.
//
// Provides the JSON catalog document store (one document per channel,
// replaced atomically) and the filesystem artifact store (staged uploads
// published by rename).

pub mod artifact_fs;
pub mod catalog_file;

// Re-export key types for ergonomic access from downstream crates.
pub use artifact_fs::FsArtifactStore;
pub use catalog_file::JsonCatalogStore;

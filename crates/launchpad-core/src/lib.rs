// crates/launchpad-core/src/lib.rs
//
// launchpad-core: Core types, catalog transitions, and storage traits for
// Launchpad release distribution.
//
// This is the leaf crate every other crate in the workspace depends on. It
// owns the release data model, the invariant-preserving catalog transitions,
// artifact naming and format detection, the shared error type, and the
// storage traits the store crate implements.

pub mod artifact;
pub mod catalog;
pub mod channel;
pub mod error;
pub mod release;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use launchpad_core::Release;`

pub use artifact::{
    normalize_version, ArchiveFormat, ArtifactRef, ArtifactStream, FormatPolicy, StagedArtifact,
    MAGIC_LEN,
};
pub use catalog::Catalog;
pub use channel::Channel;
pub use error::ReleaseError;
pub use release::{format_file_size, ActiveReleaseInfo, Release};
pub use traits::{ArtifactStore, CatalogStore};

// crates/launchpad-catalog/src/lib.rs
//
// launchpad-catalog: Release lifecycle and queries for Launchpad.
//
// `ReleaseManager` owns every catalog mutation and the per-channel locks that
// serialize them. `ReleaseQuery` serves read-only projections. `ReleaseService`
// combines both behind the operations the transport boundary exposes.

pub mod lifecycle;
pub mod locks;
pub mod query;
pub mod service;

pub use lifecycle::ReleaseManager;
pub use locks::ChannelLocks;
pub use query::ReleaseQuery;
pub use service::ReleaseService;

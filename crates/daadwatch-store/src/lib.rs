//! daadwatch store - filesystem persistence
//!
//! - [`FsSnapshotStore`]: single-slot JSON snapshot with atomic replacement
//! - [`RunLock`]: advisory lock guarding the read-diff-write sequence

pub mod atomic;
pub mod errors;
pub mod lock;
pub mod snapshot_store;

pub use lock::RunLock;
pub use snapshot_store::FsSnapshotStore;

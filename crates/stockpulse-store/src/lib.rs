//! Snapshot persistence behind a minimal get/set interface.
//!
//! The pipeline writes one JSON-serializable snapshot per environment at a
//! single well-known key; the read endpoint fetches it back. Absence is a
//! valid state (no run has ever completed) and is reported as `Ok(None)`,
//! never as an error.

mod file;
mod memory;

use std::future::Future;

use thiserror::Error;

use stockpulse_core::Snapshot;

pub use file::FileStore;
pub use memory::MemoryStore;

/// The single well-known key the pipeline and read endpoint agree on.
pub const SNAPSHOT_KEY: &str = "stocks";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("snapshot serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("snapshot deserialization error: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Key-value snapshot storage.
///
/// Implementations must distinguish an absent key (`Ok(None)`) from a failed
/// read (`Err`).
pub trait SnapshotStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Snapshot>, StoreError>> + Send;

    fn set(
        &self,
        key: &str,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

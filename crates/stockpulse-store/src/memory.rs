use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use stockpulse_core::Snapshot;

use crate::{SnapshotStore, StoreError};

/// In-memory snapshot store for tests and embedded use.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, Snapshot>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Snapshot>, StoreError>> + Send {
        async move {
            let snapshot = self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .cloned();
            Ok(snapshot)
        }
    }

    fn set(
        &self,
        key: &str,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            self.inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key.to_string(), snapshot.clone());
            Ok(())
        }
    }
}

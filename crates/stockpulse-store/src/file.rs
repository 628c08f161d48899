use std::future::Future;
use std::path::{Path, PathBuf};

use stockpulse_core::Snapshot;

use crate::{SnapshotStore, StoreError};

/// JSON-file-backed snapshot store.
///
/// Each key maps to `<dir>/<sanitized-key>.json`; the well-known
/// [`crate::SNAPSHOT_KEY`] lands at `<dir>/stocks.json`. The directory is
/// created on first write.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }

    fn io_error(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Snapshot>, StoreError>> + Send {
        let path = self.path_for(key);
        async move {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "no snapshot file yet");
                    return Ok(None);
                }
                Err(e) => return Err(Self::io_error(&path, e)),
            };

            let snapshot = serde_json::from_slice(&bytes).map_err(StoreError::Deserialize)?;
            Ok(Some(snapshot))
        }
    }

    fn set(
        &self,
        key: &str,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let path = self.path_for(key);
        let dir = self.dir.clone();
        let encoded = serde_json::to_vec_pretty(snapshot).map_err(StoreError::Serialize);
        async move {
            let encoded = encoded?;
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| Self::io_error(&dir, e))?;
            tokio::fs::write(&path, encoded)
                .await
                .map_err(|e| Self::io_error(&path, e))?;
            tracing::debug!(path = %path.display(), "snapshot written");
            Ok(())
        }
    }
}

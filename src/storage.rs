//! Last-document storage and outside-change watching

use crate::core::config::project_dirs;
use crate::core::events::{EventSender, FrontEvent};
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the single stored slot
pub const STORAGE_KEY: &str = "lastDocument";

/// Shortest accepted watcher poll period
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// File-backed `lastDocument` slot
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
    /// Modification time of this process's last save
    own_write: Arc<Mutex<Option<SystemTime>>>,
}

impl DocumentStore {
    /// Store in the platform data directory
    pub fn open_default() -> anyhow::Result<Self> {
        let dirs = project_dirs()?;
        Ok(Self::at(dirs.data_dir().join(STORAGE_KEY)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            own_write: Arc::new(Mutex::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, value: &str) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&self.path, value).map_err(write_err)?;

        *self.own_write.lock() = self.modified();
        debug!(bytes = value.len(), "Document saved");
        Ok(())
    }

    /// Stored document; `None` when nothing (or an empty value) was saved
    pub fn load(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(value) if value.is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    pub fn watcher(&self, interval: Duration) -> StorageWatcher {
        let interval = if interval < MIN_POLL_INTERVAL {
            warn!(?interval, "Storage poll interval too short, using {:?}", MIN_POLL_INTERVAL);
            MIN_POLL_INTERVAL
        } else {
            interval
        };
        StorageWatcher {
            store: self.clone(),
            interval,
            last_seen: self.modified(),
        }
    }
}

/// Polls the slot for changes made by other instances
pub struct StorageWatcher {
    store: DocumentStore,
    interval: Duration,
    last_seen: Option<SystemTime>,
}

impl StorageWatcher {
    /// Whether the slot changed outside this process since the last check
    pub fn check(&mut self) -> bool {
        let modified = self.store.modified();
        if modified == self.last_seen {
            return false;
        }
        self.last_seen = modified;

        if modified.is_some() && modified == *self.store.own_write.lock() {
            return false;
        }

        matches!(self.store.load(), Ok(Some(_)))
    }

    pub async fn run(mut self, events: EventSender) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            if self.check() {
                info!("Stored document changed outside this instance");
                if events.send(FrontEvent::StorageChanged).is_err() {
                    return;
                }
            }
        }
    }
}

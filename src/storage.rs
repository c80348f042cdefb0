use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::{
    sync::{broadcast, Mutex as AsyncMutex},
    task::JoinHandle,
    time::interval,
};

use crate::infrastructure::lifetime::UnloadListener;

const CHANGE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access store file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("store file {path} is not valid JSON: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode store contents: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("store file {path} must contain a JSON object")]
    NotAnObject { path: String },
}

#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    path: Option<PathBuf>,
    values: Mutex<Map<String, Value>>,
    // Held across mutate+persist and across reload so the file and the map
    // never diverge; `values` alone serves reads.
    file: AsyncMutex<()>,
    changes: broadcast::Sender<StorageChange>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.inner.path)
            .field("keys", &self.inner.values.lock().len())
            .finish()
    }
}

impl Store {
    /// A missing file is an empty store; the file is created on the first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = read_values(&path).await?;
        tracing::debug!(
            target: "storage",
            path = %path.display(),
            keys = values.len(),
            "store opened"
        );
        Ok(Self::build(Some(path), values))
    }

    pub fn in_memory() -> Self {
        Self::build(None, Map::new())
    }

    fn build(path: Option<PathBuf>, values: Map<String, Value>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                path,
                values: Mutex::new(values),
                file: AsyncMutex::new(()),
                changes,
            }),
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.inner.values.lock().get(key).cloned())
    }

    pub async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.write(key, Some(value)).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.write(key, None).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.inner.changes.subscribe()
    }

    /// Returns the number of keys whose value differed from the file.
    pub async fn reload(&self) -> Result<usize, StorageError> {
        let Some(path) = self.inner.path.as_deref() else {
            return Ok(0);
        };
        let _file = self.inner.file.lock().await;
        let fresh = read_values(path).await?;

        let changes = {
            let mut values = self.inner.values.lock();
            let mut changes = Vec::new();
            for (key, old) in values.iter() {
                if !fresh.contains_key(key) {
                    changes.push(StorageChange {
                        key: key.clone(),
                        old_value: Some(old.clone()),
                        new_value: None,
                    });
                }
            }
            for (key, new) in fresh.iter() {
                let old = values.get(key);
                if old != Some(new) {
                    changes.push(StorageChange {
                        key: key.clone(),
                        old_value: old.cloned(),
                        new_value: Some(new.clone()),
                    });
                }
            }
            *values = fresh;
            changes
        };

        let changed = changes.len();
        for change in changes {
            self.announce(change);
        }
        Ok(changed)
    }

    pub fn spawn_watch(&self, period: Duration, mut lifetime: UnloadListener) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = lifetime.unloaded() => break,
                }
                if let Err(err) = store.reload().await {
                    tracing::warn!(target: "storage", error = %err, "failed to reload store");
                }
            }
            tracing::debug!(target: "storage", "store watcher stopped");
        })
    }

    async fn write(&self, key: &str, value: Option<Value>) -> Result<(), StorageError> {
        let _file = self.inner.file.lock().await;
        let (old_value, snapshot) = {
            let mut values = self.inner.values.lock();
            let old = match &value {
                Some(value) => values.insert(key.to_string(), value.clone()),
                None => values.remove(key),
            };
            (old, Value::Object(values.clone()))
        };

        if let Some(path) = self.inner.path.as_deref() {
            if let Err(err) = persist(path, &snapshot).await {
                self.rollback(key, old_value);
                return Err(err);
            }
        }

        if old_value != value {
            self.announce(StorageChange {
                key: key.to_string(),
                old_value,
                new_value: value,
            });
        }
        Ok(())
    }

    fn rollback(&self, key: &str, old_value: Option<Value>) {
        let mut values = self.inner.values.lock();
        match old_value {
            Some(old) => values.insert(key.to_string(), old),
            None => values.remove(key),
        };
    }

    fn announce(&self, change: StorageChange) {
        tracing::debug!(target: "storage", key = %change.key, "value changed");
        let _ = self.inner.changes.send(change);
    }
}

async fn read_values(path: &Path) -> Result<Map<String, Value>, StorageError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StorageError::NotAnObject {
            path: path.display().to_string(),
        }),
        Err(source) => Err(StorageError::Decode {
            path: path.display().to_string(),
            source,
        }),
    }
}

async fn persist(path: &Path, snapshot: &Value) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: path.display().to_string(),
        source,
    };
    let body = serde_json::to_vec_pretty(snapshot).map_err(StorageError::Encode)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

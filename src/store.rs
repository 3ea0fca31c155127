use crate::types::Connection;
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Worth retrying with backoff (lock contention, transient I/O).
    #[error("transient store failure: {0}")]
    Transient(String),
    /// Retrying will not help; the run fails loudly.
    #[error("permanent store failure: {0}")]
    Permanent(String),
}

/// Persistence boundary for finished connections.
///
/// The engine owns retry policy; implementations just report whether a
/// failure is transient or permanent.
pub trait ConnectionStore: Send + Sync {
    fn persist(
        &self,
        user_id: &str,
        connections: &[Connection],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<T: ConnectionStore> ConnectionStore for std::sync::Arc<T> {
    fn persist(
        &self,
        user_id: &str,
        connections: &[Connection],
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).persist(user_id, connections)
    }
}

/// In-memory store, used by tests and the evaluation binary.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Vec<Connection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Connection> {
        self.inner.lock().expect("memory store lock").clone()
    }
}

impl ConnectionStore for MemoryStore {
    async fn persist(&self, _user_id: &str, connections: &[Connection]) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::Permanent(e.to_string()))?;
        inner.extend_from_slice(connections);
        Ok(())
    }
}

#[derive(Serialize)]
struct StoreDocument<'a> {
    user_id: &'a str,
    connections: &'a [Connection],
}

/// Writes one JSON document per run, via a temp file and atomic rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ConnectionStore for JsonFileStore {
    async fn persist(&self, user_id: &str, connections: &[Connection]) -> Result<(), StoreError> {
        let doc = StoreDocument {
            user_id,
            connections,
        };
        let body = serde_json::to_vec_pretty(&doc)
            .map_err(|e| StoreError::Permanent(format!("encode connections: {e}")))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Transient(format!("create {}: {e}", parent.display())))?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| StoreError::Transient(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Transient(format!("rename to {}: {e}", self.path.display())))?;
        Ok(())
    }
}

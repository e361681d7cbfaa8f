use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tenses_core::model::{PackId, PackProgress, ProgressSnapshot, UserId};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Progress as exchanged with the remote record store.
///
/// Only the synchronized parts of a snapshot travel; the reserved review queue
/// stays on the device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteProgress {
    pub pack_progress: BTreeMap<PackId, PackProgress>,
    pub recently_completed: Vec<PackId>,
}

impl RemoteProgress {
    #[must_use]
    pub fn from_snapshot(snapshot: &ProgressSnapshot) -> Self {
        Self {
            pack_progress: snapshot.pack_progress_map().clone(),
            recently_completed: snapshot.recently_completed().to_vec(),
        }
    }

    #[must_use]
    pub fn into_snapshot(self) -> ProgressSnapshot {
        ProgressSnapshot::from_parts(self.pack_progress, self.recently_completed)
    }
}

/// Device-local string key-value storage.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Remote progress records keyed by user identity.
#[async_trait]
pub trait RemoteProgressStore: Send + Sync {
    /// Fetch the record for `user`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the user has no record yet, or
    /// another `StorageError` when the store cannot be reached.
    async fn read_one(&self, user: &UserId) -> Result<RemoteProgress, StorageError>;

    /// Insert or replace the record for `user`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write is rejected or fails.
    async fn upsert(&self, user: &UserId, progress: &RemoteProgress) -> Result<(), StorageError>;
}

/// Simple in-memory implementation of both stores for tests and offline use.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    values: Arc<Mutex<HashMap<String, String>>>,
    records: Arc<Mutex<HashMap<UserId, RemoteProgress>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[async_trait]
impl RemoteProgressStore for InMemoryRepository {
    async fn read_one(&self, user: &UserId) -> Result<RemoteProgress, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(user).cloned().ok_or(StorageError::NotFound)
    }

    async fn upsert(&self, user: &UserId, progress: &RemoteProgress) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(user.clone(), progress.clone());
        Ok(())
    }
}

/// Storage backends behind trait objects; the remote side is optional.
#[derive(Clone)]
pub struct Storage {
    pub local: Arc<dyn LocalStore>,
    pub remote: Option<Arc<dyn RemoteProgressStore>>,
}

impl Storage {
    /// Local-only storage kept in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            local: Arc::new(InMemoryRepository::new()),
            remote: None,
        }
    }

    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteProgressStore>) -> Self {
        self.remote = Some(remote);
        self
    }
}

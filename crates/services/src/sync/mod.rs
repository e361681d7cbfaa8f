//! Remote synchronization capability attached to the progress store.
//!
//! The store always talks to a `RemoteSync`; when no remote identity is active
//! it is the no-op `LocalOnly` implementation.

mod scheduler;

use async_trait::async_trait;
use tenses_core::model::ProgressSnapshot;
use tokio::sync::watch;

pub use scheduler::{DEFAULT_DEBOUNCE, DebouncedSync};

/// Observable state of remote synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// No remote configured, or nothing in flight.
    #[default]
    Idle,
    /// A remote write is in flight.
    Syncing,
    /// The last remote attempt failed; cleared by the next successful write.
    Error,
}

impl SyncStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Error => "error",
        }
    }
}

#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Queue `snapshot` for a deferred remote write, superseding any pending one.
    fn schedule(&self, snapshot: ProgressSnapshot);

    /// Drop the pending write, if any. An in-flight write is not interrupted.
    fn cancel(&self);

    /// Run the pending write now and wait for remote activity to settle.
    async fn flush(&self);

    fn status(&self) -> SyncStatus;

    fn subscribe(&self) -> watch::Receiver<SyncStatus>;
}

/// Capability used while no remote identity is active.
pub struct LocalOnly {
    status: watch::Sender<SyncStatus>,
}

impl LocalOnly {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: watch::Sender::new(SyncStatus::Idle),
        }
    }
}

impl Default for LocalOnly {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteSync for LocalOnly {
    fn schedule(&self, _snapshot: ProgressSnapshot) {}

    fn cancel(&self) {}

    async fn flush(&self) {}

    fn status(&self) -> SyncStatus {
        SyncStatus::Idle
    }

    fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }
}

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use storage::repository::{RemoteProgress, RemoteProgressStore, StorageError};
use tenses_core::model::{ProgressSnapshot, UserId, merge};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{RemoteSync, SyncStatus};
use crate::progress_store::ProgressStore;

/// Quiet period after the last mutation before the remote write runs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Debounced, single-flight remote writer for one signed-in user.
///
/// Each `schedule` replaces the pending timer; only the write armed by the
/// last call of a burst executes. Writes are serialized through a gate, and a
/// snapshot stays pending until its write holds the gate, so a newer
/// `schedule` or a `flush` can still take it over.
#[derive(Clone)]
pub struct DebouncedSync {
    inner: Arc<Inner>,
}

struct Inner {
    user: UserId,
    remote: Arc<dyn RemoteProgressStore>,
    delay: Duration,
    pending: Mutex<PendingWrite>,
    in_flight: tokio::sync::Mutex<()>,
    status: watch::Sender<SyncStatus>,
    /// Set while the remote record has not been merged into this store yet.
    unmerged: Mutex<Option<Weak<ProgressStore>>>,
}

#[derive(Default)]
struct PendingWrite {
    generation: u64,
    timer: Option<JoinHandle<()>>,
    snapshot: Option<ProgressSnapshot>,
}

impl PendingWrite {
    /// Abort the timer and bump the generation so a write that already woke
    /// up finds nothing to do.
    fn disarm(&mut self) -> Option<ProgressSnapshot> {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation = self.generation.wrapping_add(1);
        self.snapshot.take()
    }
}

impl DebouncedSync {
    #[must_use]
    pub fn new(user: UserId, remote: Arc<dyn RemoteProgressStore>) -> Self {
        Self::with_delay(user, remote, DEFAULT_DEBOUNCE)
    }

    #[must_use]
    pub fn with_delay(user: UserId, remote: Arc<dyn RemoteProgressStore>, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                user,
                remote,
                delay,
                pending: Mutex::new(PendingWrite::default()),
                in_flight: tokio::sync::Mutex::new(()),
                status: watch::Sender::new(SyncStatus::Idle),
                unmerged: Mutex::new(None),
            }),
        }
    }

    /// Read and merge the remote record into `store` before the next upsert.
    ///
    /// Until a read succeeds nothing is written, so a record the store has
    /// never seen cannot be replaced by local-only progress.
    #[must_use]
    pub fn merge_before_write(self, store: &Arc<ProgressStore>) -> Self {
        *self.inner.lock_unmerged() = Some(Arc::downgrade(store));
        self
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.inner.user
    }

    /// Write `snapshot` immediately, bypassing the debounce window but not the
    /// single-flight gate.
    ///
    /// # Errors
    ///
    /// Returns the remote store's `StorageError`; sync status is set to `Error`.
    pub async fn write_now(&self, snapshot: ProgressSnapshot) -> Result<(), StorageError> {
        let _flight = self.inner.in_flight.lock().await;
        self.inner.write_locked(snapshot).await
    }

    /// Record a remote failure that happened outside a write (e.g. a read).
    pub fn report_failure(&self) {
        self.inner.status.send_replace(SyncStatus::Error);
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.inner.lock_pending().snapshot.is_some()
    }
}

impl Inner {
    fn lock_pending(&self) -> MutexGuard<'_, PendingWrite> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_unmerged(&self) -> MutexGuard<'_, Option<Weak<ProgressStore>>> {
        self.unmerged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_due(&self, generation: u64) -> Option<ProgressSnapshot> {
        let mut pending = self.lock_pending();
        if pending.generation != generation {
            return None;
        }
        pending.timer = None;
        pending.snapshot.take()
    }

    /// Caller must hold `in_flight`.
    async fn write_locked(&self, snapshot: ProgressSnapshot) -> Result<(), StorageError> {
        self.status.send_if_modified(|status| {
            if *status == SyncStatus::Idle {
                *status = SyncStatus::Syncing;
                true
            } else {
                false
            }
        });

        let snapshot = match self.merge_remote(snapshot).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.status.send_replace(SyncStatus::Error);
                tracing::warn!(user = %self.user, error = %err, "remote progress still unreadable; write skipped");
                return Err(err);
            }
        };

        let record = RemoteProgress::from_snapshot(&snapshot);
        match self.remote.upsert(&self.user, &record).await {
            Ok(()) => {
                self.status.send_replace(SyncStatus::Idle);
                tracing::debug!(user = %self.user, "remote progress written");
                Ok(())
            }
            Err(err) => {
                self.status.send_replace(SyncStatus::Error);
                tracing::warn!(user = %self.user, error = %err, "remote progress write failed");
                Err(err)
            }
        }
    }

    /// Fold the remote record into the store when it has not been merged yet.
    async fn merge_remote(&self, snapshot: ProgressSnapshot) -> Result<ProgressSnapshot, StorageError> {
        let Some(store) = self.lock_unmerged().clone() else {
            return Ok(snapshot);
        };
        let remote_copy = match self.remote.read_one(&self.user).await {
            Ok(record) => Some(record.into_snapshot()),
            Err(StorageError::NotFound) => None,
            Err(err) => return Err(err),
        };
        *self.lock_unmerged() = None;
        tracing::info!(user = %self.user, "merged remote progress before first write");

        match store.upgrade() {
            Some(store) => Ok(store.absorb_remote(remote_copy).await),
            None => Ok(merge(Some(snapshot), remote_copy)),
        }
    }
}

#[async_trait]
impl RemoteSync for DebouncedSync {
    fn schedule(&self, snapshot: ProgressSnapshot) {
        let mut pending = self.inner.lock_pending();
        pending.disarm();
        pending.snapshot = Some(snapshot);

        let generation = pending.generation;
        let inner = Arc::clone(&self.inner);
        pending.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            // Detached so a later `schedule` aborting this timer cannot cancel the write.
            tokio::spawn(async move {
                let _flight = inner.in_flight.lock().await;
                if let Some(snapshot) = inner.take_due(generation) {
                    let _ = inner.write_locked(snapshot).await;
                }
            });
        }));
    }

    fn cancel(&self) {
        if self.inner.lock_pending().disarm().is_some() {
            tracing::debug!(user = %self.inner.user, "abandoned pending remote write");
        }
    }

    async fn flush(&self) {
        let due = self.inner.lock_pending().disarm();
        let _flight = self.inner.in_flight.lock().await;
        if let Some(snapshot) = due {
            let _ = self.inner.write_locked(snapshot).await;
        }
    }

    fn status(&self) -> SyncStatus {
        *self.inner.status.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tenses_core::model::PackId;
    use tenses_core::time::fixed_now;

    #[derive(Default)]
    struct RecordingRemote {
        writes: Mutex<Vec<RemoteProgress>>,
        fail: AtomicBool,
        latency: Duration,
    }

    impl RecordingRemote {
        fn writes(&self) -> Vec<RemoteProgress> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteProgressStore for RecordingRemote {
        async fn read_one(&self, _user: &UserId) -> Result<RemoteProgress, StorageError> {
            Err(StorageError::NotFound)
        }

        async fn upsert(
            &self,
            _user: &UserId,
            progress: &RemoteProgress,
        ) -> Result<(), StorageError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StorageError::Connection("offline".into()));
            }
            tokio::time::sleep(self.latency).await;
            self.writes.lock().unwrap().push(progress.clone());
            Ok(())
        }
    }

    fn snapshot_with(practiced: usize) -> ProgressSnapshot {
        let mut snapshot = ProgressSnapshot::new();
        for i in 0..practiced {
            snapshot.record_attempt(&PackId::new("p"), i, true, fixed_now());
        }
        snapshot
    }

    fn sync(remote: &Arc<RecordingRemote>) -> DebouncedSync {
        let remote: Arc<dyn RemoteProgressStore> = remote.clone();
        DebouncedSync::new(UserId::new("u"), remote)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_last_snapshot() {
        let remote = Arc::new(RecordingRemote::default());
        let sync = sync(&remote);

        for n in 1..=3 {
            sync.schedule(snapshot_with(n));
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert!(remote.writes().is_empty());

        tokio::time::sleep(DEFAULT_DEBOUNCE).await;
        let writes = remote.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].pack_progress[&PackId::new("p")].practiced(), 3);
        assert_eq!(sync.status(), SyncStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_abandons_pending_write() {
        let remote = Arc::new(RecordingRemote::default());
        let sync = sync(&remote);

        sync.schedule(snapshot_with(1));
        assert!(sync.has_pending());
        sync.cancel();
        assert!(!sync.has_pending());

        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert!(remote.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_sticky_until_next_success() {
        let remote = Arc::new(RecordingRemote::default());
        remote.fail.store(true, Ordering::SeqCst);
        let sync = sync(&remote);

        sync.schedule(snapshot_with(1));
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert_eq!(sync.status(), SyncStatus::Error);

        remote.fail.store(false, Ordering::SeqCst);
        sync.schedule(snapshot_with(2));
        tokio::time::sleep(DEFAULT_DEBOUNCE / 2).await;
        assert_eq!(sync.status(), SyncStatus::Error);

        tokio::time::sleep(DEFAULT_DEBOUNCE).await;
        assert_eq!(sync.status(), SyncStatus::Idle);
        assert_eq!(remote.writes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_immediately() {
        let remote = Arc::new(RecordingRemote::default());
        let sync = sync(&remote);

        sync.schedule(snapshot_with(2));
        sync.flush().await;
        assert_eq!(remote.writes().len(), 1);

        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert_eq!(remote.writes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_takes_over_write_waiting_behind_another() {
        let remote = Arc::new(RecordingRemote {
            latency: Duration::from_secs(3),
            ..RecordingRemote::default()
        });
        let sync = sync(&remote);

        let first = sync.clone();
        let running = tokio::spawn(async move { first.write_now(snapshot_with(1)).await });
        tokio::task::yield_now().await;

        // Timer fires at 2s and queues behind the write running until 3s.
        sync.schedule(snapshot_with(2));
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(sync.has_pending());

        sync.flush().await;
        let writes = remote.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].pack_progress[&PackId::new("p")].practiced(), 2);
        assert!(running.await.unwrap().is_ok());

        tokio::time::sleep(DEFAULT_DEBOUNCE * 3).await;
        assert_eq!(remote.writes().len(), 2);
    }
}

use std::sync::{Arc, PoisonError, RwLock};

use storage::repository::LocalStore;
use tenses_core::model::{PackId, PackProgress, ProgressSnapshot, merge};
use tokio::sync::{MutexGuard, watch};

use crate::Clock;
use crate::sync::{LocalOnly, RemoteSync, SyncStatus};

/// Local storage key holding the serialized snapshot.
pub const PROGRESS_KEY: &str = "tense_progress";

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Canonical progress for the active user.
///
/// Every mutation updates the in-memory snapshot first, then writes it to local
/// storage before returning, then hands it to the attached `RemoteSync`.
pub struct ProgressStore {
    clock: Clock,
    local: Arc<dyn LocalStore>,
    snapshot: tokio::sync::Mutex<ProgressSnapshot>,
    remote: RwLock<Arc<dyn RemoteSync>>,
}

impl ProgressStore {
    /// Load the locally stored snapshot; absence or corruption yields an empty one.
    pub async fn open(clock: Clock, local: Arc<dyn LocalStore>) -> Self {
        let snapshot = read_local(local.as_ref()).await;
        Self {
            clock,
            local,
            snapshot: tokio::sync::Mutex::new(snapshot),
            remote: RwLock::new(Arc::new(LocalOnly::new())),
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Copy of the current snapshot.
    pub async fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot.lock().await.clone()
    }

    /// Progress for `id`, inserting a zeroed entry if the pack was never seen.
    ///
    /// The inserted entry is not persisted on its own; it travels with the next write.
    pub async fn get_pack_progress(&self, id: &PackId) -> PackProgress {
        self.snapshot.lock().await.pack_progress_mut(id).clone()
    }

    /// Record one judged item and persist.
    pub async fn record_attempt(&self, id: &PackId, index: usize, was_correct: bool) -> PackProgress {
        let mut snapshot = self.snapshot.lock().await;
        let updated = snapshot
            .record_attempt(id, index, was_correct, self.clock.now())
            .clone();
        self.persist_locked(&snapshot).await;
        updated
    }

    /// Move `id` to the front of the recently completed list and persist.
    ///
    /// Returns `false` without writing anything for synthetic review identifiers.
    pub async fn complete_session(&self, id: &PackId) -> bool {
        let mut snapshot = self.snapshot.lock().await;
        if !snapshot.complete_pack(id) {
            return false;
        }
        self.persist_locked(&snapshot).await;
        true
    }

    /// Write the current snapshot locally and schedule the remote write.
    pub async fn persist(&self) {
        let snapshot = self.snapshot.lock().await;
        self.persist_locked(&snapshot).await;
    }

    async fn persist_locked(&self, snapshot: &ProgressSnapshot) {
        self.write_local(snapshot).await;
        self.remote().schedule(snapshot.clone());
    }

    /// Write `snapshot` to local storage; failures are logged and swallowed.
    pub(crate) async fn write_local(&self, snapshot: &ProgressSnapshot) {
        let raw = match snapshot.to_json() {
            Ok(raw) => raw,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize progress");
                return;
            }
        };
        if let Err(err) = self.local.set(PROGRESS_KEY, &raw).await {
            tracing::error!(error = %err, "failed to write local progress");
        }
    }

    /// Exclusive access to the snapshot for a multi-step transition.
    pub(crate) async fn lock_snapshot(&self) -> MutexGuard<'_, ProgressSnapshot> {
        self.snapshot.lock().await
    }

    /// Merge a remote copy that arrived after sign-in and store the result locally.
    pub(crate) async fn absorb_remote(&self, remote: Option<ProgressSnapshot>) -> ProgressSnapshot {
        let mut snapshot = self.snapshot.lock().await;
        let merged = merge(Some(snapshot.clone()), remote);
        self.write_local(&merged).await;
        *snapshot = merged.clone();
        merged
    }

    /// Replace the snapshot with whatever local storage currently holds.
    pub async fn reload_local(&self) {
        let fresh = read_local(self.local.as_ref()).await;
        *self.snapshot.lock().await = fresh;
    }

    //
    // ─── REMOTE CAPABILITY ─────────────────────────────────────────────────────
    //

    fn remote(&self) -> Arc<dyn RemoteSync> {
        Arc::clone(&self.remote.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Route subsequent writes through `sync`; the previous capability is returned.
    pub fn attach_remote(&self, sync: Arc<dyn RemoteSync>) -> Arc<dyn RemoteSync> {
        let mut slot = self.remote.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, sync)
    }

    /// Abandon any pending remote write and fall back to local-only persistence.
    pub fn detach_remote(&self) {
        let previous = self.attach_remote(Arc::new(LocalOnly::new()));
        previous.cancel();
    }

    #[must_use]
    pub fn sync_status(&self) -> SyncStatus {
        self.remote().status()
    }

    /// Watch the status of the capability attached right now.
    ///
    /// A later attach or detach does not carry existing receivers over.
    #[must_use]
    pub fn subscribe_sync(&self) -> watch::Receiver<SyncStatus> {
        self.remote().subscribe()
    }

    /// Run any pending remote write now and wait for it.
    pub async fn flush_sync(&self) {
        self.remote().flush().await;
    }
}

async fn read_local(local: &dyn LocalStore) -> ProgressSnapshot {
    let raw = match local.get(PROGRESS_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return ProgressSnapshot::new(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to read local progress; starting empty");
            return ProgressSnapshot::new();
        }
    };
    ProgressSnapshot::from_json(&raw).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "stored progress is unreadable; starting empty");
        ProgressSnapshot::new()
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

//! Identity transitions: merging on sign-in, falling back to local on sign-out.

use std::sync::Arc;
use std::time::Duration;

use storage::repository::{RemoteProgressStore, StorageError};
use tenses_core::model::{UserId, merge};

use crate::progress_store::ProgressStore;
use crate::sync::{DEFAULT_DEBOUNCE, DebouncedSync, SyncStatus};

/// Authenticated identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self { id, email: None }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    SignedIn(User),
    SignedOut,
}

/// Wires a `ProgressStore` to the remote store as users come and go.
#[derive(Clone)]
pub struct AccountSync {
    progress: Arc<ProgressStore>,
    remote: Option<Arc<dyn RemoteProgressStore>>,
    debounce: Duration,
}

impl AccountSync {
    /// Without a remote store every identity stays local-only.
    #[must_use]
    pub fn new(progress: Arc<ProgressStore>, remote: Option<Arc<dyn RemoteProgressStore>>) -> Self {
        Self {
            progress,
            remote,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    #[must_use]
    pub fn is_remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Treat an identity already present at startup as a fresh sign-in.
    pub async fn initial_session(&self, user: Option<&User>) {
        if let Some(user) = user {
            self.signed_in(user).await;
        }
    }

    pub async fn handle(&self, event: &IdentityEvent) {
        match event {
            IdentityEvent::SignedIn(user) => self.signed_in(user).await,
            IdentityEvent::SignedOut => self.signed_out().await,
        }
    }

    /// Merge local and remote progress, store the result on both sides, and
    /// start debounced remote writes for `user`.
    ///
    /// A failed remote read keeps the local snapshot and leaves sync status at
    /// `Error`. The attached scheduler then retries the read and merge before
    /// its first upsert, so the remote record is never replaced unseen.
    pub async fn signed_in(&self, user: &User) {
        let Some(remote) = &self.remote else {
            tracing::info!(user = %user.id(), "remote sync not configured; progress stays local");
            return;
        };
        let sync = DebouncedSync::with_delay(user.id().clone(), Arc::clone(remote), self.debounce);

        let mut snapshot = self.progress.lock_snapshot().await;
        let remote_copy = match remote.read_one(user.id()).await {
            Ok(record) => Some(record.into_snapshot()),
            Err(StorageError::NotFound) => None,
            Err(err) => {
                tracing::warn!(user = %user.id(), error = %err, "remote progress unavailable; keeping local");
                sync.report_failure();
                let sync = sync.merge_before_write(&self.progress);
                self.progress.attach_remote(Arc::new(sync)).cancel();
                return;
            }
        };

        let merged = merge(Some(snapshot.clone()), remote_copy);
        self.progress.write_local(&merged).await;
        if sync.write_now(merged.clone()).await.is_ok() {
            tracing::info!(
                user = %user.id(),
                packs = merged.pack_progress_map().len(),
                "merged progress after sign-in"
            );
        }
        *snapshot = merged;

        self.progress.attach_remote(Arc::new(sync)).cancel();
    }

    /// Abandon pending remote work and reload whatever is stored locally.
    pub async fn signed_out(&self) {
        self.progress.detach_remote();
        self.progress.reload_local().await;
        tracing::info!("signed out; progress is local-only");
    }

    #[must_use]
    pub fn progress(&self) -> &Arc<ProgressStore> {
        &self.progress
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.progress.sync_status()
    }
}

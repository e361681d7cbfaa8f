use std::sync::Arc;
use std::time::Duration;

use storage::repository::Storage;
use storage::rest::{RestConfig, RestRemoteStore};
use tenses_core::model::Catalog;

use crate::account::AccountSync;
use crate::error::AppServicesError;
use crate::overview::OverviewService;
use crate::progress_store::ProgressStore;
use crate::sessions::PracticeService;
use crate::sync::DEFAULT_DEBOUNCE;
use crate::Clock;

/// Storage and sync settings resolved by the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_url: String,
    /// Remote sync is enabled only when this is set.
    pub remote: Option<RestConfig>,
    pub debounce: Duration,
}

impl AppConfig {
    #[must_use]
    pub fn local(db_url: impl Into<String>) -> Self {
        Self {
            db_url: db_url.into(),
            remote: None,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Assembles the progress store and identity handling over concrete storage.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressStore>,
    account: AccountSync,
}

impl AppServices {
    /// Build services backed by `SQLite`, plus the HTTP remote when configured.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(config: &AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let mut storage = Storage::sqlite(&config.db_url).await?;
        if let Some(remote) = &config.remote {
            storage = storage.with_remote(Arc::new(RestRemoteStore::new(remote.clone())));
        }
        Ok(Self::from_storage(storage, clock, config.debounce).await)
    }

    /// Local-only services kept in memory.
    pub async fn in_memory(clock: Clock) -> Self {
        Self::from_storage(Storage::in_memory(), clock, DEFAULT_DEBOUNCE).await
    }

    pub async fn from_storage(storage: Storage, clock: Clock, debounce: Duration) -> Self {
        let progress = Arc::new(ProgressStore::open(clock, storage.local).await);
        let account =
            AccountSync::new(Arc::clone(&progress), storage.remote).with_debounce(debounce);
        Self { progress, account }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn account(&self) -> &AccountSync {
        &self.account
    }

    #[must_use]
    pub fn practice(&self, catalog: &Arc<Catalog>) -> PracticeService {
        PracticeService::new(Arc::clone(catalog), self.progress())
    }

    #[must_use]
    pub fn overview(&self, catalog: &Arc<Catalog>) -> OverviewService {
        OverviewService::new(Arc::clone(catalog), self.progress())
    }
}

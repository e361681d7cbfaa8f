#![forbid(unsafe_code)]

pub mod account;
pub mod app_services;
pub mod error;
pub mod overview;
pub mod progress_store;
pub mod sessions;
pub mod sync;

pub use tenses_core::Clock;

pub use account::{AccountSync, IdentityEvent, User};
pub use app_services::{AppConfig, AppServices};
pub use error::{AppServicesError, SessionError};
pub use overview::{HomeOverview, OverviewService, ProgressBand};
pub use progress_store::{PROGRESS_KEY, ProgressStore};
pub use sessions::{JudgeResult, PracticeService, PracticeSession, SessionOutcome, SessionState};
pub use sync::{DebouncedSync, LocalOnly, RemoteSync, SyncStatus};

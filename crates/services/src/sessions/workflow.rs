use std::sync::Arc;

use tenses_core::model::{Catalog, PackId, PackProgress, PracticeMode};

use super::plan::SessionBuilder;
use super::service::{Judgment, PracticeSession, SessionOutcome};
use crate::error::SessionError;
use crate::progress_store::ProgressStore;

/// Result of judging a single item in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeResult {
    pub judgment: Judgment,
    /// Pack entry after the attempt was recorded.
    pub pack_progress: PackProgress,
    /// Set on the judgment that ends the run.
    pub outcome: Option<SessionOutcome>,
}

/// Starts runs from the catalog and records every judgment in the progress store.
#[derive(Clone)]
pub struct PracticeService {
    catalog: Arc<Catalog>,
    progress: Arc<ProgressStore>,
    shuffle: bool,
}

impl PracticeService {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, progress: Arc<ProgressStore>) -> Self {
        Self {
            catalog,
            progress,
            shuffle: true,
        }
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Start a run for `mode` from the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when the mode selects nothing, or an
    /// unknown-name error for packs and categories missing from the catalog.
    pub async fn start(&self, mode: PracticeMode) -> Result<PracticeSession, SessionError> {
        let snapshot = self.progress.snapshot().await;
        let plan = SessionBuilder::new(&self.catalog, &snapshot)
            .with_shuffle(self.shuffle)
            .build(mode)?;
        tracing::debug!(mode = %plan.mode, items = plan.total(), "starting practice run");
        PracticeSession::start(plan, self.progress.clock().now())
    }

    /// Practice every sentence of one pack.
    ///
    /// # Errors
    ///
    /// See [`PracticeService::start`].
    pub async fn start_pack(&self, id: PackId) -> Result<PracticeSession, SessionError> {
        self.start(PracticeMode::Pack(id)).await
    }

    /// Review the recorded mistakes of one pack.
    ///
    /// # Errors
    ///
    /// See [`PracticeService::start`].
    pub async fn review_pack(&self, id: PackId) -> Result<PracticeSession, SessionError> {
        self.start(PracticeMode::PackReview(id)).await
    }

    /// Review the recorded mistakes of every pack in a category.
    ///
    /// # Errors
    ///
    /// See [`PracticeService::start`].
    pub async fn review_category(&self, name: &str) -> Result<PracticeSession, SessionError> {
        self.start(PracticeMode::CategoryReview(name.to_string())).await
    }

    /// Review every recorded mistake.
    ///
    /// # Errors
    ///
    /// See [`PracticeService::start`].
    pub async fn review_all(&self) -> Result<PracticeSession, SessionError> {
        self.start(PracticeMode::ReviewAll).await
    }

    /// Judge the revealed item, persist the attempt, and advance.
    ///
    /// The run's pack is marked completed when a pack practice ends; review
    /// runs leave the recently completed list alone.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if the answer is not revealed
    /// and `SessionError::Completed` once the run has ended.
    pub async fn judge(
        &self,
        session: &mut PracticeSession,
        was_correct: bool,
    ) -> Result<JudgeResult, SessionError> {
        let item = session.judgeable_item()?.clone();
        let pack_progress = self
            .progress
            .record_attempt(&item.pack_id, item.index, was_correct)
            .await;
        let judgment = session.record_judgment(was_correct, self.progress.clock().now())?;

        let outcome = if judgment.is_complete {
            if let Some(target) = session.mode().completion_target() {
                self.progress.complete_session(target).await;
            }
            session.take_outcome()
        } else {
            None
        };
        if let Some(outcome) = &outcome {
            tracing::info!(
                run = %outcome.run_id,
                correct = outcome.correct,
                total = outcome.total,
                accuracy = outcome.accuracy_percent,
                "practice run finished"
            );
        }

        Ok(JudgeResult {
            judgment,
            pack_progress,
            outcome,
        })
    }
}

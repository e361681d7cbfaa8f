use chrono::{DateTime, Utc};
use std::fmt;

use tenses_core::model::{PackId, PracticeItem, PracticeMode, SessionStats};

use super::plan::SessionPlan;
use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Where a started run stands. Before a run starts there is no `PracticeSession` at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Presenting,
    Revealed,
    Ended,
}

/// Final figures of a run, handed out once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub run_id: PackId,
    pub correct: u32,
    pub total: u32,
    pub accuracy_percent: u32,
}

/// What a single judgment did to the run.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    pub item: PracticeItem,
    pub was_correct: bool,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory practice run over a fixed item sequence.
///
/// Items are shown one at a time; the answer must be revealed before the item
/// can be judged, and judging the last item ends the run.
pub struct PracticeSession {
    mode: PracticeMode,
    items: Vec<PracticeItem>,
    current: usize,
    state: SessionState,
    stats: SessionStats,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    outcome_taken: bool,
}

impl PracticeSession {
    /// Enter `Presenting` on the first item of `plan` with fresh stats.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the plan has no items.
    pub fn start(plan: SessionPlan, started_at: DateTime<Utc>) -> Result<Self, SessionError> {
        if plan.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            mode: plan.mode,
            items: plan.items,
            current: 0,
            state: SessionState::Presenting,
            stats: SessionStats::new(),
            started_at,
            ended_at: None,
            outcome_taken: false,
        })
    }

    #[must_use]
    pub fn mode(&self) -> &PracticeMode {
        &self.mode
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Total number of items in this run.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Items not yet judged, including the one on screen.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.current)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total_items(),
            answered: self.current,
            remaining: self.remaining(),
            is_complete: self.is_complete(),
        }
    }

    /// Item on screen; `None` once the run has ended.
    #[must_use]
    pub fn current_item(&self) -> Option<&PracticeItem> {
        match self.state {
            SessionState::Presenting | SessionState::Revealed => self.items.get(self.current),
            SessionState::Ended => None,
        }
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.state == SessionState::Revealed
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Ended
    }

    /// Show the answer. Revealing twice changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the run has ended.
    pub fn reveal(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Presenting | SessionState::Revealed => {
                self.state = SessionState::Revealed;
                Ok(())
            }
            SessionState::Ended => Err(SessionError::Completed),
        }
    }

    /// Hide the answer again; the item stays the same.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the run has ended.
    pub fn hide(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Presenting | SessionState::Revealed => {
                self.state = SessionState::Presenting;
                Ok(())
            }
            SessionState::Ended => Err(SessionError::Completed),
        }
    }

    /// Check that the current item may be judged and return it.
    pub(crate) fn judgeable_item(&self) -> Result<&PracticeItem, SessionError> {
        match self.state {
            SessionState::Revealed => self.items.get(self.current).ok_or(SessionError::Completed),
            SessionState::Ended => Err(SessionError::Completed),
            state => Err(SessionError::InvalidTransition {
                action: "judge",
                state,
            }),
        }
    }

    /// Count the judgment and advance to the next item or end the run.
    ///
    /// `judged_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the answer is revealed,
    /// and `SessionError::Completed` after the run has ended.
    pub fn record_judgment(
        &mut self,
        was_correct: bool,
        judged_at: DateTime<Utc>,
    ) -> Result<Judgment, SessionError> {
        let item = self.judgeable_item()?.clone();
        self.stats.record(was_correct);

        self.current += 1;
        if self.current >= self.items.len() {
            self.state = SessionState::Ended;
            self.ended_at = Some(judged_at);
        } else {
            self.state = SessionState::Presenting;
        }

        Ok(Judgment {
            item,
            was_correct,
            is_complete: self.is_complete(),
        })
    }

    /// Final figures, available exactly once after the run has ended.
    pub fn take_outcome(&mut self) -> Option<SessionOutcome> {
        if !self.is_complete() || self.outcome_taken {
            return None;
        }
        self.outcome_taken = true;
        Some(SessionOutcome {
            run_id: self.mode.run_id(),
            correct: self.stats.correct(),
            total: self.stats.total(),
            accuracy_percent: self.stats.accuracy_percent(),
        })
    }
}

impl fmt::Debug for PracticeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticeSession")
            .field("mode", &self.mode)
            .field("items_len", &self.items.len())
            .field("current", &self.current)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .field("started_at", &self.started_at)
            .field("ended_at", &self.ended_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

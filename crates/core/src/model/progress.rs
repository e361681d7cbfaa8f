use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::Error;
use crate::model::ids::PackId;
use crate::model::stats::percent;

/// Maximum number of entries kept in the recently-completed list.
pub const RECENTLY_COMPLETED_LIMIT: usize = 10;

//
// ─── PACK PROGRESS ─────────────────────────────────────────────────────────────
//

/// Accumulated practice record for one catalog pack.
///
/// `wrong_sentences` holds the indices (within the pack's item list) of items
/// that were last answered incorrectly and not yet resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawPackProgress")]
pub struct PackProgress {
    practiced: u32,
    correct: u32,
    last_practiced: Option<DateTime<Utc>>,
    wrong_sentences: BTreeSet<usize>,
}

/// Wire shape accepted on load; tolerant of missing keys and bad counters.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawPackProgress {
    practiced: u32,
    correct: u32,
    last_practiced: Option<DateTime<Utc>>,
    wrong_sentences: Vec<usize>,
}

impl From<RawPackProgress> for PackProgress {
    fn from(raw: RawPackProgress) -> Self {
        Self::from_parts(
            raw.practiced,
            raw.correct,
            raw.last_practiced,
            raw.wrong_sentences,
        )
    }
}

impl PackProgress {
    /// Rehydrate progress from stored parts.
    ///
    /// `correct` is clamped to `practiced` and duplicate indices collapse.
    #[must_use]
    pub fn from_parts(
        practiced: u32,
        correct: u32,
        last_practiced: Option<DateTime<Utc>>,
        wrong_sentences: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self {
            practiced,
            correct: correct.min(practiced),
            last_practiced,
            wrong_sentences: wrong_sentences.into_iter().collect(),
        }
    }

    /// Apply one judged attempt at item `index`.
    pub fn record(&mut self, index: usize, was_correct: bool, at: DateTime<Utc>) {
        self.practiced = self.practiced.saturating_add(1);
        if was_correct {
            self.correct = self.correct.saturating_add(1);
            self.wrong_sentences.remove(&index);
        } else {
            self.wrong_sentences.insert(index);
        }
        self.last_practiced = Some(at);
    }

    #[must_use]
    pub fn practiced(&self) -> u32 {
        self.practiced
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn last_practiced(&self) -> Option<DateTime<Utc>> {
        self.last_practiced
    }

    #[must_use]
    pub fn wrong_sentences(&self) -> &BTreeSet<usize> {
        &self.wrong_sentences
    }

    #[must_use]
    pub fn mistake_count(&self) -> usize {
        self.wrong_sentences.len()
    }

    #[must_use]
    pub fn is_practiced(&self) -> bool {
        self.practiced > 0
    }

    /// Lifetime accuracy as a rounded whole percent; 0 before the first attempt.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        percent(self.correct, self.practiced)
    }
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Complete progress state for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawSnapshot")]
pub struct ProgressSnapshot {
    pub(crate) pack_progress: BTreeMap<PackId, PackProgress>,
    pub(crate) recently_completed: Vec<PackId>,
    // Reserved; carried through untouched.
    pub(crate) review_queue: Vec<serde_json::Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawSnapshot {
    pack_progress: BTreeMap<PackId, PackProgress>,
    recently_completed: Vec<PackId>,
    review_queue: Vec<serde_json::Value>,
}

impl From<RawSnapshot> for ProgressSnapshot {
    fn from(raw: RawSnapshot) -> Self {
        let mut snapshot = Self::from_parts(raw.pack_progress, raw.recently_completed);
        snapshot.review_queue = raw.review_queue;
        snapshot
    }
}

impl ProgressSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from stored parts, restoring the recency invariants
    /// (no duplicates, most recent first, capped).
    #[must_use]
    pub fn from_parts(
        pack_progress: BTreeMap<PackId, PackProgress>,
        recently_completed: impl IntoIterator<Item = PackId>,
    ) -> Self {
        let mut recent: Vec<PackId> = Vec::new();
        for id in recently_completed {
            if !recent.contains(&id) {
                recent.push(id);
            }
        }
        recent.truncate(RECENTLY_COMPLETED_LIMIT);

        Self {
            pack_progress,
            recently_completed: recent,
            review_queue: Vec::new(),
        }
    }

    /// Decode the stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns `Error::Progress` when `raw` is not a valid snapshot document.
    pub fn from_json(raw: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Encode to the stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns `Error::Progress` if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Read-only lookup; `None` when the pack was never touched.
    #[must_use]
    pub fn pack_progress(&self, id: &PackId) -> Option<&PackProgress> {
        self.pack_progress.get(id)
    }

    /// Entry for `id`, inserting a zeroed record first if absent.
    pub fn pack_progress_mut(&mut self, id: &PackId) -> &mut PackProgress {
        self.pack_progress.entry(id.clone()).or_default()
    }

    #[must_use]
    pub fn pack_progress_map(&self) -> &BTreeMap<PackId, PackProgress> {
        &self.pack_progress
    }

    pub fn packs(&self) -> impl Iterator<Item = (&PackId, &PackProgress)> {
        self.pack_progress.iter()
    }

    #[must_use]
    pub fn recently_completed(&self) -> &[PackId] {
        &self.recently_completed
    }

    #[must_use]
    pub fn review_queue(&self) -> &[serde_json::Value] {
        &self.review_queue
    }

    /// Record one judged attempt and return the updated entry.
    pub fn record_attempt(
        &mut self,
        id: &PackId,
        index: usize,
        was_correct: bool,
        at: DateTime<Utc>,
    ) -> &PackProgress {
        let progress = self.pack_progress_mut(id);
        progress.record(index, was_correct, at);
        progress
    }

    /// Move `id` to the front of the recently-completed list.
    ///
    /// Returns `false` (and changes nothing) for review-run markers.
    pub fn complete_pack(&mut self, id: &PackId) -> bool {
        if id.is_review_marker() {
            return false;
        }
        self.recently_completed.retain(|existing| existing != id);
        self.recently_completed.insert(0, id.clone());
        self.recently_completed.truncate(RECENTLY_COMPLETED_LIMIT);
        true
    }

    /// Unresolved mistakes across every recorded pack.
    #[must_use]
    pub fn total_mistakes(&self) -> usize {
        self.pack_progress
            .values()
            .map(PackProgress::mistake_count)
            .sum()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

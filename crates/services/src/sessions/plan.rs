use rand::rng;
use rand::seq::SliceRandom;

use tenses_core::model::{Catalog, Pack, PracticeItem, PracticeMode, ProgressSnapshot};

use crate::error::SessionError;

/// Items selected for one run, in presentation order.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub mode: PracticeMode,
    pub items: Vec<PracticeItem>,
}

impl SessionPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Collects the items a mode draws from and orders them for presentation.
pub struct SessionBuilder<'a> {
    catalog: &'a Catalog,
    progress: &'a ProgressSnapshot,
    shuffle: bool,
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, progress: &'a ProgressSnapshot) -> Self {
        Self {
            catalog,
            progress,
            shuffle: true,
        }
    }

    /// Keep catalog order instead of shuffling; used by deterministic callers.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Build the plan for `mode`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownPack` / `UnknownCategory` for names the
    /// catalog does not know, and `SessionError::Empty` when nothing qualifies.
    pub fn build(self, mode: PracticeMode) -> Result<SessionPlan, SessionError> {
        let mut items: Vec<PracticeItem> = match &mode {
            PracticeMode::Pack(id) => {
                let pack = self
                    .catalog
                    .pack(id)
                    .ok_or_else(|| SessionError::UnknownPack(id.clone()))?;
                pack.sentences()
                    .iter()
                    .enumerate()
                    .map(|(index, sentence)| PracticeItem::from_pack(pack, index, sentence))
                    .collect()
            }
            PracticeMode::PackReview(id) => {
                let pack = self
                    .catalog
                    .pack(id)
                    .ok_or_else(|| SessionError::UnknownPack(id.clone()))?;
                self.mistakes_in(pack).collect()
            }
            PracticeMode::CategoryReview(name) => {
                let category = self
                    .catalog
                    .category(name)
                    .ok_or_else(|| SessionError::UnknownCategory(name.clone()))?;
                self.catalog
                    .packs_in(category)
                    .flat_map(|pack| self.mistakes_in(pack))
                    .collect()
            }
            PracticeMode::ReviewAll => self
                .catalog
                .packs()
                .iter()
                .flat_map(|pack| self.mistakes_in(pack))
                .collect(),
        };

        if items.is_empty() {
            return Err(SessionError::Empty);
        }
        if self.shuffle {
            items.as_mut_slice().shuffle(&mut rng());
        }

        Ok(SessionPlan { mode, items })
    }

    /// Recorded mistakes of `pack` that still point at an existing sentence.
    fn mistakes_in(&self, pack: &'a Pack) -> impl Iterator<Item = PracticeItem> + 'a {
        let wrong = self
            .progress
            .pack_progress(pack.id())
            .map(|entry| entry.wrong_sentences().iter().copied().collect::<Vec<_>>())
            .unwrap_or_default();
        wrong.into_iter().filter_map(move |index| {
            pack.sentence(index)
                .map(|sentence| PracticeItem::from_pack(pack, index, sentence))
        })
    }
}

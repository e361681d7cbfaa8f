use std::fmt;

use crate::model::catalog::{Pack, Sentence};
use crate::model::ids::PackId;

/// What a practice run draws its items from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PracticeMode {
    /// Every item of one pack.
    Pack(PackId),
    /// The unresolved mistakes of one pack.
    PackReview(PackId),
    /// The unresolved mistakes of every pack in a named category.
    CategoryReview(String),
    /// Every unresolved mistake in the catalog.
    ReviewAll,
}

impl PracticeMode {
    /// Review runs never touch the recently-completed list.
    #[must_use]
    pub fn is_review(&self) -> bool {
        !matches!(self, Self::Pack(_))
    }

    /// Identifier recorded as completed when the run ends, if any.
    #[must_use]
    pub fn completion_target(&self) -> Option<&PackId> {
        match self {
            Self::Pack(id) => Some(id),
            _ => None,
        }
    }

    /// Identifier naming the run as a whole; synthetic for multi-pack reviews.
    #[must_use]
    pub fn run_id(&self) -> PackId {
        match self {
            Self::Pack(id) | Self::PackReview(id) => id.clone(),
            Self::CategoryReview(_) => PackId::review_category(),
            Self::ReviewAll => PackId::review_all(),
        }
    }
}

impl fmt::Display for PracticeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pack(id) => write!(f, "practice {id}"),
            Self::PackReview(id) => write!(f, "review {id}"),
            Self::CategoryReview(name) => write!(f, "review category {name}"),
            Self::ReviewAll => f.write_str("review all mistakes"),
        }
    }
}

/// One card of a run: a catalog sentence plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeItem {
    pub pack_id: PackId,
    /// Stable position of the sentence inside its pack.
    pub index: usize,
    pub prompt: String,
    pub answer: String,
    pub label: String,
}

impl PracticeItem {
    #[must_use]
    pub fn from_pack(pack: &Pack, index: usize, sentence: &Sentence) -> Self {
        Self {
            pack_id: pack.id().clone(),
            index,
            prompt: sentence.prompt.clone(),
            answer: sentence.answer.clone(),
            label: pack.tense_name().to_string(),
        }
    }
}

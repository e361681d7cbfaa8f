use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::ids::{PackId, TenseId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("duplicate pack id: {0}")]
    DuplicatePack(PackId),

    #[error("pack {0} has no sentences")]
    EmptyPack(PackId),

    #[error("pack id {0} uses the prefix reserved for review runs")]
    ReservedPackId(PackId),

    #[error("category {category} references tense {tense} with no pack file")]
    MissingTense { category: String, tense: TenseId },
}

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

/// One flashcard: the sentence shown to the learner and its English answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    #[serde(alias = "urdu")]
    pub prompt: String,
    #[serde(alias = "english")]
    pub answer: String,
}

/// Explanatory material about a tense, shown next to its packs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenseInfo {
    pub name: String,
    #[serde(alias = "urduName")]
    pub native_name: String,
    pub formula: String,
    pub explanation: String,
    pub when_to_use: Vec<String>,
    pub examples: Vec<Sentence>,
}

/// Pack entry as stored in a tense file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackFile {
    pub id: PackId,
    #[serde(default)]
    pub level_name: String,
    #[serde(default)]
    pub description: String,
    pub sentences: Vec<Sentence>,
}

/// All packs of one tense, as stored in `<tense>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TenseFile {
    pub tense: TenseId,
    pub packs: Vec<PackFile>,
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// A catalog pack with its tense resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pack {
    id: PackId,
    tense: TenseId,
    tense_name: String,
    level_name: String,
    description: String,
    sentences: Vec<Sentence>,
}

impl Pack {
    #[must_use]
    pub fn id(&self) -> &PackId {
        &self.id
    }

    #[must_use]
    pub fn tense(&self) -> &TenseId {
        &self.tense
    }

    /// Display name of the tense, falling back to the tense id.
    #[must_use]
    pub fn tense_name(&self) -> &str {
        &self.tense_name
    }

    #[must_use]
    pub fn level_name(&self) -> &str {
        &self.level_name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    #[must_use]
    pub fn sentence(&self, index: usize) -> Option<&Sentence> {
        self.sentences.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// `"Past Simple - Level 2"`, or just the tense name without a level.
    #[must_use]
    pub fn title(&self) -> String {
        if self.level_name.is_empty() {
            self.tense_name.clone()
        } else {
            format!("{} - {}", self.tense_name, self.level_name)
        }
    }
}

/// Named group of tenses, e.g. "Perfect Tenses".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    tenses: Vec<TenseId>,
}

impl Category {
    #[must_use]
    pub fn new(name: impl Into<String>, tenses: impl IntoIterator<Item = TenseId>) -> Self {
        Self {
            name: name.into(),
            tenses: tenses.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn tenses(&self) -> &[TenseId] {
        &self.tenses
    }

    #[must_use]
    pub fn contains(&self, tense: &TenseId) -> bool {
        self.tenses.contains(tense)
    }
}

/// The four standard categories in display order.
#[must_use]
pub fn default_categories() -> Vec<Category> {
    let group = |name: &str, tenses: &[&str]| {
        Category::new(name, tenses.iter().map(|t| TenseId::new(*t)))
    };
    vec![
        group("Present Tenses", &["present-simple", "present-continuous"]),
        group("Past Tenses", &["past-simple", "past-continuous"]),
        group(
            "Perfect Tenses",
            &["present-perfect", "present-perfect-continuous", "past-perfect"],
        ),
        group("Future Tenses", &["future-simple"]),
    ]
}

/// Immutable, validated content set for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<Category>,
    tense_info: BTreeMap<TenseId, TenseInfo>,
    packs: Vec<Pack>,
}

impl Catalog {
    /// Assemble a catalog from parsed tense files.
    ///
    /// Packs keep the order of `files`, then the order inside each file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when a pack id repeats or starts with
    /// [`PackId::REVIEW_PREFIX`], when a pack has no sentences, or when a
    /// category names a tense that has no file.
    pub fn new(
        categories: Vec<Category>,
        tense_info: BTreeMap<TenseId, TenseInfo>,
        files: Vec<TenseFile>,
    ) -> Result<Self, CatalogError> {
        let loaded: HashSet<TenseId> = files.iter().map(|f| f.tense.clone()).collect();
        for category in &categories {
            if let Some(missing) = category.tenses.iter().find(|t| !loaded.contains(*t)) {
                return Err(CatalogError::MissingTense {
                    category: category.name.clone(),
                    tense: missing.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        let mut packs = Vec::new();
        for file in files {
            let tense_name = tense_info
                .get(&file.tense)
                .map(|info| info.name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| file.tense.to_string());

            for pack in file.packs {
                if pack.id.is_review_marker() {
                    return Err(CatalogError::ReservedPackId(pack.id));
                }
                if !seen.insert(pack.id.clone()) {
                    return Err(CatalogError::DuplicatePack(pack.id));
                }
                if pack.sentences.is_empty() {
                    return Err(CatalogError::EmptyPack(pack.id));
                }
                packs.push(Pack {
                    id: pack.id,
                    tense: file.tense.clone(),
                    tense_name: tense_name.clone(),
                    level_name: pack.level_name,
                    description: pack.description,
                    sentences: pack.sentences,
                });
            }
        }

        Ok(Self {
            categories,
            tense_info,
            packs,
        })
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn tense_info(&self, tense: &TenseId) -> Option<&TenseInfo> {
        self.tense_info.get(tense)
    }

    #[must_use]
    pub fn packs(&self) -> &[Pack] {
        &self.packs
    }

    #[must_use]
    pub fn pack(&self, id: &PackId) -> Option<&Pack> {
        self.packs.iter().find(|p| &p.id == id)
    }

    /// Packs belonging to any tense of `category`, in catalog order.
    pub fn packs_in<'a>(&'a self, category: &'a Category) -> impl Iterator<Item = &'a Pack> + 'a {
        self.packs.iter().filter(move |p| category.contains(&p.tense))
    }

    /// Packs of one tense, in catalog order.
    pub fn packs_of<'a>(&'a self, tense: &'a TenseId) -> impl Iterator<Item = &'a Pack> + 'a {
        self.packs.iter().filter(move |p| &p.tense == tense)
    }

    /// Total number of sentences across all packs.
    #[must_use]
    pub fn sentence_count(&self) -> usize {
        self.packs.iter().map(Pack::len).sum()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

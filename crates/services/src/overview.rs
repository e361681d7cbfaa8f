//! Derived, read-only figures for the home listing.

use std::sync::Arc;

use tenses_core::model::{Catalog, Category, Pack, PackId, PackProgress, ProgressSnapshot};

use crate::progress_store::ProgressStore;

/// How many recently completed packs the home listing shows.
pub const RECENT_LIMIT: usize = 5;

/// Coarse accuracy grade of a practiced pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBand {
    High,
    Medium,
    Low,
}

impl ProgressBand {
    /// `None` for packs that were never practiced.
    #[must_use]
    pub fn for_progress(progress: &PackProgress) -> Option<Self> {
        if !progress.is_practiced() {
            return None;
        }
        Some(match progress.accuracy_percent() {
            80.. => Self::High,
            60..=79 => Self::Medium,
            _ => Self::Low,
        })
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// One pack line of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackRow {
    pub id: PackId,
    pub tense_name: String,
    pub level_name: String,
    pub description: String,
    pub sentence_count: usize,
    pub practiced: u32,
    pub accuracy_percent: u32,
    pub band: Option<ProgressBand>,
    pub mistakes: usize,
}

impl PackRow {
    fn new(pack: &Pack, progress: &PackProgress) -> Self {
        Self {
            id: pack.id().clone(),
            tense_name: pack.tense_name().to_string(),
            level_name: pack.level_name().to_string(),
            description: pack.description().to_string(),
            sentence_count: pack.len(),
            practiced: progress.practiced(),
            accuracy_percent: progress.accuracy_percent(),
            band: ProgressBand::for_progress(progress),
            mistakes: progress.mistake_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOverview {
    pub name: String,
    pub mistakes: usize,
    pub packs: Vec<PackRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeOverview {
    pub total_mistakes: usize,
    pub recent: Vec<PackRow>,
    pub categories: Vec<CategoryOverview>,
}

/// Assemble the listing from a catalog and a snapshot.
///
/// Packs the snapshot never saw are shown with zeroed progress.
#[must_use]
pub fn build_overview(catalog: &Catalog, snapshot: &ProgressSnapshot) -> HomeOverview {
    let zero = PackProgress::default();
    let row = |pack: &Pack| PackRow::new(pack, snapshot.pack_progress(pack.id()).unwrap_or(&zero));

    let recent = snapshot
        .recently_completed()
        .iter()
        .take(RECENT_LIMIT)
        .filter_map(|id| catalog.pack(id))
        .map(row)
        .collect();

    let categories = catalog
        .categories()
        .iter()
        .map(|category| category_overview(catalog, category, &row))
        .collect();

    HomeOverview {
        total_mistakes: snapshot.total_mistakes(),
        recent,
        categories,
    }
}

fn category_overview(
    catalog: &Catalog,
    category: &Category,
    row: &impl Fn(&Pack) -> PackRow,
) -> CategoryOverview {
    let packs: Vec<PackRow> = category
        .tenses()
        .iter()
        .flat_map(|tense| catalog.packs_of(tense))
        .map(row)
        .collect();
    CategoryOverview {
        name: category.name().to_string(),
        mistakes: packs.iter().map(|p| p.mistakes).sum(),
        packs,
    }
}

/// Home listing over the live progress store.
#[derive(Clone)]
pub struct OverviewService {
    catalog: Arc<Catalog>,
    progress: Arc<ProgressStore>,
}

impl OverviewService {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, progress: Arc<ProgressStore>) -> Self {
        Self { catalog, progress }
    }

    pub async fn home(&self) -> HomeOverview {
        let snapshot = self.progress.snapshot().await;
        build_overview(&self.catalog, &snapshot)
    }
}

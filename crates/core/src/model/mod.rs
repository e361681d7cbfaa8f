pub mod catalog;
mod ids;
pub mod merge;
mod practice;
mod progress;
mod stats;

pub use ids::{PackId, ParseIdError, TenseId, UserId};

pub use catalog::{
    Catalog, CatalogError, Category, Pack, PackFile, Sentence, TenseFile, TenseInfo,
    default_categories,
};
pub use merge::{merge, merge_snapshots};
pub use practice::{PracticeItem, PracticeMode};
pub use progress::{PackProgress, ProgressSnapshot, RECENTLY_COMPLETED_LIMIT};
pub use stats::{SessionStats, percent};

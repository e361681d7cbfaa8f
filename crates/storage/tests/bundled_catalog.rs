use std::path::PathBuf;

use storage::catalog::load_catalog;
use tenses_core::model::{PackId, TenseId};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

#[test]
fn bundled_data_covers_every_category() {
    let catalog = load_catalog(&data_dir()).expect("bundled catalog loads");

    assert_eq!(catalog.categories().len(), 4);
    for category in catalog.categories() {
        assert!(
            catalog.packs_in(category).next().is_some(),
            "{} has no packs",
            category.name()
        );
    }

    let pack = catalog.pack(&PackId::new("present-simple-1")).unwrap();
    assert_eq!(pack.title(), "Present Simple - Level 1");
    let info = catalog.tense_info(&TenseId::new("past-perfect")).unwrap();
    assert!(!info.formula.is_empty());
}

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tenses_core::model::{
    Catalog, CatalogError, Category, TenseFile, TenseId, TenseInfo, default_categories,
};
use thiserror::Error;

/// File holding the explanatory material for every tense.
pub const TENSE_INFO_FILE: &str = "tense-info.json";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogLoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] CatalogError),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the standard catalog from `dir`.
///
/// # Errors
///
/// Returns `CatalogLoadError` when a file is missing, malformed, or the
/// assembled catalog is inconsistent.
pub fn load_catalog(dir: &Path) -> Result<Catalog, CatalogLoadError> {
    load_catalog_with(dir, default_categories())
}

/// Load a catalog for the given categories; one `<tense>.json` per tense.
///
/// # Errors
///
/// Returns `CatalogLoadError` when a file is missing, malformed, or the
/// assembled catalog is inconsistent.
pub fn load_catalog_with(
    dir: &Path,
    categories: Vec<Category>,
) -> Result<Catalog, CatalogLoadError> {
    let info: BTreeMap<TenseId, TenseInfo> = read_json(&dir.join(TENSE_INFO_FILE))?;

    let mut files: Vec<TenseFile> = Vec::new();
    for tense in categories.iter().flat_map(Category::tenses) {
        let file: TenseFile = read_json(&dir.join(format!("{tense}.json")))?;
        files.push(file);
    }

    let catalog = Catalog::new(categories, info, files)?;
    tracing::info!(
        packs = catalog.packs().len(),
        sentences = catalog.sentence_count(),
        "loaded catalog"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenses_core::model::PackId;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn future_only() -> Vec<Category> {
        vec![Category::new("Future Tenses", [TenseId::new("future-simple")])]
    }

    #[test]
    fn loads_packs_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            TENSE_INFO_FILE,
            r#"{"future-simple":{"name":"Future Simple","formula":"will + verb"}}"#,
        );
        write(
            dir.path(),
            "future-simple.json",
            r#"{"tense":"future-simple","packs":[{"id":"future-simple-1","levelName":"Level 1",
               "description":"Plans","sentences":[{"prompt":"p0","answer":"a0"},{"prompt":"p1","answer":"a1"}]}]}"#,
        );

        let catalog = load_catalog_with(dir.path(), future_only()).unwrap();
        let pack = catalog.pack(&PackId::new("future-simple-1")).unwrap();
        assert_eq!(pack.len(), 2);
        assert_eq!(pack.tense_name(), "Future Simple");
    }

    #[test]
    fn missing_tense_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), TENSE_INFO_FILE, "{}");

        let err = load_catalog_with(dir.path(), future_only()).unwrap_err();
        match err {
            CatalogLoadError::Io { path, .. } => assert!(path.ends_with("future-simple.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_info_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), TENSE_INFO_FILE, "[1, 2");
        assert!(matches!(
            load_catalog_with(dir.path(), future_only()),
            Err(CatalogLoadError::Parse { .. })
        ));
    }
}

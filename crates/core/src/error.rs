use thiserror::Error;

use crate::model::CatalogError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("progress data is malformed: {0}")]
    Progress(#[from] serde_json::Error),
}

use thiserror::Error;

use crate::db::DbError;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Failures while answering a request. Empty results are not errors.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Database(#[from] DbError),

    #[error("Query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Failed to encode response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stored date '{date}' is not in YYYY-MM-DD format: {source}")]
    AnchorDate {
        date: String,
        #[source]
        source: chrono::ParseError,
    },
}

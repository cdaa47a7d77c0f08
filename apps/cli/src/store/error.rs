//! List store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("list not found: {0}")]
    NotFound(String),

    #[error("invalid list id: {0}")]
    InvalidId(String),
}

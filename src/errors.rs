use thiserror::Error;

#[derive(Debug, Error)]
pub enum CookbookError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous: {0}")]
    Ambiguous(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<std::io::Error> for CookbookError {
    fn from(e: std::io::Error) -> Self {
        CookbookError::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CookbookError>;

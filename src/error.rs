use thiserror::Error;

/// Failures reported by the remote document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("malformed document data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Errors surfaced by the list operations.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("invalid list token: {0}")]
    InvalidToken(String),

    #[error("item name must not be empty")]
    EmptyName,

    #[error("list {0} does not exist")]
    ListNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

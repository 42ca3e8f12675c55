#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("measurement not found")]
    NotFound,
    #[error("unknown measurement type")]
    UnknownType,
}

pub type Result<T> = std::result::Result<T, StoreError>;

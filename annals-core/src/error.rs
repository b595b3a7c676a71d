use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AnnalsError {
    #[error("Invalid sort column: {column:?}")]
    InvalidSortKey { column: String },

    #[error("Invalid page size: {0} (must be at least 1)")]
    InvalidPageSize(i64),

    #[error("Invalid page: {0} (pages start at 1)")]
    InvalidPage(i64),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Unknown include `{name}` for {entity}")]
    UnknownInclude { entity: &'static str, name: String },

    #[error("Expected at most one {entity}, found several")]
    MultipleMatches { entity: &'static str },

    #[error("A transaction is already active for this unit of work")]
    TransactionActive,

    #[error("{entity} {id} is not tracked")]
    NotTracked { entity: &'static str, id: Uuid },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AnnalsError>;

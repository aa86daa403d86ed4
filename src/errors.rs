use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("unsupported query shape: {0}")]
    UnsupportedQuery(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

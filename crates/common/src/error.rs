use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Invalid digest format")]
    InvalidDigest,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the object simply does not exist, as opposed to a backend failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

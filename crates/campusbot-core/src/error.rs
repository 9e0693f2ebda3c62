use thiserror::Error;

/// Top-level error type for the campus assistant.
///
/// Subsystem crates define their own error types and implement
/// `From<CampusbotError>` so the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CampusbotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for CampusbotError {
    fn from(err: toml::de::Error) -> Self {
        CampusbotError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CampusbotError {
    fn from(err: toml::ser::Error) -> Self {
        CampusbotError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CampusbotError {
    fn from(err: serde_json::Error) -> Self {
        CampusbotError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for campus assistant operations.
pub type Result<T> = std::result::Result<T, CampusbotError>;

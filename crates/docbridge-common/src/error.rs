//! Error types for docbridge

use thiserror::Error;

/// Result type alias for docbridge operations
pub type Result<T> = std::result::Result<T, DocBridgeError>;

const INVALID_REQUEST: &str = "request is invalid";
const MISSING_COLLECTION: &str = "collection doesn't exist";

/// Failure raised by the request gateway itself.
///
/// This is the only error the gateway produces on its own: either the request
/// did not pass validation, or the target collection could not be resolved.
/// Neither case ever reaches the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DatabaseError {
    message: String,
}

impl DatabaseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// A parameter was absent, or the store handle is not ready
    pub fn invalid_request() -> Self {
        Self::new(INVALID_REQUEST)
    }

    /// Collection resolution yielded nothing
    pub fn missing_collection() -> Self {
        Self::new(MISSING_COLLECTION)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Unified error type for all docbridge operations
#[derive(Error, Debug, Clone)]
pub enum DocBridgeError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Driver failure, kept as the driver reported it
    #[cfg(feature = "mongodb-errors")]
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    /// Store-level failure from a non-MongoDB client
    #[error("Store error: {0}")]
    Store(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DocBridgeError {
    /// Returns true if the gateway rejected the request before any store call
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, DocBridgeError::Database(e) if e.message() == INVALID_REQUEST)
    }

    /// Returns true if the target collection could not be resolved
    pub fn is_missing_collection(&self) -> bool {
        matches!(self, DocBridgeError::Database(e) if e.message() == MISSING_COLLECTION)
    }
}

impl From<serde_json::Error> for DocBridgeError {
    fn from(err: serde_json::Error) -> Self {
        DocBridgeError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for DocBridgeError {
    fn from(err: std::io::Error) -> Self {
        DocBridgeError::Configuration(err.to_string())
    }
}

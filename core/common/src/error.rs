//! Common error types for peoplesync.

use thiserror::Error;

/// Top-level error type for peoplesync operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A precondition for the operation does not hold (e.g. no valid remote session).
    #[error("{0}")]
    Precondition(String),

    /// A field value failed format validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The local store already holds an equal contact.
    #[error("Duplicate contact: {0}")]
    DuplicateContact(String),

    /// The local store does not hold the targeted contact.
    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    /// A call to the remote directory failed.
    #[error("Remote directory error: {message}")]
    Remote {
        message: String,
        /// Whether retrying the same call may succeed.
        transient: bool,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// A remote failure that is worth retrying (timeouts, rate limits, 5xx).
    pub fn transient(message: impl Into<String>) -> Self {
        Error::Remote {
            message: message.into(),
            transient: true,
        }
    }

    /// A remote failure that will fail again if retried.
    pub fn remote(message: impl Into<String>) -> Self {
        Error::Remote {
            message: message.into(),
            transient: false,
        }
    }

    /// Check if the error is a transient remote or I/O failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Remote { transient: true, .. } | Error::Io(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::transient("timeout").is_transient());
        assert!(!Error::remote("bad request").is_transient());
        assert!(!Error::ContactNotFound("Alex".to_string()).is_transient());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert!(Error::from(io).is_transient());
    }

    #[test]
    fn test_precondition_message_is_verbatim() {
        let err = Error::Precondition("Please authenticate first".to_string());
        assert_eq!(err.to_string(), "Please authenticate first");
    }
}

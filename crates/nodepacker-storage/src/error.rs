// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Storage error type
#[derive(Error, Debug, Diagnostic)]
pub enum StorageError {
    /// Cache file could not be read or written
    #[error("I/O error on {path}: {message}")]
    #[diagnostic(
        code(storage::io_error),
        help("Check filesystem permissions and available disk space")
    )]
    IoError {
        path: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Cache contents are not a valid inventory
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(storage::serialization_error),
        help("Delete the cache file and run machines_fetch again")
    )]
    SerializationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No default cache location
    #[error("Cannot determine the home directory for the inventory cache")]
    #[diagnostic(
        code(storage::no_home_directory),
        help("Pass --cache-file or set NODEPACKER_CACHE_FILE")
    )]
    NoHomeDirectory,
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Create an IoError
    pub fn io_error(
        path: impl Into<String>,
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }
}

impl From<nodepacker_core::NodepackerError> for StorageError {
    fn from(err: nodepacker_core::NodepackerError) -> Self {
        StorageError::serialization_error(err.to_string(), Some(Box::new(err)))
    }
}

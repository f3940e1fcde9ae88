// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Core error type for nodepacker operations
#[derive(Error, Debug, Diagnostic)]
pub enum NodepackerError {
    /// Quantity string could not be parsed
    #[error("Invalid quantity '{value}': {reason}")]
    #[diagnostic(
        code(nodepacker::invalid_quantity),
        help("Use a Kubernetes quantity such as '500m', '2', '1.5Gi' or '100M'")
    )]
    InvalidQuantity {
        #[allow(unused)]
        value: String,
        #[allow(unused)]
        reason: String,
    },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(nodepacker::serialization_error),
        help("Ensure the data is valid JSON or YAML")
    )]
    SerializationError {
        #[allow(unused)]
        message: String,
        #[source]
        #[allow(unused)]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for nodepacker operations
pub type Result<T> = std::result::Result<T, NodepackerError>;

impl NodepackerError {
    /// Create an InvalidQuantity error
    pub fn invalid_quantity(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuantity {
            value: value.into(),
            reason: reason.into(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = NodepackerError::invalid_quantity("12xyz", "unknown suffix 'xyz'");
        assert!(matches!(err, NodepackerError::InvalidQuantity { .. }));
        assert_eq!(err.to_string(), "Invalid quantity '12xyz': unknown suffix 'xyz'");
    }
}

use miette::Diagnostic;
use thiserror::Error;

/// Error type for inventory and manifest sources
#[derive(Error, Debug, Diagnostic)]
pub enum SourceError {
    /// Command exited unsuccessfully or could not be started
    #[error("Command '{command}' failed with exit code {exit_code}")]
    #[diagnostic(code(sources::command_failed), help("stderr: {stderr}"))]
    CommandFailed {
        #[allow(unused)]
        command: String,
        #[allow(unused)]
        exit_code: i32,
        #[allow(unused)]
        stderr: String,
    },

    /// Command did not finish in time
    #[error("Command '{command}' timed out after {seconds}s")]
    #[diagnostic(
        code(sources::timeout),
        help("Check that gcloud is authenticated, or raise --fetch-timeout-secs")
    )]
    Timeout {
        #[allow(unused)]
        command: String,
        #[allow(unused)]
        seconds: u64,
    },

    /// Manifest file could not be read or decoded
    #[error("Failed to load manifest {path}: {message}")]
    #[diagnostic(
        code(sources::manifest_error),
        help("Check that the file is valid YAML with apiVersion and kind set")
    )]
    ManifestError {
        #[allow(unused)]
        path: String,
        #[allow(unused)]
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Manifest lacks a field the planner needs
    #[error("Manifest {path} is missing {field}")]
    #[diagnostic(
        code(sources::missing_field),
        help("Set {field} explicitly in the manifest")
    )]
    MissingField {
        #[allow(unused)]
        path: String,
        #[allow(unused)]
        field: String,
    },

    /// A resource request is not a valid quantity
    #[error("Invalid quantity in {path}: {message}")]
    #[diagnostic(
        code(sources::invalid_quantity),
        help("Use Kubernetes quantities such as 500m, 2, 512Mi or 1G")
    )]
    InvalidQuantity {
        #[allow(unused)]
        path: String,
        #[allow(unused)]
        message: String,
    },
}

/// Result type for source operations
pub type Result<T> = std::result::Result<T, SourceError>;

impl SourceError {
    pub fn command_failed(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn timeout(command: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            command: command.into(),
            seconds,
        }
    }

    pub fn manifest_error(
        path: impl Into<String>,
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ManifestError {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    pub fn missing_field(path: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            path: path.into(),
            field: field.into(),
        }
    }

    pub fn invalid_quantity(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidQuantity {
            path: path.into(),
            message: message.into(),
        }
    }
}

//! Error types for the deploy pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by a single remote control-plane call.
///
/// `NotFound` and `Conflict` are normal branches for the reconciliation
/// logic (a function that does not exist yet is created, a create that
/// loses a race falls through to update); everything else is fatal.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The named remote resource does not exist.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The named remote resource already exists.
    #[error("{resource} already exists")]
    Conflict { resource: String },

    /// Any other failure reported by the remote service.
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Conflict { .. })
    }
}

/// Errors that can abort a deploy run.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Missing or malformed configuration, including an invalid Swagger
    /// document. Detected before any remote call is made.
    #[error("configuration error: {0}")]
    Config(String),

    /// The packaging step did not produce an expected output.
    #[error("build step did not produce {what}")]
    MissingArtifact { what: &'static str },

    /// Writing the deployment archive failed.
    #[error("failed to build archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// A remote create/update/import call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// File system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for deploy operations.
pub type DeployResult<T> = Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_a_distinct_branch() {
        let err = ServiceError::NotFound {
            resource: "function 'f'".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert_eq!(err.to_string(), "function 'f' not found");
    }

    #[test]
    fn config_error_names_the_problem() {
        let err = DeployError::Config("missing 'paths' key".to_string());
        assert_eq!(err.to_string(), "configuration error: missing 'paths' key");
    }
}

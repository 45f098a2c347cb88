//! Error types and error handling
//!
//! Introspection and detection failures never surface through this type at the
//! component boundary; they degrade to empty metadata. Template and
//! materialization failures are fatal for the artifact being generated and are
//! wrapped in [`ForgeError::Artifact`] so the caller can name the entity and
//! artifact kind.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::generate::ArtifactKind;

/// Result alias used throughout the crate
pub type ForgeResult<T> = Result<T, ForgeError>;

/// Filesystem operation that failed during materialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    /// Reading an existing target
    Read,
    /// Writing the rendered content
    Write,
    /// Creating parent directories
    CreateDir,
    /// Appending to a shared registry
    Append,
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::CreateDir => "create directory",
            Self::Append => "append",
        };
        f.write_str(name)
    }
}

/// Generator error type
#[derive(Debug, Error)]
pub enum ForgeError {
    /// The connection URL names a dialect without a metadata driver
    #[error("Unsupported database dialect: {0}")]
    UnsupportedDialect(String),

    /// Metadata query failed
    #[error("Introspection error: {0}")]
    Introspection(String),

    /// Template missing from both search locations
    #[error(
        "Template '{name}' not found. Checked:\n  - {}\n  - {}",
        override_path.display(),
        packaged_path.display()
    )]
    TemplateNotFound {
        /// Template name
        name: String,
        /// Project override location that was checked first
        override_path: PathBuf,
        /// Packaged default location that was checked second
        packaged_path: PathBuf,
    },

    /// Template could not be parsed or rendered
    #[error("Failed to render template '{name}': {message}")]
    Render {
        /// Template name
        name: String,
        /// Renderer message
        message: String,
    },

    /// Filesystem failure while materializing an artifact
    #[error("Failed to {operation} {}: {source}", path.display())]
    Materialize {
        /// Target path
        path: PathBuf,
        /// Operation that failed
        operation: FileOperation,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Entity name or source is unusable
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    /// Fatal failure scoped to one artifact of one entity
    #[error("{entity}: {kind} generation failed: {source}")]
    Artifact {
        /// Entity being generated
        entity: String,
        /// Artifact kind that failed
        kind: ArtifactKind,
        /// Cause
        #[source]
        source: Box<ForgeError>,
    },
}

impl ForgeError {
    /// Wrap this error with the entity and artifact kind it aborted
    #[must_use]
    pub fn for_artifact(self, entity: &str, kind: ArtifactKind) -> Self {
        match self {
            already @ Self::Artifact { .. } => already,
            other => Self::Artifact {
                entity: entity.to_string(),
                kind,
                source: Box::new(other),
            },
        }
    }

    /// Build a materialization error
    pub fn materialize(
        path: impl Into<PathBuf>,
        operation: FileOperation,
        source: std::io::Error,
    ) -> Self {
        Self::Materialize {
            path: path.into(),
            operation,
            source,
        }
    }
}

impl From<figment::Error> for ForgeError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<sqlx::Error> for ForgeError {
    fn from(err: sqlx::Error) -> Self {
        Self::Introspection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_not_found_lists_both_paths() {
        let err = ForgeError::TemplateNotFound {
            name: "controller".to_string(),
            override_path: PathBuf::from("/project/.acton-forge/templates/controller.rs.hbs"),
            packaged_path: PathBuf::from("/pkg/templates/controller.rs.hbs"),
        };
        let message = err.to_string();
        assert!(message.contains("/project/.acton-forge/templates/controller.rs.hbs"));
        assert!(message.contains("/pkg/templates/controller.rs.hbs"));
    }

    #[test]
    fn test_materialize_names_path_and_operation() {
        let err = ForgeError::materialize(
            "/readonly/out.rs",
            FileOperation::Write,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("write"));
        assert!(message.contains("/readonly/out.rs"));
    }

    #[test]
    fn test_for_artifact_does_not_double_wrap() {
        let err = ForgeError::Config("x".to_string())
            .for_artifact("Invoice", ArtifactKind::Controller)
            .for_artifact("Invoice", ArtifactKind::Route);
        match err {
            ForgeError::Artifact { kind, .. } => assert_eq!(kind, ArtifactKind::Controller),
            other => panic!("unexpected {other:?}"),
        }
    }
}

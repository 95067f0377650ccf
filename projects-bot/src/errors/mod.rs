//! Error types for the project registry.
//!
//! `RegistryError` is what every registry, workflow and command operation
//! returns. Its user-facing variants (`Validation`, `NotFound`, `Unauthorized`,
//! `Conflict`) carry the message reported verbatim to the initiator.

use projects_repository::StoreError;
use projects_shared::{InvalidDownload, RevokeError};
use thiserror::Error;

use crate::directory::DirectoryError;

/// Errors that can occur in registry and workflow operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Malformed input: bad URL, missing flag, nothing to change.
    #[error("{0}")]
    Validation(String),

    /// A project, proposal or realm configuration does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The actor does not hold the capability the operation requires.
    #[error("{0}")]
    Unauthorized(String),

    /// The operation would break a registry invariant.
    #[error("{0}")]
    Conflict(String),

    /// Record store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A required directory step failed.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Neither direct nor fallback delivery of a notification succeeded.
    #[error("Notification failed: {0}")]
    Notification(DirectoryError),
}

impl RegistryError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an unauthorized error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create the error for a project id that does not exist.
    pub fn project_not_found() -> Self {
        Self::NotFound("The specified project ID does not exist.".to_string())
    }

    /// Create the error for a name already taken by another project.
    pub fn duplicate_name() -> Self {
        Self::Conflict("The specified project name matches another project.".to_string())
    }

    /// Create the error for a name that yields no channel name.
    pub fn unusable_name() -> Self {
        Self::Validation(
            "The specified project name must contain at least one letter or digit.".to_string(),
        )
    }

    /// Whether the error is caused by the request rather than by infrastructure.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::Unauthorized(_) | Self::Conflict(_)
        )
    }
}

impl From<RevokeError> for RegistryError {
    fn from(err: RevokeError) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl From<InvalidDownload> for RegistryError {
    fn from(_: InvalidDownload) -> Self {
        Self::Validation("The specified download link is invalid.".to_string())
    }
}

//! Custom error types for the task board.
//!
//! Parsing never fails; these errors come from the storage collaborator,
//! from patches that name unknown fields, and from configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for task board operations
#[derive(Error, Debug)]
pub enum TaskboardError {
    // =========================================================================
    // Record Errors
    // =========================================================================
    /// No record stored under this key
    #[error("Task not found: {id}")]
    NotFound { id: String },

    /// A record already exists under this key
    #[error("Task already exists: {id}")]
    AlreadyExists { id: String },

    /// Key cannot be mapped to a storage location
    #[error("Invalid task id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    /// Patch names a field the mutator does not know, or carries a bad value
    #[error("Invalid patch: {message}")]
    InvalidPatch { message: String },

    // =========================================================================
    // Archive Errors
    // =========================================================================
    /// Archive header missing or malformed
    #[error("Archive error: {message}")]
    Archive { message: String },

    // =========================================================================
    // Job Errors
    // =========================================================================
    /// No job with this id in the side file
    #[error("Job not found: {id}")]
    JobNotFound { id: String },

    /// Job definition is missing a required value
    #[error("Invalid job: {message}")]
    InvalidJob { message: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TaskboardError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a not-found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an invalid-patch error
    pub fn invalid_patch(message: impl Into<String>) -> Self {
        Self::InvalidPatch {
            message: message.into(),
        }
    }

    /// Create an invalid-id error
    pub fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create an archive error
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if the error means the requested key is absent
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::JobNotFound { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Check if the error was caused by caller input rather than storage
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::AlreadyExists { .. }
                | Self::InvalidId { .. }
                | Self::InvalidPatch { .. }
                | Self::JobNotFound { .. }
                | Self::InvalidJob { .. }
                | Self::Archive { .. }
        )
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } | Self::JobNotFound { .. } => 2,
            Self::InvalidPatch { .. } | Self::InvalidId { .. } | Self::InvalidJob { .. } => 3,
            Self::AlreadyExists { .. } => 4,
            Self::Archive { .. } => 5,
            Self::Config { .. } | Self::InvalidConfig { .. } => 7,
            _ => 1,
        }
    }
}

/// Type alias for task board results
pub type Result<T> = std::result::Result<T, TaskboardError>;

//! Storage for task documents.
//!
//! Documents live on one of two shelves. Keys are opaque task ids; the
//! store decides how an id maps to storage.

pub mod fs;
pub mod jobs;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;

use crate::error::{Result, TaskboardError};

pub use self::fs::FsTaskStore;
pub use self::jobs::{JobRecord, JobRun, JobStore, NewJob};

/// Extension of stored documents.
pub const DOCUMENT_EXTENSION: &str = "md";

/// Where a document currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shelf {
    Active,
    Archive,
}

impl fmt::Display for Shelf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shelf::Active => write!(f, "active"),
            Shelf::Archive => write!(f, "archive"),
        }
    }
}

/// Advisory lock over one record, released on drop.
///
/// Guards a read-modify-write sequence. Readers never take it.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct RecordGuard {
    id: String,
    lock: Option<File>,
}

impl RecordGuard {
    /// A guard that holds no OS lock, for stores without concurrency.
    pub fn unlocked(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lock: None,
        }
    }

    pub(crate) fn held(id: impl Into<String>, lock: File) -> Self {
        Self {
            id: id.into(),
            lock: Some(lock),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.lock.is_some()
    }
}

impl Drop for RecordGuard {
    fn drop(&mut self) {
        if let Some(lock) = &self.lock {
            let _ = fs2::FileExt::unlock(lock);
        }
    }
}

/// Key/text storage for task documents.
///
/// Missing keys are [`TaskboardError::NotFound`]; IO errors are returned
/// unchanged and never retried.
pub trait TaskStore {
    fn read(&self, shelf: Shelf, id: &str) -> Result<String>;

    /// Replace the document wholesale, creating it when absent.
    fn write(&mut self, shelf: Shelf, id: &str, text: &str) -> Result<()>;

    fn delete(&mut self, shelf: Shelf, id: &str) -> Result<()>;

    /// Ids on `shelf`, excluding templates and reserved keys.
    fn list(&self, shelf: Shelf) -> Result<Vec<String>>;

    fn exists(&self, shelf: Shelf, id: &str) -> Result<bool>;

    /// Move a document between shelves without touching its text.
    fn relocate(&mut self, id: &str, from: Shelf, to: Shelf) -> Result<()>;

    /// Take the advisory lock for `id`.
    fn lock(&self, id: &str) -> Result<RecordGuard>;
}

/// Reject ids that could escape the store or collide with its own files.
pub fn validate_id(id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        Some("id is empty")
    } else if id.contains(['/', '\\']) {
        Some("id contains a path separator")
    } else if id.contains("..") {
        Some("id contains '..'")
    } else if id.starts_with('.') {
        Some("id starts with '.'")
    } else if id.chars().any(char::is_control) {
        Some("id contains control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(TaskboardError::invalid_id(id, reason)),
        None => Ok(()),
    }
}

/// Trim user input and drop a trailing `.md`, then validate.
pub fn normalize_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let id = trimmed
        .strip_suffix(&format!(".{DOCUMENT_EXTENSION}"))
        .unwrap_or(trimmed);
    validate_id(id)?;
    Ok(id.to_string())
}

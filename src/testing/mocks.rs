//! In-memory test doubles.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::error::{Result, TaskboardError};
use crate::store::{validate_id, RecordGuard, Shelf, TaskStore};

/// In-memory [`TaskStore`].
///
/// Lists ids in sorted order. Locks are counted, not held.
///
/// # Example
///
/// ```rust,ignore
/// let store = MockTaskStore::new()
///     .with_document("weekly", "# 任务清单: 周报\n")
///     .with_read_failure("broken");
///
/// assert_eq!(store.list(Shelf::Active).unwrap(), vec!["weekly"]);
/// ```
#[derive(Debug, Default)]
pub struct MockTaskStore {
    documents: BTreeMap<(Shelf, String), String>,
    read_failures: BTreeSet<String>,
    write_error: Option<String>,
    lock_counts: Mutex<BTreeMap<String, u32>>,
    writes: AtomicU32,
}

impl MockTaskStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an active document.
    #[must_use]
    pub fn with_document(mut self, id: &str, text: &str) -> Self {
        self.documents
            .insert((Shelf::Active, id.to_string()), text.to_string());
        self
    }

    /// Seed an archived document, stored as given.
    #[must_use]
    pub fn with_archived(mut self, id: &str, text: &str) -> Self {
        self.documents
            .insert((Shelf::Archive, id.to_string()), text.to_string());
        self
    }

    /// Make every read of `id` fail with an IO error.
    #[must_use]
    pub fn with_read_failure(mut self, id: &str) -> Self {
        self.read_failures.insert(id.to_string());
        self
    }

    /// Make every write fail with an IO error.
    #[must_use]
    pub fn with_write_error(mut self, message: &str) -> Self {
        self.write_error = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn contains(&self, shelf: Shelf, id: &str) -> bool {
        self.documents.contains_key(&(shelf, id.to_string()))
    }

    /// Stored text, if any.
    #[must_use]
    pub fn text(&self, shelf: Shelf, id: &str) -> Option<&str> {
        self.documents
            .get(&(shelf, id.to_string()))
            .map(String::as_str)
    }

    /// Times [`TaskStore::lock`] was called for `id`.
    #[must_use]
    pub fn lock_count(&self, id: &str) -> u32 {
        self.lock_counts
            .lock()
            .map(|counts| counts.get(id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    #[must_use]
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl TaskStore for MockTaskStore {
    fn read(&self, shelf: Shelf, id: &str) -> Result<String> {
        validate_id(id)?;
        if self.read_failures.contains(id) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("stream did not contain valid UTF-8: {id}"),
            )
            .into());
        }
        self.text(shelf, id)
            .map(str::to_string)
            .ok_or_else(|| TaskboardError::not_found(id))
    }

    fn write(&mut self, shelf: Shelf, id: &str, text: &str) -> Result<()> {
        validate_id(id)?;
        if let Some(message) = &self.write_error {
            return Err(std::io::Error::other(message.clone()).into());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.documents
            .insert((shelf, id.to_string()), text.to_string());
        Ok(())
    }

    fn delete(&mut self, shelf: Shelf, id: &str) -> Result<()> {
        validate_id(id)?;
        self.documents
            .remove(&(shelf, id.to_string()))
            .map(|_| ())
            .ok_or_else(|| TaskboardError::not_found(id))
    }

    fn list(&self, shelf: Shelf) -> Result<Vec<String>> {
        Ok(self
            .documents
            .keys()
            .filter(|(s, _)| *s == shelf)
            .map(|(_, id)| id.clone())
            .collect())
    }

    fn exists(&self, shelf: Shelf, id: &str) -> Result<bool> {
        validate_id(id)?;
        Ok(self.contains(shelf, id))
    }

    fn relocate(&mut self, id: &str, from: Shelf, to: Shelf) -> Result<()> {
        validate_id(id)?;
        if from == to {
            return Ok(());
        }
        if self.contains(to, id) {
            return Err(TaskboardError::AlreadyExists { id: id.to_string() });
        }
        let text = self
            .documents
            .remove(&(from, id.to_string()))
            .ok_or_else(|| TaskboardError::not_found(id))?;
        self.documents.insert((to, id.to_string()), text);
        Ok(())
    }

    fn lock(&self, id: &str) -> Result<RecordGuard> {
        validate_id(id)?;
        if let Ok(mut counts) = self.lock_counts.lock() {
            *counts.entry(id.to_string()).or_insert(0) += 1;
        }
        Ok(RecordGuard::unlocked(id))
    }
}

//! File-backed task store: one `<id>.md` per record.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;
use walkdir::WalkDir;

use super::{validate_id, RecordGuard, Shelf, TaskStore, DOCUMENT_EXTENSION};
use crate::error::{Result, TaskboardError};

/// Temporary file suffix for atomic writes.
const TMP_SUFFIX: &str = ".tmp";

/// Lock file suffix for per-record advisory locks.
const LOCK_SUFFIX: &str = ".lock";

/// Default prefix of template documents hidden from listings.
pub const DEFAULT_TEMPLATE_PREFIX: &str = "TEMPLATE";

#[derive(Debug, Clone)]
pub struct FsTaskStore {
    active_dir: PathBuf,
    archive_dir: PathBuf,
    template_prefix: String,
}

impl FsTaskStore {
    #[must_use]
    pub fn new(active_dir: impl AsRef<Path>, archive_dir: impl AsRef<Path>) -> Self {
        Self {
            active_dir: active_dir.as_ref().to_path_buf(),
            archive_dir: archive_dir.as_ref().to_path_buf(),
            template_prefix: DEFAULT_TEMPLATE_PREFIX.to_string(),
        }
    }

    /// Hide documents whose id starts with `prefix` from listings.
    #[must_use]
    pub fn with_template_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.template_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn dir(&self, shelf: Shelf) -> &Path {
        match shelf {
            Shelf::Active => &self.active_dir,
            Shelf::Archive => &self.archive_dir,
        }
    }

    /// Path of the document for `id` on `shelf`.
    pub fn path_of(&self, shelf: Shelf, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self.dir(shelf).join(format!("{id}.{DOCUMENT_EXTENSION}")))
    }

    fn lock_path(&self, id: &str) -> PathBuf {
        self.active_dir
            .join(format!("{id}.{DOCUMENT_EXTENSION}{LOCK_SUFFIX}"))
    }

    fn is_template(&self, id: &str) -> bool {
        !self.template_prefix.is_empty() && id.starts_with(&self.template_prefix)
    }
}

/// Map a missing file to `NotFound`; pass every other IO error through.
fn missing_as_not_found(err: io::Error, id: &str) -> TaskboardError {
    if err.kind() == io::ErrorKind::NotFound {
        TaskboardError::not_found(id)
    } else {
        err.into()
    }
}

impl TaskStore for FsTaskStore {
    fn read(&self, shelf: Shelf, id: &str) -> Result<String> {
        let path = self.path_of(shelf, id)?;
        fs::read_to_string(&path).map_err(|e| missing_as_not_found(e, id))
    }

    fn write(&mut self, shelf: Shelf, id: &str, text: &str) -> Result<()> {
        let path = self.path_of(shelf, id)?;
        fs::create_dir_all(self.dir(shelf))?;

        let tmp_path = self
            .dir(shelf)
            .join(format!("{id}.{DOCUMENT_EXTENSION}{TMP_SUFFIX}"));
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(text.as_bytes())?;
        tmp_file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        debug!(%shelf, id, bytes = text.len(), "wrote document");
        Ok(())
    }

    fn delete(&mut self, shelf: Shelf, id: &str) -> Result<()> {
        let path = self.path_of(shelf, id)?;
        fs::remove_file(&path).map_err(|e| missing_as_not_found(e, id))?;
        debug!(%shelf, id, "deleted document");
        Ok(())
    }

    fn list(&self, shelf: Shelf) -> Result<Vec<String>> {
        let dir = self.dir(shelf);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let ids = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == DOCUMENT_EXTENSION)
                    .unwrap_or(false)
            })
            .filter_map(|e| {
                e.path()
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .filter(|id| !self.is_template(id) && validate_id(id).is_ok())
            .collect();
        Ok(ids)
    }

    fn exists(&self, shelf: Shelf, id: &str) -> Result<bool> {
        Ok(self.path_of(shelf, id)?.is_file())
    }

    fn relocate(&mut self, id: &str, from: Shelf, to: Shelf) -> Result<()> {
        let source = self.path_of(from, id)?;
        let dest = self.path_of(to, id)?;
        if source == dest {
            return Ok(());
        }
        if !source.is_file() {
            return Err(TaskboardError::not_found(id));
        }
        if dest.exists() {
            return Err(TaskboardError::AlreadyExists { id: id.to_string() });
        }
        fs::create_dir_all(self.dir(to))?;
        fs::rename(&source, &dest)?;
        debug!(id, %from, %to, "relocated document");
        Ok(())
    }

    fn lock(&self, id: &str) -> Result<RecordGuard> {
        validate_id(id)?;
        fs::create_dir_all(&self.active_dir)?;
        let lock_file = File::create(self.lock_path(id))?;
        FileExt::lock_exclusive(&lock_file)?;
        Ok(RecordGuard::held(id, lock_file))
    }
}

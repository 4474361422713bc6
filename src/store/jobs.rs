//! Job side file.
//!
//! Jobs are opaque records with a cron-like schedule string. Nothing here
//! schedules or runs them; the only event recorded is a manual "run now".

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;
use uuid::Uuid;

use crate::document::clock::timestamp_serde;
use crate::error::{Result, TaskboardError};

/// Run history entries kept per job.
pub const MAX_HISTORY: usize = 10;

/// Status recorded for runs triggered by hand.
pub const MANUAL_RUN: &str = "manual";

const TMP_SUFFIX: &str = ".tmp";
const LOCK_SUFFIX: &str = ".lock";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRun {
    #[serde(with = "timestamp_serde")]
    pub run_at: NaiveDateTime,
    pub status: String,
    #[serde(default)]
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    pub name: String,
    pub command: String,
    pub schedule: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, with = "timestamp_serde::option")]
    pub last_run: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp_serde::option")]
    pub next_run: Option<NaiveDateTime>,
    /// Oldest first, at most [`MAX_HISTORY`] entries.
    #[serde(default)]
    pub history: Vec<JobRun>,
}

fn default_enabled() -> bool {
    true
}

/// Caller-supplied part of a new job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub schedule: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl NewJob {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TaskboardError::InvalidJob {
                message: "name must not be empty".to_string(),
            });
        }
        if self.command.trim().is_empty() {
            return Err(TaskboardError::InvalidJob {
                message: "command must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl JobRecord {
    /// Append a run, dropping the oldest entries past [`MAX_HISTORY`].
    pub fn push_run(&mut self, run: JobRun) {
        self.last_run = Some(run.run_at);
        self.history.push(run);
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
    }
}

/// Jobs persisted as one JSON array.
#[derive(Debug, Clone)]
pub struct JobStore {
    path: PathBuf,
}

impl JobStore {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// All jobs; an absent file is an empty list.
    pub fn list(&self) -> Result<Vec<JobRecord>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get(&self, id: &str) -> Result<JobRecord> {
        self.list()?
            .into_iter()
            .find(|job| job.id == id)
            .ok_or_else(|| TaskboardError::JobNotFound { id: id.to_string() })
    }

    pub fn add(&self, job: NewJob) -> Result<JobRecord> {
        job.validate()?;
        let record = JobRecord {
            id: Uuid::new_v4().to_string(),
            name: job.name.trim().to_string(),
            command: job.command,
            schedule: job.schedule.trim().to_string(),
            enabled: job.enabled,
            last_run: None,
            next_run: None,
            history: Vec::new(),
        };
        self.modify(|jobs| {
            jobs.push(record.clone());
            Ok(())
        })?;
        debug!(id = %record.id, name = %record.name, "added job");
        Ok(record)
    }

    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<JobRecord> {
        self.modify_job(id, |job| job.enabled = enabled)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        self.modify(|jobs| {
            let before = jobs.len();
            jobs.retain(|job| job.id != id);
            if jobs.len() == before {
                return Err(TaskboardError::JobNotFound { id: id.to_string() });
            }
            Ok(())
        })?;
        debug!(id, "removed job");
        Ok(())
    }

    /// Record a manual run at `at`.
    pub fn record_run(&self, id: &str, at: NaiveDateTime, output: Option<&str>) -> Result<JobRecord> {
        self.modify_job(id, |job| {
            job.push_run(JobRun {
                run_at: at,
                status: MANUAL_RUN.to_string(),
                output: output.unwrap_or_default().to_string(),
            })
        })
    }

    fn modify_job(&self, id: &str, f: impl FnOnce(&mut JobRecord)) -> Result<JobRecord> {
        self.modify(|jobs| {
            let job = jobs
                .iter_mut()
                .find(|job| job.id == id)
                .ok_or_else(|| TaskboardError::JobNotFound { id: id.to_string() })?;
            f(job);
            Ok(job.clone())
        })
    }

    /// Read-modify-write under an exclusive lock. Nothing is written when
    /// `f` fails.
    fn modify<T>(&self, f: impl FnOnce(&mut Vec<JobRecord>) -> Result<T>) -> Result<T> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let lock_file = File::create(self.sibling(LOCK_SUFFIX))?;
        FileExt::lock_exclusive(&lock_file)?;

        let mut jobs = self.list()?;
        let out = f(&mut jobs)?;
        self.save(&jobs)?;

        let _ = FileExt::unlock(&lock_file);
        Ok(out)
    }

    fn save(&self, jobs: &[JobRecord]) -> Result<()> {
        let tmp_path = self.sibling(TMP_SUFFIX);
        let json = serde_json::to_string_pretty(jobs)?;

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

//! Board configuration loaded from `.taskboard/settings.json`.
//!
//! Every key is optional. Relative paths resolve against the board root.

pub mod validation;

pub use validation::{ConfigValidator, ValidationReport};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::document::{builtin_agents, Agent, AgentTable, Grammar};
use crate::error::{Result, TaskboardError};
use crate::store::fs::DEFAULT_TEMPLATE_PREFIX;

/// Directory holding board settings and side files.
pub const CONFIG_DIR: &str = ".taskboard";

/// Settings file name inside [`CONFIG_DIR`].
pub const SETTINGS_FILE: &str = "settings.json";

/// Archive subdirectory used when `archiveDir` is unset.
pub const DEFAULT_ARCHIVE_SUBDIR: &str = "archive";

fn default_tasks_dir() -> PathBuf {
    PathBuf::from("tasks")
}

fn default_jobs_file() -> PathBuf {
    Path::new(CONFIG_DIR).join("jobs.json")
}

fn default_template_prefix() -> String {
    DEFAULT_TEMPLATE_PREFIX.to_string()
}

fn default_summary_log_limit() -> usize {
    5
}

fn default_preview_chars() -> usize {
    500
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    #[serde(default = "default_tasks_dir")]
    pub tasks_dir: PathBuf,

    /// Defaults to an `archive` directory inside the tasks directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_dir: Option<PathBuf>,

    #[serde(default = "default_jobs_file")]
    pub jobs_file: PathBuf,

    /// Documents whose id starts with this prefix are hidden from listings.
    #[serde(default = "default_template_prefix")]
    pub template_prefix: String,

    /// Execution records shown per card.
    #[serde(default = "default_summary_log_limit")]
    pub summary_log_limit: usize,

    /// Characters of content shown per card.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    #[serde(default = "builtin_agents")]
    pub agents: Vec<Agent>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            tasks_dir: default_tasks_dir(),
            archive_dir: None,
            jobs_file: default_jobs_file(),
            template_prefix: default_template_prefix(),
            summary_log_limit: default_summary_log_limit(),
            preview_chars: default_preview_chars(),
            agents: builtin_agents(),
        }
    }
}

/// Absolute locations derived from a config and a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardPaths {
    pub settings: PathBuf,
    pub tasks_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub jobs_file: PathBuf,
}

impl BoardConfig {
    /// Load settings for `root`; a missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let settings_path = Self::settings_path(root);

        if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).map_err(|e| {
                TaskboardError::config_with_path(
                    format!("failed to parse settings: {e}"),
                    settings_path.clone(),
                )
            })
        } else {
            Ok(Self::default())
        }
    }

    #[must_use]
    pub fn settings_path(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(SETTINGS_FILE)
    }

    /// Replace the tasks directory, e.g. from `TASKS_DIR`.
    #[must_use]
    pub fn with_tasks_dir(mut self, tasks_dir: impl Into<PathBuf>) -> Self {
        self.tasks_dir = tasks_dir.into();
        self
    }

    #[must_use]
    pub fn paths(&self, root: &Path) -> BoardPaths {
        let tasks_dir = root.join(&self.tasks_dir);
        let archive_dir = match &self.archive_dir {
            Some(dir) => root.join(dir),
            None => tasks_dir.join(DEFAULT_ARCHIVE_SUBDIR),
        };
        BoardPaths {
            settings: Self::settings_path(root),
            tasks_dir,
            archive_dir,
            jobs_file: root.join(&self.jobs_file),
        }
    }

    /// Validated agent table.
    pub fn agent_table(&self) -> Result<AgentTable> {
        AgentTable::new(self.agents.clone())
    }

    pub fn grammar(&self) -> Result<Grammar> {
        Grammar::new(self.agent_table()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_settings(root: &Path, json: &str) {
        let path = BoardConfig::settings_path(root);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, json).unwrap();
    }

    #[test]
    fn test_missing_settings_use_defaults() {
        let temp = TempDir::new().unwrap();
        let config = BoardConfig::load(temp.path()).unwrap();
        assert_eq!(config, BoardConfig::default());
        assert_eq!(config.preview_chars, 500);
        assert_eq!(config.summary_log_limit, 5);
        assert_eq!(config.agents.len(), 5);
    }

    #[test]
    fn test_partial_settings() {
        let temp = TempDir::new().unwrap();
        write_settings(temp.path(), r#"{"tasksDir": "checklists", "previewChars": 80}"#);
        let config = BoardConfig::load(temp.path()).unwrap();
        assert_eq!(config.tasks_dir, PathBuf::from("checklists"));
        assert_eq!(config.preview_chars, 80);
        assert_eq!(config.template_prefix, "TEMPLATE");
    }

    #[test]
    fn test_malformed_settings_report_path() {
        let temp = TempDir::new().unwrap();
        write_settings(temp.path(), "{ nope");
        match BoardConfig::load(temp.path()) {
            Err(TaskboardError::Config { path, .. }) => {
                assert_eq!(path, Some(BoardConfig::settings_path(temp.path())));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_paths_resolution() {
        let root = Path::new("/srv/board");
        let paths = BoardConfig::default().paths(root);
        assert_eq!(paths.tasks_dir, PathBuf::from("/srv/board/tasks"));
        assert_eq!(paths.archive_dir, PathBuf::from("/srv/board/tasks/archive"));
        assert_eq!(paths.jobs_file, PathBuf::from("/srv/board/.taskboard/jobs.json"));

        let moved = BoardConfig::default().with_tasks_dir("/data/checklists").paths(root);
        assert_eq!(moved.tasks_dir, PathBuf::from("/data/checklists"));
        assert_eq!(moved.archive_dir, PathBuf::from("/data/checklists/archive"));
    }

    #[test]
    fn test_custom_agents() {
        let temp = TempDir::new().unwrap();
        write_settings(
            temp.path(),
            r#"{"agents": [{"name": "甲", "icon": "🟠", "color": "orange"}]}"#,
        );
        let config = BoardConfig::load(temp.path()).unwrap();
        let table = config.agent_table().unwrap();
        assert_eq!(table.default_agent().name, "甲");
        assert!(config.grammar().is_ok());
    }
}

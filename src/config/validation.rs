//! Configuration validation.
//!
//! # Example
//!
//! ```rust,ignore
//! use taskboard::config::ConfigValidator;
//! use std::path::Path;
//!
//! let report = ConfigValidator::new(Path::new("/srv/board")).validate();
//! if !report.is_valid() {
//!     eprintln!("{}", report.verbose_report());
//!     std::process::exit(report.exit_code());
//! }
//! ```

use std::path::{Path, PathBuf};

use super::BoardConfig;

/// Errors and warnings found in one board's configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Problems that make the board unusable.
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub files_checked: Vec<PathBuf>,
}

impl ValidationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings do not affect validity.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_valid() {
            0
        } else {
            1
        }
    }

    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_valid() {
            if self.warnings.is_empty() {
                "Configuration is valid.".to_string()
            } else {
                format!(
                    "Configuration is valid with {} warning(s).",
                    self.warnings.len()
                )
            }
        } else {
            format!(
                "Configuration is invalid with {} error(s).",
                self.errors.len()
            )
        }
    }

    /// Multi-line report listing files, errors and warnings.
    #[must_use]
    pub fn verbose_report(&self) -> String {
        let mut lines = vec![
            "Configuration Validation Report".to_string(),
            "\u{2500}".repeat(50),
        ];

        if !self.files_checked.is_empty() {
            lines.push(String::new());
            lines.push(format!("Files checked ({}):", self.files_checked.len()));
            for file in &self.files_checked {
                lines.push(format!("  - {}", file.display()));
            }
        }

        if !self.errors.is_empty() {
            lines.push(String::new());
            lines.push(format!("Errors ({}):", self.errors.len()));
            for error in &self.errors {
                lines.push(format!("  \u{2717} {error}"));
            }
        }

        if !self.warnings.is_empty() {
            lines.push(String::new());
            lines.push(format!("Warnings ({}):", self.warnings.len()));
            for warning in &self.warnings {
                lines.push(format!("  \u{26a0} {warning}"));
            }
        }

        lines.push(String::new());
        lines.push(format!("Status: {}", self.summary()));
        lines.join("\n")
    }
}

/// Checks a board root's settings file and the values it resolves to.
#[derive(Debug, Clone)]
pub struct ConfigValidator {
    root: PathBuf,
    tasks_dir_override: Option<PathBuf>,
}

impl ConfigValidator {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            tasks_dir_override: None,
        }
    }

    /// Validate as if the tasks directory were `dir`.
    #[must_use]
    pub fn with_tasks_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.tasks_dir_override = dir;
        self
    }

    /// Validation problems are reported, never returned as errors.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let settings_path = BoardConfig::settings_path(&self.root);
        report.files_checked.push(settings_path.clone());

        if settings_path.exists() {
            match std::fs::read_to_string(&settings_path) {
                Ok(content) => {
                    if let Err(e) = serde_json::from_str::<serde_json::Value>(&content) {
                        report.errors.push(format!(
                            "settings.json syntax error: {} (line {}, column {})",
                            e,
                            e.line(),
                            e.column()
                        ));
                        return report;
                    }
                }
                Err(e) => {
                    report.errors.push(format!("Cannot read settings.json: {e}"));
                    return report;
                }
            }
        }

        let mut config = match BoardConfig::load(&self.root) {
            Ok(config) => config,
            Err(e) => {
                report.errors.push(e.to_string());
                return report;
            }
        };
        if let Some(dir) = &self.tasks_dir_override {
            config = config.with_tasks_dir(dir.clone());
        }

        Self::check_values(&config, &mut report);

        let paths = config.paths(&self.root);
        if paths.tasks_dir == paths.archive_dir {
            report
                .errors
                .push("archiveDir must differ from tasksDir".to_string());
        }
        if !paths.tasks_dir.is_dir() {
            report.warnings.push(format!(
                "tasks directory {} does not exist yet",
                paths.tasks_dir.display()
            ));
        }

        report
    }

    fn check_values(config: &BoardConfig, report: &mut ValidationReport) {
        if config.tasks_dir.as_os_str().is_empty() {
            report.errors.push("tasksDir must not be empty".to_string());
        }
        if config.jobs_file.as_os_str().is_empty() {
            report.errors.push("jobsFile must not be empty".to_string());
        }
        if config.preview_chars == 0 {
            report
                .errors
                .push("previewChars must be greater than 0".to_string());
        }
        if config.summary_log_limit == 0 {
            report
                .errors
                .push("summaryLogLimit must be greater than 0".to_string());
        }
        if config.template_prefix.is_empty() {
            report
                .warnings
                .push("templatePrefix is empty; template documents will be listed".to_string());
        }
        if let Err(e) = config.agent_table() {
            report.errors.push(e.to_string());
        }
    }
}

//! Structured projection of a checklist document.
//!
//! A [`TaskRecord`] holds no state of its own: it is rebuilt from the
//! document text on every read.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::clock::timestamp_serde;
use super::vocab::{Status, NOT_STARTED};

// ============================================================================
// Fields
// ============================================================================

/// Recognized fields of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Status,
    Agent,
    CreatedAt,
    UpdatedAt,
    Owner,
    SortOrder,
    Blocker,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::Status => "status",
            Field::Agent => "agent",
            Field::CreatedAt => "created_at",
            Field::UpdatedAt => "updated_at",
            Field::Owner => "owner",
            Field::SortOrder => "sort_order",
            Field::Blocker => "blocker",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Checkbox counts over the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    #[must_use]
    pub fn new(completed: usize, total: usize) -> Self {
        Self {
            completed: completed.min(total),
            total,
        }
    }

    /// `floor(completed / total * 100)`, 0 when there are no checkboxes.
    #[must_use]
    pub fn percent(&self) -> u8 {
        percent_of(self.completed, self.total)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

pub(crate) fn percent_of(completed: usize, total: usize) -> u8 {
    if total == 0 {
        0
    } else {
        // Integer division floors; completed <= total keeps this within 0..=100.
        (completed.min(total) * 100 / total) as u8
    }
}

// ============================================================================
// Phases
// ============================================================================

/// A checkbox item inside a phase section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseItem {
    pub text: String,
    pub checked: bool,
}

/// A `Phase N` section and its checkbox items, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub id: u32,
    pub name: String,
    pub items: Vec<PhaseItem>,
}

impl Phase {
    #[must_use]
    pub fn completed(&self) -> usize {
        self.items.iter().filter(|i| i.checked).count()
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        percent_of(self.completed(), self.items.len())
    }

    /// A phase is closed once it has items and all of them are checked.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.checked)
    }

    /// `Phase N: name`, or `Phase N` for unnamed phases.
    #[must_use]
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("Phase {}", self.id)
        } else {
            format!("Phase {}: {}", self.id, self.name)
        }
    }
}

/// Label of the first unclosed phase; the last phase once all are closed.
#[must_use]
pub fn current_phase(phases: &[Phase]) -> String {
    phases
        .iter()
        .find(|p| !p.is_closed())
        .or_else(|| phases.last())
        .map(Phase::label)
        .unwrap_or_else(|| NOT_STARTED.to_string())
}

// ============================================================================
// Execution Records
// ============================================================================

/// One timestamped line of the execution log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    #[serde(with = "timestamp_serde")]
    pub at: NaiveDateTime,
    pub action: String,
}

// ============================================================================
// Task Record
// ============================================================================

/// Everything the parser recognizes in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Storage key; never read from the document body.
    pub id: String,
    pub title: String,
    pub status: Status,
    pub agent_name: String,
    pub agent_icon: String,
    pub agent_color: String,
    pub owner: String,
    pub sort_order: i64,
    #[serde(with = "timestamp_serde")]
    pub created_at: NaiveDateTime,
    #[serde(with = "timestamp_serde")]
    pub updated_at: NaiveDateTime,
    pub progress: Progress,
    pub current_phase: String,
    pub phases: Vec<Phase>,
    /// Checkbox items outside every phase section.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loose_items: Vec<PhaseItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocker: Option<String>,
    /// Document order, newest last.
    pub execution_records: Vec<ExecutionRecord>,
    /// Fields that fell back to their default value.
    #[serde(default)]
    pub defaulted: BTreeSet<Field>,
}

impl TaskRecord {
    /// Whether `field` was substituted by a default rather than found.
    #[must_use]
    pub fn is_default(&self, field: Field) -> bool {
        self.defaulted.contains(&field)
    }

    /// The `limit` most recent execution records, oldest first.
    #[must_use]
    pub fn recent_records(&self, limit: usize) -> &[ExecutionRecord] {
        let start = self.execution_records.len().saturating_sub(limit);
        &self.execution_records[start..]
    }
}

//! Serializable views handed to the CLI and other front ends.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::policy::Groupable;
use crate::archive::ArchiveHeader;
use crate::document::clock::timestamp_serde;
use crate::document::{ExecutionRecord, Field, Phase, Status, TaskRecord};
use crate::store::Shelf;

/// Marker appended to truncated previews.
pub const ELLIPSIS: &str = "...";

/// First `max_chars` characters of `content`, with [`ELLIPSIS`] when cut.
#[must_use]
pub fn preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &content[..cut]),
        None => content.to_string(),
    }
}

/// One card on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub status_glyph: String,
    pub status_text: String,
    pub agent_icon: String,
    pub agent_name: String,
    pub agent_color: String,
    pub progress: String,
    pub progress_percent: u8,
    pub current_phase: String,
    #[serde(with = "timestamp_serde")]
    pub created_at: NaiveDateTime,
    #[serde(with = "timestamp_serde")]
    pub updated_at: NaiveDateTime,
    pub owner: String,
    pub sort_order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocker: Option<String>,
    pub recent_records: Vec<ExecutionRecord>,
    pub content: String,
    pub defaulted: Vec<Field>,
}

impl TaskSummary {
    #[must_use]
    pub fn new(record: &TaskRecord, content: &str, preview_chars: usize, log_limit: usize) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            status: record.status,
            status_glyph: record.status.glyph().to_string(),
            status_text: record.status.word().to_string(),
            agent_icon: record.agent_icon.clone(),
            agent_name: record.agent_name.clone(),
            agent_color: record.agent_color.clone(),
            progress: record.progress.to_string(),
            progress_percent: record.progress.percent(),
            current_phase: record.current_phase.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            owner: record.owner.clone(),
            sort_order: record.sort_order,
            blocker: record.blocker.clone(),
            recent_records: record.recent_records(log_limit).to_vec(),
            content: preview(content, preview_chars),
            defaulted: record.defaulted.iter().copied().collect(),
        }
    }
}

impl Groupable for TaskSummary {
    fn status(&self) -> Status {
        self.status
    }

    fn sort_order(&self) -> i64 {
        self.sort_order
    }
}

/// The whole board, one column per status group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub planned: Vec<TaskSummary>,
    pub in_progress: Vec<TaskSummary>,
    pub completed: Vec<TaskSummary>,
    pub timestamp: NaiveDateTime,
}

impl BoardView {
    #[must_use]
    pub fn len(&self) -> usize {
        self.planned.len() + self.in_progress.len() + self.completed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A record with its full text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub record: TaskRecord,
    pub progress_percent: u8,
    pub shelf: Shelf,
    pub full_content: String,
}

impl TaskDetail {
    #[must_use]
    pub fn new(record: TaskRecord, shelf: Shelf, full_content: String) -> Self {
        Self {
            progress_percent: record.progress.percent(),
            record,
            shelf,
            full_content,
        }
    }
}

/// Listing entry for the archive shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchivedTask {
    pub id: String,
    pub title: String,
    pub status: Status,
    /// `None` when the archived file has no readable header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<ArchiveHeader>,
}

/// Phase breakdown of arbitrary text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhasePreview {
    pub phases: Vec<Phase>,
    pub current_phase: String,
}

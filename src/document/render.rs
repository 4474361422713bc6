//! Canonical document layout.
//!
//! Used when a document is created from scratch. Existing documents are
//! never re-rendered; they are edited through the mutator.

use chrono::NaiveDateTime;

use super::clock::format_timestamp;
use super::record::{ExecutionRecord, Phase, PhaseItem, TaskRecord};
use super::vocab::{labels, Agent, Status};

/// Field values for a document that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDraft {
    pub title: String,
    pub status: Status,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub owner: String,
    pub sort_order: i64,
    pub agent: Agent,
    pub description: Option<String>,
    pub phases: Vec<Phase>,
    /// Checkbox items written before the first phase.
    pub loose_items: Vec<PhaseItem>,
    pub execution_records: Vec<ExecutionRecord>,
    pub blocker: Option<String>,
}

impl From<&TaskRecord> for DocumentDraft {
    fn from(record: &TaskRecord) -> Self {
        Self {
            title: record.title.clone(),
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
            owner: record.owner.clone(),
            sort_order: record.sort_order,
            agent: Agent::new(&record.agent_name, &record.agent_icon, &record.agent_color),
            description: None,
            phases: record.phases.clone(),
            loose_items: record.loose_items.clone(),
            execution_records: record.execution_records.clone(),
            blocker: record.blocker.clone(),
        }
    }
}

impl DocumentDraft {
    /// Render in the layout the grammar reads first.
    #[must_use]
    pub fn render(&self) -> String {
        let title = self.title.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut out = format!("# {}: {title}\n\n", labels::TITLE[0]);

        out.push_str(&metadata_line(labels::STATUS[0], &self.status.display_pair()));
        out.push_str(&metadata_line(labels::CREATED[0], &format_timestamp(self.created_at)));
        out.push_str(&metadata_line(labels::UPDATED[0], &format_timestamp(self.updated_at)));
        out.push_str(&metadata_line(labels::OWNER[0], &self.owner));
        out.push_str(&metadata_line(labels::SORT[0], &self.sort_order.to_string()));
        out.push_str(&format!("- [{} {}]\n", self.agent.icon, self.agent.name));

        if let Some(description) = self.description.as_deref().map(str::trim) {
            if !description.is_empty() {
                out.push_str(&format!("\n## {}\n{description}\n", labels::DESCRIPTION[0]));
            }
        }

        if !self.loose_items.is_empty() {
            out.push('\n');
            out.push_str(&checklist(&self.loose_items));
        }

        for phase in &self.phases {
            out.push_str(&format!("\n## {}\n", phase.label()));
            out.push_str(&checklist(&phase.items));
        }

        out.push_str(&format!("\n## {}\n", labels::EXECUTION_LOG[0]));
        for record in &self.execution_records {
            out.push_str(&format!("{}: {}\n", format_timestamp(record.at), record.action));
        }

        // An empty blocker section is still a blocker section.
        if let Some(blocker) = self.blocker.as_deref().map(str::trim) {
            out.push_str(&format!("\n## {}\n", labels::BLOCKER[0]));
            if !blocker.is_empty() {
                out.push_str(blocker);
                out.push('\n');
            }
        }

        out
    }
}

fn metadata_line(label: &str, value: &str) -> String {
    format!("- {label}: {value}\n")
}

fn checklist(items: &[PhaseItem]) -> String {
    items
        .iter()
        .map(|item| {
            let mark = if item.checked { 'x' } else { ' ' };
            format!("- [{mark}] {}\n", item.text)
        })
        .collect()
}

/// Render `record` in canonical layout.
#[must_use]
pub fn render(record: &TaskRecord) -> String {
    DocumentDraft::from(record).render()
}

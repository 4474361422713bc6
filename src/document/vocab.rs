//! Fixed vocabulary of the checklist document format.
//!
//! - [`Status`] - status glyph ⇄ status word pairs
//! - [`TransitionTarget`] - the statuses a caller may transition to
//! - [`AgentTable`] - bijective agent name ⇄ icon ⇄ colour table
//! - [`labels`] - field labels accepted on read, and the ones written

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TaskboardError};

/// Owner shown when no owner line exists.
pub const DEFAULT_OWNER: &str = "未分配";

/// Current phase shown when the document has no phase sections.
pub const NOT_STARTED: &str = "未开始";

/// Title used when neither a header nor an id hint is available.
pub const UNTITLED: &str = "未命名";

/// Sort order for records without a sort line (lowest display priority).
pub const DEFAULT_SORT_ORDER: i64 = 999;

/// Longest title accepted from a header line, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Timestamp layout used everywhere in documents (minute precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Field labels. The first entry of every list is the one written.
pub mod labels {
    pub const TITLE: &[&str] = &["任务清单", "Task List"];
    pub const STATUS: &[&str] = &["状态", "Status"];
    pub const CREATED: &[&str] = &["创建时间", "Created"];
    pub const UPDATED: &[&str] = &["更新时间", "Updated"];
    pub const OWNER: &[&str] = &["负责人", "Owner"];
    pub const SORT: &[&str] = &["排序", "Sort"];
    pub const AGENT: &[&str] = &["智能体", "Agent"];
    pub const DESCRIPTION: &[&str] = &["描述", "Description"];
    pub const EXECUTION_LOG: &[&str] = &["执行记录", "Execution Log"];
    pub const BLOCKER: &[&str] = &["阻塞点", "Blockers", "Blocker"];

    /// Regex alternation of a label list, e.g. `(?:状态|Status)`.
    pub(crate) fn alternation(labels: &[&str]) -> String {
        let escaped: Vec<String> = labels.iter().map(|l| regex::escape(l)).collect();
        format!("(?:{})", escaped.join("|"))
    }
}

// ============================================================================
// Status
// ============================================================================

/// Status of a task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Planned,
    #[default]
    InProgress,
    Completed,
    /// Parseable, but only reachable by editing the document by hand.
    Paused,
}

impl Status {
    /// The three pairs found in historical documents.
    pub const HISTORICAL: [Status; 3] = [Status::InProgress, Status::Completed, Status::Paused];

    pub const ALL: [Status; 4] = [
        Status::Planned,
        Status::InProgress,
        Status::Completed,
        Status::Paused,
    ];

    #[must_use]
    pub fn glyph(self) -> &'static str {
        match self {
            Status::Planned => "📋",
            Status::InProgress => "🔄",
            Status::Completed => "✅",
            Status::Paused => "❌",
        }
    }

    #[must_use]
    pub fn word(self) -> &'static str {
        match self {
            Status::Planned => "计划中",
            Status::InProgress => "进行中",
            Status::Completed => "已完成",
            Status::Paused => "已暂停",
        }
    }

    /// Name used on the command line and in JSON.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Status::Planned => "planned",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Paused => "paused",
        }
    }

    #[must_use]
    pub fn from_glyph(glyph: &str) -> Option<Status> {
        let glyph = glyph.trim_end_matches('\u{FE0F}');
        Self::ALL.into_iter().find(|s| s.glyph() == glyph)
    }

    #[must_use]
    pub fn from_word(word: &str) -> Option<Status> {
        Self::ALL.into_iter().find(|s| s.word() == word)
    }

    /// Resolve a glyph and word pair, `None` when they disagree.
    #[must_use]
    pub fn from_pair(glyph: &str, word: &str) -> Option<Status> {
        match (Self::from_glyph(glyph), Self::from_word(word)) {
            (Some(a), Some(b)) if a == b => Some(a),
            _ => None,
        }
    }

    /// Canonical `glyph word` text written into documents.
    #[must_use]
    pub fn display_pair(self) -> String {
        format!("{} {}", self.glyph(), self.word())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

impl FromStr for Status {
    type Err = TaskboardError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|st| st.wire_name() == normalized)
            .ok_or_else(|| TaskboardError::invalid_patch(format!("unknown status '{s}'")))
    }
}

// ============================================================================
// Transition Target
// ============================================================================

/// Status a caller may transition a record to.
///
/// `paused` is absent: it only appears in hand-edited documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTarget {
    Planned,
    InProgress,
    Completed,
}

impl From<TransitionTarget> for Status {
    fn from(target: TransitionTarget) -> Self {
        match target {
            TransitionTarget::Planned => Status::Planned,
            TransitionTarget::InProgress => Status::InProgress,
            TransitionTarget::Completed => Status::Completed,
        }
    }
}

impl fmt::Display for TransitionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Status::from(*self))
    }
}

impl FromStr for TransitionTarget {
    type Err = TaskboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.parse::<Status>()? {
            Status::Planned => Ok(TransitionTarget::Planned),
            Status::InProgress => Ok(TransitionTarget::InProgress),
            Status::Completed => Ok(TransitionTarget::Completed),
            Status::Paused => Err(TaskboardError::invalid_patch(
                "status 'paused' cannot be set through a transition",
            )),
        }
    }
}

// ============================================================================
// Agents
// ============================================================================

/// One row of the agent table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub icon: String,
    pub color: String,
}

impl Agent {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
        }
    }
}

/// Immutable bijective lookup table of agents.
///
/// The first entry is the default agent. Built once at startup and handed to
/// the grammar explicitly.
#[derive(Debug, Clone)]
pub struct AgentTable {
    agents: Vec<Agent>,
    icon_pattern: String,
}

impl AgentTable {
    /// Build a table, rejecting duplicates in either direction.
    pub fn new(agents: Vec<Agent>) -> Result<Self> {
        if agents.is_empty() {
            return Err(TaskboardError::InvalidConfig {
                field: "agents".into(),
                reason: "agent table must not be empty".into(),
            });
        }
        for (i, agent) in agents.iter().enumerate() {
            if agent.name.trim().is_empty() || agent.icon.trim().is_empty() {
                return Err(TaskboardError::InvalidConfig {
                    field: "agents".into(),
                    reason: format!("entry {i} has an empty name or icon"),
                });
            }
            if agent.name.chars().any(char::is_whitespace) {
                return Err(TaskboardError::InvalidConfig {
                    field: "agents".into(),
                    reason: format!("agent name '{}' contains whitespace", agent.name),
                });
            }
            let duplicate = agents[..i]
                .iter()
                .find(|a| a.name == agent.name || a.icon == agent.icon);
            if let Some(other) = duplicate {
                return Err(TaskboardError::InvalidConfig {
                    field: "agents".into(),
                    reason: format!(
                        "'{} {}' collides with '{} {}'",
                        agent.icon, agent.name, other.icon, other.name
                    ),
                });
            }
        }

        let mut icons: Vec<&str> = agents.iter().map(|a| a.icon.as_str()).collect();
        // Longest first so multi-codepoint icons win over their prefixes.
        icons.sort_by_key(|i| std::cmp::Reverse(i.len()));
        let icon_pattern = icons
            .iter()
            .map(|i| regex::escape(i))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            agents,
            icon_pattern,
        })
    }

    /// The table shipped with the board.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            agents: builtin_agents(),
            icon_pattern: "🔵|🔴|🟢|🟡|🟣".to_string(),
        }
    }

    #[must_use]
    pub fn default_agent(&self) -> &Agent {
        &self.agents[0]
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn by_icon(&self, icon: &str) -> Option<&Agent> {
        let icon = icon.trim_end_matches('\u{FE0F}');
        self.agents.iter().find(|a| a.icon == icon)
    }

    /// First agent whose name occurs anywhere in `haystack`.
    #[must_use]
    pub fn find_in(&self, haystack: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| haystack.contains(a.name.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Regex alternation matching any icon of the table.
    #[must_use]
    pub fn icon_pattern(&self) -> &str {
        &self.icon_pattern
    }

    /// Resolve a captured name (and possibly icon) into a consistent agent.
    ///
    /// The icon always comes from the name when the name is known.
    #[must_use]
    pub fn resolve(&self, name: &str, captured_icon: Option<&str>) -> Agent {
        if let Some(agent) = self.by_name(name) {
            return agent.clone();
        }
        let fallback = self.default_agent();
        Agent::new(
            name,
            captured_icon
                .map(|i| i.trim_end_matches('\u{FE0F}').to_string())
                .unwrap_or_else(|| fallback.icon.clone()),
            fallback.color.clone(),
        )
    }
}

impl Default for AgentTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Rows of the built-in table.
#[must_use]
pub fn builtin_agents() -> Vec<Agent> {
    vec![
        Agent::new("老丑", "🔵", "blue"),
        Agent::new("钮码", "🔴", "red"),
        Agent::new("丑牛", "🟢", "green"),
        Agent::new("子鼠", "🟡", "yellow"),
        Agent::new("舆探", "🟣", "purple"),
    ]
}

//! Document mutator.
//!
//! Every edit is "locate span → compute replacement → splice". Spans come
//! from the same rule chains the parser uses, so only text the parser
//! recognizes is ever rewritten; everything else survives byte for byte.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::clock::{format_timestamp, Clock};
use super::grammar::{next_level2_heading, Grammar, Span};
use super::parser::{checkboxes, execution_log_heading};
use super::record::Field;
use super::vocab::{labels, Status, TransitionTarget};
use crate::error::{Result, TaskboardError};

// ============================================================================
// Patch
// ============================================================================

/// Desired state of one checkbox item, matched by its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckItem {
    pub item: String,
    pub checked: bool,
}

/// Partial set of field assignments.
///
/// Unknown field names are rejected rather than ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TransitionTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocker: Option<String>,
    /// Appended to the execution log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub check: Vec<CheckItem>,
}

impl TaskPatch {
    /// Parse a JSON object of field assignments.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TaskboardError::invalid_patch(e.to_string()))
    }

    /// Build a patch from `key=value` assignments.
    ///
    /// `check=<item>` and `uncheck=<item>` toggle checkbox items.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patch = Self::default();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (key, value) = assignment.split_once('=').ok_or_else(|| {
                TaskboardError::invalid_patch(format!("expected key=value, got '{assignment}'"))
            })?;
            let value = value.trim().to_string();
            match key.trim() {
                "title" => patch.title = Some(value),
                "status" => patch.status = Some(value.parse()?),
                "owner" => patch.owner = Some(value),
                "sort_order" | "sort" => {
                    patch.sort_order = Some(value.parse().map_err(|_| {
                        TaskboardError::invalid_patch(format!("sort order '{value}' is not an integer"))
                    })?)
                }
                "agent" => patch.agent = Some(value),
                "blocker" => patch.blocker = Some(value),
                "note" => patch.note = Some(value),
                "check" => patch.check.push(CheckItem {
                    item: value,
                    checked: true,
                }),
                "uncheck" => patch.check.push(CheckItem {
                    item: value,
                    checked: false,
                }),
                other => {
                    return Err(TaskboardError::invalid_patch(format!(
                        "unknown field '{other}'"
                    )))
                }
            }
        }
        Ok(patch)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn validate(&self, grammar: &Grammar) -> Result<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() || title.contains('\n') {
                return Err(TaskboardError::invalid_patch(
                    "title must be a single non-empty line",
                ));
            }
        }
        if let Some(owner) = &self.owner {
            validate_owner(owner)?;
        }
        if let Some(blocker) = &self.blocker {
            if blocker.lines().any(is_section_heading) {
                return Err(TaskboardError::invalid_patch(
                    "blocker must not contain a level-1 or level-2 heading",
                ));
            }
        }
        if let Some(agent) = &self.agent {
            if grammar.agents().by_name(agent).is_none() {
                return Err(TaskboardError::invalid_patch(format!("unknown agent '{agent}'")));
            }
        }
        if matches!(&self.note, Some(note) if note.trim().is_empty()) {
            return Err(TaskboardError::invalid_patch("note must not be empty"));
        }
        Ok(())
    }
}

// ============================================================================
// Splicing
// ============================================================================

/// Replace `span` of `text` with `replacement`.
#[must_use]
pub fn splice(text: &str, span: Span, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() - span.len() + replacement.len());
    out.push_str(&text[..span.start]);
    out.push_str(replacement);
    out.push_str(&text[span.end..]);
    out
}

/// `text` plus a new level-2 section at the end.
fn append_section(text: &str, heading: &str, body: &str) -> String {
    let mut out = text.to_string();
    if !out.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str(&format!("## {heading}\n{body}\n"));
    out
}

fn shares_line_with_label(text: &str, span: Span) -> bool {
    let line_start = text[..span.start].rfind('\n').map_or(0, |i| i + 1);
    !text[line_start..span.start].trim().is_empty()
}

/// Owners are single tokens without emphasis markers.
pub fn validate_owner(owner: &str) -> Result<()> {
    if owner.is_empty() || owner.chars().any(|c| c.is_whitespace() || c == '*') {
        return Err(TaskboardError::invalid_patch(format!(
            "owner '{owner}' must be a single token"
        )));
    }
    Ok(())
}

fn is_section_heading(line: &str) -> bool {
    let hashes = line.trim_start().chars().take_while(|&c| c == '#').count();
    (1..=2).contains(&hashes)
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Mutator
// ============================================================================

/// Applies field edits to document text.
pub struct Mutator<'a> {
    grammar: &'a Grammar,
    clock: &'a dyn Clock,
}

impl<'a> Mutator<'a> {
    pub fn new(grammar: &'a Grammar, clock: &'a dyn Clock) -> Self {
        Self { grammar, clock }
    }

    /// Replace the located value of an in-place field.
    ///
    /// `None` when the field does not occur in `text`.
    #[must_use]
    pub fn replace_field(&self, text: &str, field: Field, replacement: &str) -> Option<String> {
        self.grammar
            .locate(text, field)
            .map(|span| splice(text, span, replacement))
    }

    fn replace_or_keep(&self, text: String, field: Field, replacement: &str) -> String {
        match self.replace_field(&text, field, replacement) {
            Some(updated) => updated,
            None => {
                debug!(%field, "field not present, leaving document unchanged");
                text
            }
        }
    }

    /// Apply every assignment of `patch`, stamping `updated-time` when the
    /// text changed.
    pub fn apply_patch(&self, text: &str, patch: &TaskPatch) -> Result<String> {
        patch.validate(self.grammar)?;
        let mut out = text.to_string();

        if let Some(title) = &patch.title {
            out = self.replace_or_keep(out, Field::Title, title.trim());
        }
        if let Some(target) = patch.status {
            out = self.set_status(&out, target.into());
        }
        if let Some(owner) = &patch.owner {
            out = self.replace_or_keep(out, Field::Owner, owner);
        }
        if let Some(order) = patch.sort_order {
            out = self.replace_or_keep(out, Field::SortOrder, &order.to_string());
        }
        if let Some(agent) = &patch.agent {
            out = self.set_agent(&out, agent);
        }
        for check in &patch.check {
            out = self.set_checkbox(&out, &check.item, check.checked);
        }
        if let Some(blocker) = &patch.blocker {
            out = self.set_blocker(&out, blocker);
        }
        if let Some(note) = &patch.note {
            out = self.append_execution_record(&out, note);
        }

        if out != text {
            out = self.stamp_updated(&out);
        }
        Ok(out)
    }

    /// Rewrite the status pair. The word always comes from the glyph table.
    #[must_use]
    pub fn set_status(&self, text: &str, status: Status) -> String {
        self.replace_or_keep(text.to_string(), Field::Status, &status.display_pair())
    }

    /// Rewrite the agent, keeping the layout it was found in.
    fn set_agent(&self, text: &str, name: &str) -> String {
        let agents = self.grammar.agents();
        let Some(agent) = agents.by_name(name) else {
            return text.to_string();
        };
        match self.grammar.agent.first_match_named(text) {
            Some(("inline-tag", found)) => {
                splice(text, found.span, &format!("[{} {}]", agent.icon, agent.name))
            }
            Some((_, found)) => {
                let old = found.span.slice(text);
                let had_icon = agents.iter().any(|a| old.starts_with(a.icon.as_str()));
                let replacement = if had_icon {
                    format!("{} {}", agent.icon, agent.name)
                } else {
                    agent.name.clone()
                };
                splice(text, found.span, &replacement)
            }
            None => {
                debug!(agent = name, "no agent tag present, leaving document unchanged");
                text.to_string()
            }
        }
    }

    /// Check or uncheck the first checkbox whose text equals `item`.
    fn set_checkbox(&self, text: &str, item: &str, checked: bool) -> String {
        let item = item.trim();
        match checkboxes(text).find(|cb| cb.text == item) {
            Some(cb) if cb.checked == checked => text.to_string(),
            Some(cb) => splice(text, cb.mark, if checked { "x" } else { " " }),
            None => {
                debug!(item, "checkbox item not found");
                text.to_string()
            }
        }
    }

    /// Replace the blocker body, or append a blocker section.
    fn set_blocker(&self, text: &str, blocker: &str) -> String {
        let blocker = blocker.trim();
        match self.grammar.locate(text, Field::Blocker) {
            Some(span) if span.is_empty() => {
                let needs_newline = span.start > 0 && !text[..span.start].ends_with('\n');
                let prefix = if needs_newline { "\n" } else { "" };
                splice(text, span, &format!("{prefix}{blocker}\n"))
            }
            // `阻塞点: value` holds one line only.
            Some(span) if shares_line_with_label(text, span) => {
                splice(text, span, &single_line(blocker))
            }
            Some(span) => splice(text, span, blocker),
            None => append_section(text, labels::BLOCKER[0], blocker),
        }
    }

    /// Append a timestamped line to the end of the execution log.
    ///
    /// Creates the log section at the end of the document when missing; in
    /// both cases the log stays newest-last.
    #[must_use]
    pub fn append_execution_record(&self, text: &str, action: &str) -> String {
        let line = format!("{}: {}", format_timestamp(self.clock.now()), single_line(action));
        match execution_log_heading(text) {
            Some(heading) => {
                let section_end = next_level2_heading(text, heading.end).unwrap_or(text.len());
                let body = &text[heading.end..section_end];
                let insert_at = heading.end + body.trim_end().len();
                splice(text, Span::empty_at(insert_at), &format!("\n{line}"))
            }
            None => append_section(text, labels::EXECUTION_LOG[0], &line),
        }
    }

    /// Set `updated-time` to now, if the document carries one.
    #[must_use]
    pub fn stamp_updated(&self, text: &str) -> String {
        let now = format_timestamp(self.clock.now());
        self.replace_or_keep(text.to_string(), Field::UpdatedAt, &now)
    }

    /// Move to `target`, log `note` when given, and stamp `updated-time`.
    ///
    /// Any status is reachable from any other.
    #[must_use]
    pub fn transition(&self, text: &str, target: TransitionTarget, note: Option<&str>) -> String {
        let mut out = self.set_status(text, target.into());
        if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
            out = self.append_execution_record(&out, note);
        }
        self.stamp_updated(&out)
    }

    /// Log a message to the record and reopen it.
    #[must_use]
    pub fn send_message(&self, text: &str, message: &str) -> String {
        self.transition(text, TransitionTarget::InProgress, Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::clock::FixedClock;
    use crate::document::parser::{extract_execution_records, Parser};
    use crate::testing::{assert_insertion_only, assert_only_span_changed};

    const DOC: &str = "# 任务清单: 网关迁移

- **状态**: ✅ 已完成
- 创建时间: 2024-03-01 09:00
- 更新时间: 2024-03-04 18:30
- 负责人: alice
- 排序: 2
- [🟢 丑牛]

## 描述
自由文本，*不会* 被改动。

## Phase 1: 准备
- [x] 盘点路由
- [ ] 申请证书

## 执行记录
2024-03-01 09:00: 创建任务

## 备注
保留
";

    fn with_mutator<T>(f: impl FnOnce(&Mutator<'_>, &Parser<'_>) -> T) -> T {
        let grammar = Grammar::default();
        let clock = FixedClock::at("2024-06-01 10:30").unwrap();
        let mutator = Mutator::new(&grammar, &clock);
        let parser = Parser::new(&grammar, &clock);
        f(&mutator, &parser)
    }

    #[test]
    fn test_patch_from_json_rejects_unknown_fields() {
        let err = TaskPatch::from_json(r#"{"colour": "red"}"#).unwrap_err();
        assert!(matches!(err, TaskboardError::InvalidPatch { .. }));
        assert!(TaskPatch::from_json(r#"{"status": "paused"}"#).is_err());
        let ok = TaskPatch::from_json(r#"{"status": "completed", "sort_order": 1}"#).unwrap();
        assert_eq!(ok.status, Some(TransitionTarget::Completed));
    }

    #[test]
    fn test_patch_from_assignments() {
        let patch =
            TaskPatch::from_assignments(["status=planned", "sort=4", "check=申请证书"]).unwrap();
        assert_eq!(patch.status, Some(TransitionTarget::Planned));
        assert_eq!(patch.sort_order, Some(4));
        assert_eq!(patch.check.len(), 1);

        assert!(TaskPatch::from_assignments(["priority=high"]).is_err());
        assert!(TaskPatch::from_assignments(["sort=soon"]).is_err());
        assert!(TaskPatch::from_assignments(["status"]).is_err());
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn test_status_replaces_only_the_pair() {
        with_mutator(|m, p| {
            let out = m.set_status(DOC, Status::Planned);
            let span = Grammar::default().locate(DOC, Field::Status).unwrap();
            assert_only_span_changed(DOC, &out, span, "📋 计划中");
            assert_eq!(p.parse(&out, "g").status, Status::Planned);
            assert!(out.contains("- **状态**: 📋 计划中"));
        });
    }

    #[test]
    fn test_status_absent_is_noop() {
        with_mutator(|m, _| {
            let text = "# 任务清单: 无状态\n";
            assert_eq!(m.set_status(text, Status::Completed), text);
        });
    }

    #[test]
    fn test_apply_patch_stamps_updated_time() {
        with_mutator(|m, p| {
            let patch = TaskPatch {
                owner: Some("bob".into()),
                sort_order: Some(1),
                ..TaskPatch::default()
            };
            let out = m.apply_patch(DOC, &patch).unwrap();
            let record = p.parse(&out, "g");
            assert_eq!(record.owner, "bob");
            assert_eq!(record.sort_order, 1);
            assert!(out.contains("- 更新时间: 2024-06-01 10:30"));
            assert!(out.contains("自由文本，*不会* 被改动。"));
        });
    }

    #[test]
    fn test_noop_patch_does_not_stamp() {
        with_mutator(|m, _| {
            let text = "# 任务清单: x\n- 更新时间: 2024-01-01 00:00\n";
            let patch = TaskPatch {
                owner: Some("bob".into()),
                ..TaskPatch::default()
            };
            // No owner line: nothing to rewrite, so nothing changes.
            assert_eq!(m.apply_patch(text, &patch).unwrap(), text);
        });
    }

    #[test]
    fn test_apply_patch_rejects_invalid_values() {
        with_mutator(|m, _| {
            let bad_owner = TaskPatch {
                owner: Some("two words".into()),
                ..TaskPatch::default()
            };
            assert!(m.apply_patch(DOC, &bad_owner).is_err());
            let bad_agent = TaskPatch {
                agent: Some("陌生人".into()),
                ..TaskPatch::default()
            };
            assert!(m.apply_patch(DOC, &bad_agent).is_err());
        });
    }

    #[test]
    fn test_agent_rewrite_inline_tag() {
        with_mutator(|m, p| {
            let patch = TaskPatch {
                agent: Some("舆探".into()),
                ..TaskPatch::default()
            };
            let out = m.apply_patch(DOC, &patch).unwrap();
            assert!(out.contains("- [🟣 舆探]"));
            let record = p.parse(&out, "g");
            assert_eq!(record.agent_icon, "🟣");
        });
    }

    #[test]
    fn test_agent_rewrite_metadata_line() {
        with_mutator(|m, _| {
            let text = "- 智能体: 🔵 老丑\n";
            let patch = TaskPatch {
                agent: Some("钮码".into()),
                ..TaskPatch::default()
            };
            assert_eq!(m.apply_patch(text, &patch).unwrap(), "- 智能体: 🔴 钮码\n");
        });
    }

    #[test]
    fn test_checkbox_toggle_updates_progress() {
        with_mutator(|m, p| {
            let patch = TaskPatch::from_assignments(["check=申请证书", "uncheck=盘点路由"]).unwrap();
            let out = m.apply_patch(DOC, &patch).unwrap();
            assert!(out.contains("- [x] 申请证书"));
            assert!(out.contains("- [ ] 盘点路由"));
            assert_eq!(p.parse(&out, "g").progress.completed, 1);
        });
    }

    #[test]
    fn test_note_appends_at_end_of_existing_log() {
        with_mutator(|m, p| {
            let out = m.append_execution_record(DOC, "第二条");
            assert!(out.contains(
                "## 执行记录\n2024-03-01 09:00: 创建任务\n2024-06-01 10:30: 第二条\n\n## 备注\n保留\n"
            ));
            let records = p.parse(&out, "g").execution_records;
            assert_eq!(records.len(), 2);
            assert_eq!(records[1].action, "第二条");
        });
    }

    #[test]
    fn test_note_creates_log_section_when_missing() {
        with_mutator(|m, _| {
            let text = "# 任务清单: x\n- 状态: 🔄 进行中";
            let out = m.append_execution_record(text, "开始");
            assert_eq!(
                out,
                "# 任务清单: x\n- 状态: 🔄 进行中\n\n## 执行记录\n2024-06-01 10:30: 开始\n"
            );
            let again = m.append_execution_record(&out, "继续");
            let records = extract_execution_records(&again);
            assert_eq!(records[0].action, "开始");
            assert_eq!(records[1].action, "继续");
        });
    }

    #[test]
    fn test_note_into_empty_log_section() {
        with_mutator(|m, _| {
            let text = "## 执行记录\n\n## 阻塞点\n无\n";
            let out = m.append_execution_record(text, "a");
            assert_eq!(out, "## 执行记录\n2024-06-01 10:30: a\n\n## 阻塞点\n无\n");
        });
    }

    #[test]
    fn test_note_is_single_line() {
        with_mutator(|m, _| {
            let out = m.append_execution_record("", "line one\n## not a heading");
            assert_eq!(out, "## 执行记录\n2024-06-01 10:30: line one ## not a heading\n");
        });
    }

    #[test]
    fn test_blocker_replace_and_append() {
        with_mutator(|m, p| {
            let patch = TaskPatch {
                blocker: Some("等待审批".into()),
                ..TaskPatch::default()
            };
            let appended = m.apply_patch(DOC, &patch).unwrap();
            assert!(appended.ends_with("## 阻塞点\n等待审批\n"));
            assert_eq!(p.parse(&appended, "g").blocker.as_deref(), Some("等待审批"));

            let patch = TaskPatch {
                blocker: Some("已解除".into()),
                ..TaskPatch::default()
            };
            let replaced = m.apply_patch(&appended, &patch).unwrap();
            assert_eq!(p.parse(&replaced, "g").blocker.as_deref(), Some("已解除"));
            assert_eq!(replaced.matches("## 阻塞点").count(), 1);
        });
    }

    #[test]
    fn test_blocker_fills_empty_section() {
        with_mutator(|m, _| {
            let text = "## 阻塞点\n## 下一节\n";
            let patch = TaskPatch {
                blocker: Some("卡住".into()),
                ..TaskPatch::default()
            };
            assert_eq!(
                m.apply_patch(text, &patch).unwrap(),
                "## 阻塞点\n卡住\n## 下一节\n"
            );
        });
    }

    #[test]
    fn test_blocker_label_in_title_keeps_metadata() {
        with_mutator(|m, p| {
            let text = "# 任务清单: 清理阻塞点\n\n- 状态: 🔄 进行中\n- 负责人: bob\n\n## 描述\nx\n";
            let patch = TaskPatch {
                blocker: Some("等待".into()),
                ..TaskPatch::default()
            };
            let out = m.apply_patch(text, &patch).unwrap();
            assert_insertion_only(text, &out);
            assert!(out.ends_with("## 阻塞点\n等待\n"));

            let record = p.parse(&out, "t");
            assert_eq!(record.title, "清理阻塞点");
            assert_eq!(record.status, Status::InProgress);
            assert_eq!(record.owner, "bob");
            assert_eq!(record.blocker.as_deref(), Some("等待"));
        });
    }

    #[test]
    fn test_blocker_inline_marker_stays_on_one_line() {
        with_mutator(|m, p| {
            let text = "- 阻塞点: 依赖上游\n- 负责人: bob\n";
            let patch = TaskPatch {
                blocker: Some("第一行\n第二行".into()),
                ..TaskPatch::default()
            };
            let out = m.apply_patch(text, &patch).unwrap();
            assert_eq!(out, "- 阻塞点: 第一行 第二行\n- 负责人: bob\n");
            assert_eq!(p.parse(&out, "t").owner, "bob");
        });
    }

    #[test]
    fn test_blocker_rejects_section_headings() {
        with_mutator(|m, _| {
            for blocker in ["x\n## 执行记录\n2024-01-01 00:00: 伪造", "# 新标题", "  ## 缩进"] {
                let patch = TaskPatch {
                    blocker: Some(blocker.into()),
                    ..TaskPatch::default()
                };
                let err = m.apply_patch(DOC, &patch).unwrap_err();
                assert!(matches!(err, TaskboardError::InvalidPatch { .. }), "{blocker:?}");
            }

            let patch = TaskPatch {
                blocker: Some("原因\n### 细节\n等待".into()),
                ..TaskPatch::default()
            };
            assert!(m.apply_patch(DOC, &patch).is_ok());
        });
    }

    #[test]
    fn test_validate_owner() {
        assert!(validate_owner("alice").is_ok());
        for owner in ["", "a b", "a*b", "**bob**"] {
            let err = validate_owner(owner).unwrap_err();
            assert!(matches!(err, TaskboardError::InvalidPatch { .. }), "{owner:?}");
        }
    }

    #[test]
    fn test_transition_scenario_reopen() {
        with_mutator(|m, p| {
            let text = "# 任务清单: 周报\n\n- 状态: ✅ 已完成\n- 更新时间: 2024-01-01 00:00\n";
            let out = m.send_message(text, "resume work");
            assert!(out.contains("状态: 🔄 进行中"));
            let record = p.parse(&out, "weekly");
            assert_eq!(record.status, Status::InProgress);
            let last = record.execution_records.last().unwrap();
            assert!(last.action.contains("resume work"));
            assert!(out.contains("- 更新时间: 2024-06-01 10:30"));
        });
    }

    #[test]
    fn test_transition_any_to_any() {
        with_mutator(|m, p| {
            let mut text = DOC.to_string();
            for target in [
                TransitionTarget::InProgress,
                TransitionTarget::Planned,
                TransitionTarget::Completed,
                TransitionTarget::Planned,
            ] {
                text = m.transition(&text, target, None);
                assert_eq!(p.parse(&text, "g").status, Status::from(target));
            }
            // No note: execution log untouched.
            assert_eq!(p.parse(&text, "g").execution_records.len(), 1);
        });
    }

    #[test]
    fn test_untouched_text_survives() {
        with_mutator(|m, _| {
            let patch = TaskPatch::from_assignments(["title=新标题"]).unwrap();
            let out = m.apply_patch(DOC, &patch).unwrap();
            let tail = &DOC[DOC.find("## 描述").unwrap()..];
            assert!(out.ends_with(tail));
            assert!(out.starts_with("# 任务清单: 新标题\n"));
        });
    }

    #[test]
    fn test_splice_boundaries() {
        assert_eq!(splice("abcdef", Span::new(2, 4), "XY"), "abXYef");
        assert_eq!(splice("abc", Span::empty_at(3), "d"), "abcd");
        assert_eq!(splice("abc", Span::new(0, 3), ""), "");
    }
}

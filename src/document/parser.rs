//! Document parser.
//!
//! Turns loosely formatted checklist text into a [`TaskRecord`]. Parsing is
//! total: every field degrades to its default independently, and the fields
//! that did are listed in [`TaskRecord::defaulted`].

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::clock::{parse_timestamp, Clock};
use super::grammar::{line_end, next_level2_heading, Grammar, Span};
use super::record::{
    current_phase, ExecutionRecord, Field, Phase, PhaseItem, Progress, TaskRecord,
};
use super::vocab::{labels, Status, DEFAULT_OWNER, DEFAULT_SORT_ORDER, UNTITLED};

// ============================================================================
// Structural Patterns
// ============================================================================

static CHECKBOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*[-*+][ \t]*\[([ xX])\][ \t]*([^\n]*)$").expect("valid checkbox regex")
});

static PHASE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]*)?(?:[-*+][ \t]+)?(?:\*\*)?Phase[ \t]*(\d+)\b")
        .expect("valid phase marker regex")
});

static RECORD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:[-*+][ \t]+)?(?:\*\*)?(\d{4}-\d{2}-\d{2})[ \t]+(\d{2}:\d{2})(?:\*\*)?[ \t]*[:：][ \t]*",
    )
    .expect("valid execution record regex")
});

static EXECUTION_LOG_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^##[ \t]*{}[ \t]*[:：]?[ \t]*\r?$",
        labels::alternation(labels::EXECUTION_LOG)
    ))
    .expect("valid execution log heading regex")
});

// ============================================================================
// Checkboxes
// ============================================================================

/// One checkbox line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkbox {
    /// Span of the single mark character between the brackets.
    pub mark: Span,
    pub line_start: usize,
    pub text: String,
    pub checked: bool,
}

/// Every checkbox line of `text`, in document order.
pub fn checkboxes(text: &str) -> impl Iterator<Item = Checkbox> + '_ {
    CHECKBOX.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let mark = caps.get(1)?;
        let item = caps.get(2)?;
        Some(Checkbox {
            mark: Span::new(mark.start(), mark.end()),
            line_start: whole.start(),
            text: item.as_str().trim().to_string(),
            checked: mark.as_str() != " ",
        })
    })
}

/// Checked and total checkbox counts over the whole text.
#[must_use]
pub fn count_progress(text: &str) -> Progress {
    let (completed, total) = checkboxes(text).fold((0, 0), |(done, all), cb| {
        (done + usize::from(cb.checked), all + 1)
    });
    Progress::new(completed, total)
}

// ============================================================================
// Phases
// ============================================================================

/// A phase marker and the byte range of its section body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSection {
    pub id: u32,
    pub name: String,
    pub marker: Span,
    pub body: Span,
}

fn phase_name(rest_of_line: &str) -> String {
    rest_of_line
        .trim_start_matches(|c: char| c == '*' || c == ':' || c == '：' || c.is_whitespace())
        .trim_end_matches(|c: char| c == '*' || c.is_whitespace())
        .to_string()
}

/// Locate every `Phase N` section.
///
/// A section runs from the end of its marker line to the next phase marker,
/// the next level-2 heading, or the end of text, whichever comes first.
#[must_use]
pub fn phase_sections(text: &str) -> Vec<PhaseSection> {
    let markers: Vec<(u32, String, Span)> = PHASE_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let id = caps.get(1)?.as_str().parse().ok()?;
            let eol = line_end(text, whole.end());
            Some((id, phase_name(&text[whole.end()..eol]), Span::new(whole.start(), eol)))
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, (id, name, marker))| {
            let body_start = marker.end;
            let next_marker = markers.get(i + 1).map_or(text.len(), |(_, _, m)| m.start);
            let next_heading = next_level2_heading(text, body_start).unwrap_or(text.len());
            let body_end = next_marker.min(next_heading).max(body_start);
            PhaseSection {
                id: *id,
                name: name.clone(),
                marker: *marker,
                body: Span::new(body_start, body_end),
            }
        })
        .collect()
}

/// Phases of `text` with their checkbox items, ordered by phase number.
///
/// Works on any text, stored or not.
#[must_use]
pub fn extract_phases(text: &str) -> Vec<Phase> {
    let mut phases: Vec<Phase> = phase_sections(text)
        .into_iter()
        .map(|section| Phase {
            id: section.id,
            name: section.name,
            items: checkboxes(text)
                .filter(|cb| cb.line_start >= section.body.start && cb.line_start < section.body.end)
                .map(|cb| PhaseItem {
                    text: cb.text,
                    checked: cb.checked,
                })
                .collect(),
        })
        .collect();
    // Stable: equal numbers keep document order.
    phases.sort_by_key(|p| p.id);
    phases
}

/// Checkbox items in no phase section whose mark lies outside `claimed`.
#[must_use]
pub fn loose_items(text: &str, claimed: &[Span]) -> Vec<PhaseItem> {
    let sections = phase_sections(text);
    let within = |span: &Span, pos: usize| pos >= span.start && pos < span.end;
    checkboxes(text)
        .filter(|cb| {
            !sections.iter().any(|s| within(&s.body, cb.mark.start))
                && !claimed.iter().any(|span| within(span, cb.mark.start))
        })
        .map(|cb| PhaseItem {
            text: cb.text,
            checked: cb.checked,
        })
        .collect()
}

// ============================================================================
// Execution Log
// ============================================================================

/// Every `YYYY-MM-DD HH:MM: text` record, in document order.
///
/// A record's text runs until the next record line, checkbox line, phase
/// marker or level-2 heading, or the end of text.
#[must_use]
pub fn extract_execution_records(text: &str) -> Vec<ExecutionRecord> {
    let starts: Vec<_> = RECORD_LINE.captures_iter(text).collect();
    starts
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let whole = caps.get(0)?;
            let at = parse_timestamp(&format!("{} {}", caps.get(1)?.as_str(), caps.get(2)?.as_str()))?;
            let next_record = starts
                .get(i + 1)
                .and_then(|c| c.get(0))
                .map_or(text.len(), |m| m.start());
            let next_heading = next_level2_heading(text, whole.end()).unwrap_or(text.len());
            let next_checkbox = CHECKBOX.find_at(text, whole.end()).map_or(text.len(), |m| m.start());
            let next_phase = PHASE_MARKER
                .find_at(text, whole.end())
                .map_or(text.len(), |m| m.start());
            let end = next_record
                .min(next_heading)
                .min(next_checkbox)
                .min(next_phase)
                .max(whole.end());
            Some(ExecutionRecord {
                at,
                action: text[whole.end()..end].trim().to_string(),
            })
        })
        .collect()
}

/// Span of the execution-log heading line, without its newline.
#[must_use]
pub fn execution_log_heading(text: &str) -> Option<Span> {
    EXECUTION_LOG_HEADING.find(text).map(|m| {
        let end = m.as_str().strip_suffix('\r').map_or(m.end(), |s| m.start() + s.len());
        Span::new(m.start(), end)
    })
}

// ============================================================================
// Parser
// ============================================================================

/// Parses documents against one grammar and one clock.
pub struct Parser<'a> {
    grammar: &'a Grammar,
    clock: &'a dyn Clock,
}

impl<'a> Parser<'a> {
    pub fn new(grammar: &'a Grammar, clock: &'a dyn Clock) -> Self {
        Self { grammar, clock }
    }

    /// Parse `text` stored under `id`. Never fails.
    ///
    /// # Example
    ///
    /// ```
    /// use taskboard::document::{FixedClock, Grammar, Parser, Status};
    ///
    /// let grammar = Grammar::default();
    /// let clock = FixedClock::at("2024-01-01 00:00").unwrap();
    /// let record = Parser::new(&grammar, &clock).parse("# 任务清单: 发布\n- 状态: ✅ 已完成", "release");
    ///
    /// assert_eq!(record.title, "发布");
    /// assert_eq!(record.status, Status::Completed);
    /// ```
    #[must_use]
    pub fn parse(&self, text: &str, id: &str) -> TaskRecord {
        let g = self.grammar;
        let mut defaulted = BTreeSet::new();

        let title = match g.title.first_match(text) {
            Some(found) => found.value,
            None => {
                defaulted.insert(Field::Title);
                if id.trim().is_empty() {
                    UNTITLED.to_string()
                } else {
                    id.to_string()
                }
            }
        };

        let agent = match g.agent.first_match(text) {
            Some(found) => found.value,
            None => {
                defaulted.insert(Field::Agent);
                g.agents()
                    .find_in(id)
                    .unwrap_or_else(|| g.agents().default_agent())
                    .clone()
            }
        };

        let status = g.status.first_match(text).map(|f| f.value).unwrap_or_else(|| {
            defaulted.insert(Field::Status);
            Status::default()
        });

        let created_at = g
            .created_at
            .first_match(text)
            .map(|f| f.value)
            .unwrap_or_else(|| {
                defaulted.insert(Field::CreatedAt);
                self.clock.now()
            });

        let updated_at = g
            .updated_at
            .first_match(text)
            .map(|f| f.value)
            .unwrap_or_else(|| {
                defaulted.insert(Field::UpdatedAt);
                created_at
            });

        let owner = g.owner.first_match(text).map(|f| f.value).unwrap_or_else(|| {
            defaulted.insert(Field::Owner);
            DEFAULT_OWNER.to_string()
        });

        let sort_order = g
            .sort_order
            .first_match(text)
            .map(|f| f.value)
            .unwrap_or_else(|| {
                defaulted.insert(Field::SortOrder);
                DEFAULT_SORT_ORDER
            });

        let blocker_found = g.blocker.first_match(text);
        let claimed: Vec<Span> = blocker_found.iter().map(|f| f.span).collect();
        let blocker = blocker_found.map(|f| f.value);
        if blocker.is_none() {
            defaulted.insert(Field::Blocker);
        }

        let phases = extract_phases(text);

        TaskRecord {
            id: id.to_string(),
            title,
            status,
            agent_name: agent.name,
            agent_icon: agent.icon,
            agent_color: agent.color,
            owner,
            sort_order,
            created_at,
            updated_at,
            progress: count_progress(text),
            current_phase: current_phase(&phases),
            phases,
            loose_items: loose_items(text, &claimed),
            blocker,
            execution_records: extract_execution_records(text),
            defaulted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::clock::{format_timestamp, FixedClock};
    use crate::document::vocab::NOT_STARTED;

    fn parse(text: &str, id: &str) -> TaskRecord {
        let grammar = Grammar::default();
        let clock = FixedClock::at("2030-01-01 12:00").unwrap();
        Parser::new(&grammar, &clock).parse(text, id)
    }

    const FULL: &str = "# 任务清单: 网关迁移

- **状态**: ✅ 已完成
- 创建时间: 2024-03-01 09:00
- 更新时间: 2024-03-04 18:30
- 负责人: alice
- 排序: 2
- [🟢 丑牛]

## 描述
把旧网关迁移到新集群。

## Phase 1: 准备
- [x] 盘点路由
- [x] 申请证书

## Phase 2: 切换
- [x] 灰度 10%
- [ ] 全量

## 执行记录
2024-03-01 09:00: 创建任务
2024-03-02 10:15: 完成准备
  附带说明
2024-03-04 18:30: 灰度完成

## 阻塞点
等待 DNS 变更窗口
";

    #[test]
    fn test_parse_full_document() {
        let r = parse(FULL, "gateway");
        assert_eq!(r.id, "gateway");
        assert_eq!(r.title, "网关迁移");
        assert_eq!(r.status, Status::Completed);
        assert_eq!(r.agent_name, "丑牛");
        assert_eq!(r.agent_icon, "🟢");
        assert_eq!(r.agent_color, "green");
        assert_eq!(r.owner, "alice");
        assert_eq!(r.sort_order, 2);
        assert_eq!(format_timestamp(r.created_at), "2024-03-01 09:00");
        assert_eq!(format_timestamp(r.updated_at), "2024-03-04 18:30");
        assert_eq!(r.progress, Progress::new(3, 4));
        assert_eq!(r.progress.percent(), 75);
        assert_eq!(r.phases.len(), 2);
        assert_eq!(r.current_phase, "Phase 2: 切换");
        assert_eq!(r.blocker.as_deref(), Some("等待 DNS 变更窗口"));
        assert_eq!(r.execution_records.len(), 3);
        assert_eq!(r.execution_records[1].action, "完成准备\n  附带说明");
        assert!(r.defaulted.is_empty(), "defaulted: {:?}", r.defaulted);
    }

    #[test]
    fn test_parse_empty_input_is_fully_defaulted() {
        let r = parse("", "");
        assert_eq!(r.title, UNTITLED);
        assert_eq!(r.status, Status::InProgress);
        assert_eq!(r.status.glyph(), "🔄");
        assert_eq!(r.agent_name, "老丑");
        assert_eq!(r.owner, DEFAULT_OWNER);
        assert_eq!(r.sort_order, DEFAULT_SORT_ORDER);
        assert_eq!(r.progress.total, 0);
        assert_eq!(r.progress.percent(), 0);
        assert_eq!(r.current_phase, NOT_STARTED);
        assert!(r.blocker.is_none());
        assert!(r.execution_records.is_empty());
        for field in [
            Field::Title,
            Field::Status,
            Field::Agent,
            Field::CreatedAt,
            Field::UpdatedAt,
            Field::Owner,
            Field::SortOrder,
            Field::Blocker,
        ] {
            assert!(r.is_default(field), "{field} should be defaulted");
        }
    }

    #[test]
    fn test_missing_status_defaults_to_in_progress() {
        let r = parse("# 任务清单: 无状态\n- 负责人: bob", "x");
        assert_eq!(r.status, Status::InProgress);
        assert_eq!(r.status.glyph(), "🔄");
        assert!(r.is_default(Field::Status));
        assert!(!r.is_default(Field::Owner));
    }

    #[test]
    fn test_created_at_defaults_to_clock() {
        let r = parse("# 任务清单: a", "a");
        assert_eq!(format_timestamp(r.created_at), "2030-01-01 12:00");
        assert_eq!(r.updated_at, r.created_at);
    }

    #[test]
    fn test_updated_at_inherits_created_at() {
        let r = parse("- 创建时间: 2024-02-02 02:02", "a");
        assert_eq!(format_timestamp(r.updated_at), "2024-02-02 02:02");
        assert!(r.is_default(Field::UpdatedAt));
        assert!(!r.is_default(Field::CreatedAt));
    }

    #[test]
    fn test_title_falls_back_to_id() {
        let r = parse("just text", "fallback-id");
        assert_eq!(r.title, "fallback-id");
        assert!(r.is_default(Field::Title));
    }

    #[test]
    fn test_agent_from_storage_key() {
        let r = parse("# 任务清单: x", "2024-05-子鼠-日报");
        assert_eq!(r.agent_name, "子鼠");
        assert_eq!(r.agent_icon, "🟡");
        assert!(r.is_default(Field::Agent));
    }

    #[test]
    fn test_progress_counts_indented_and_uppercase() {
        let text = "- [x] a\n  - [X] b\n- [ ] c\n* [ ] d\nnot - [x] e";
        let p = count_progress(text);
        assert_eq!(p, Progress::new(2, 4));
        assert_eq!(p.percent(), 50);
    }

    #[test]
    fn test_extract_phases_scenario() {
        let phases = extract_phases("Phase 1: Setup\n- [x] a\n- [ ] b\nPhase 2: Build\n- [x] c");
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].name, "Setup");
        assert_eq!(phases[0].percent(), 50);
        assert_eq!(phases[1].name, "Build");
        assert_eq!(phases[1].percent(), 100);
        assert_eq!(
            phases[0].items,
            vec![
                PhaseItem {
                    text: "a".into(),
                    checked: true
                },
                PhaseItem {
                    text: "b".into(),
                    checked: false
                },
            ]
        );
    }

    #[test]
    fn test_phase_ends_at_level2_heading() {
        let text = "## Phase 1: 准备\n- [x] a\n## 其他\n- [ ] not in phase";
        let phases = extract_phases(text);
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].items.len(), 1);
        assert_eq!(count_progress(text).total, 2);
    }

    #[test]
    fn test_phase_without_items() {
        let phases = extract_phases("## Phase 3: 收尾\n## Phase 4");
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].percent(), 0);
        assert_eq!(phases[1].name, "");
    }

    #[test]
    fn test_phase_markers_variants() {
        let text = "### **Phase 1**: 一\n- Phase 2：二\nPhase 3 三\nsee Phase 9: not a marker";
        let phases = extract_phases(text);
        let names: Vec<_> = phases.iter().map(|p| (p.id, p.name.as_str())).collect();
        assert_eq!(names, vec![(1, "一"), (2, "二"), (3, "三")]);
    }

    #[test]
    fn test_phases_sorted_numerically() {
        let phases = extract_phases("Phase 2: b\nPhase 1: a");
        assert_eq!(phases[0].id, 1);
        assert_eq!(phases[1].id, 2);
    }

    #[test]
    fn test_phase_sections_spans() {
        let text = "Phase 1: a\n- [ ] x\nPhase 2: b\n";
        let sections = phase_sections(text);
        assert_eq!(sections[0].marker.slice(text), "Phase 1: a");
        assert_eq!(sections[0].body.slice(text), "\n- [ ] x\n");
        assert_eq!(sections[1].body.slice(text), "\n");
    }

    #[test]
    fn test_loose_items_outside_phases_and_blocker() {
        let text = "# 任务清单: t\n- [x] 顶层\n\n## Phase 1: a\n- [ ] 阶段内\n\n## 阻塞点\n- [ ] 阻塞内\n";
        let r = parse(text, "t");
        assert_eq!(r.progress, Progress::new(1, 3));
        assert_eq!(
            r.loose_items,
            vec![PhaseItem {
                text: "顶层".into(),
                checked: true
            }]
        );
        assert_eq!(r.phases[0].items.len(), 1);
    }

    #[test]
    fn test_record_stops_at_checkbox_line() {
        let text = "2024-01-02 11:00: 开工\n  补充\n- [ ] 后续\n";
        let records = extract_execution_records(text);
        assert_eq!(records[0].action, "开工\n  补充");
    }

    #[test]
    fn test_metadata_timestamp_is_not_a_record() {
        let records = extract_execution_records("- 创建时间: 2024-01-01 10:00\n2024-01-02 11:00: 开工");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "开工");
    }

    #[test]
    fn test_records_stop_at_heading() {
        let text = "2024-01-02 11:00: 开工\n\n## 阻塞点\n无";
        let records = extract_execution_records(text);
        assert_eq!(records[0].action, "开工");
    }

    #[test]
    fn test_execution_log_heading() {
        let text = "x\n## 执行记录\n2024-01-02 11:00: a";
        let span = execution_log_heading(text).unwrap();
        assert_eq!(span.slice(text), "## 执行记录");
        assert!(execution_log_heading("## 执行记录说明").is_none());
        let crlf = "## Execution Log\r\nrest";
        assert_eq!(execution_log_heading(crlf).unwrap().slice(crlf), "## Execution Log");
    }

    #[test]
    fn test_checkbox_mark_span() {
        let text = "- [ ] 写文档";
        let cb = checkboxes(text).next().unwrap();
        assert_eq!(cb.mark.slice(text), " ");
        assert_eq!(cb.text, "写文档");
        assert!(!cb.checked);
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse(FULL, "gateway"), parse(FULL, "gateway"));
    }
}

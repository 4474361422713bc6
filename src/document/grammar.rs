//! Ordered extraction rules for every recognized field.
//!
//! Each field owns a [`RuleChain`]: a list of named rules tried in order,
//! first match wins. Later rules exist for older document formats and are
//! only consulted when the earlier ones find nothing. Every rule reports the
//! byte [`Span`] of the value it found, which is what the mutator rewrites.

use chrono::NaiveDateTime;
use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use super::clock::parse_timestamp;
use super::record::Field;
use super::vocab::{labels, Agent, AgentTable, Status, MAX_TITLE_CHARS};
use crate::error::{Result, TaskboardError};

// ============================================================================
// Spans
// ============================================================================

/// Half-open byte range `[start, end)` into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} after end {end}");
        Self { start, end }
    }

    #[must_use]
    pub fn empty_at(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn slice<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }
}

/// Span of `text[start..end]` with surrounding whitespace removed.
///
/// `None` when only whitespace remains.
#[must_use]
pub fn trimmed_span(text: &str, start: usize, end: usize) -> Option<Span> {
    let slice = &text[start..end];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lead = slice.len() - slice.trim_start().len();
    Some(Span::new(start + lead, start + lead + trimmed.len()))
}

/// A value found in a document and where it sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    pub value: T,
    pub span: Span,
}

// ============================================================================
// Rule Chains
// ============================================================================

type Extractor<T> = Box<dyn Fn(&str) -> Option<Located<T>> + Send + Sync>;

/// A single named extraction rule.
pub struct Rule<T> {
    name: &'static str,
    extract: Extractor<T>,
}

/// Ordered list of rules for one field.
pub struct RuleChain<T> {
    rules: Vec<Rule<T>>,
}

impl<T> Default for RuleChain<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T> RuleChain<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`RuleChain::push`].
    #[must_use]
    pub fn rule<F>(mut self, name: &'static str, extract: F) -> Self
    where
        F: Fn(&str) -> Option<Located<T>> + Send + Sync + 'static,
    {
        self.push(name, extract);
        self
    }

    /// Append a rule after all existing ones.
    pub fn push<F>(&mut self, name: &'static str, extract: F)
    where
        F: Fn(&str) -> Option<Located<T>> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            name,
            extract: Box::new(extract),
        });
    }

    /// First match of the first rule that matches anywhere.
    #[must_use]
    pub fn first_match(&self, text: &str) -> Option<Located<T>> {
        self.first_match_named(text).map(|(_, located)| located)
    }

    /// Like [`RuleChain::first_match`], also naming the rule that fired.
    #[must_use]
    pub fn first_match_named(&self, text: &str) -> Option<(&'static str, Located<T>)> {
        self.rules
            .iter()
            .find_map(|rule| (rule.extract)(text).map(|located| (rule.name, located)))
    }

    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }
}

impl<T> fmt::Debug for RuleChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rule_names()).finish()
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// Start of a metadata line: optional list marker, optional bold opener.
const META_PREFIX: &str = r"(?m)^[ \t]*(?:[-*+][ \t]+)?(?:\*\*)?";

/// Between label and value: optional bold closer, half- or full-width colon.
const META_SEPARATOR: &str = r"(?:\*\*)?[ \t]*[:：](?:\*\*)?[ \t]*";

const VARIATION_SELECTOR: &str = "\u{FE0F}";

const TIMESTAMP_VALUE: &str = r"(\d{4}-\d{2}-\d{2})[ \tT]*(\d{2}:\d{2})";

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| TaskboardError::Other(anyhow::anyhow!("invalid grammar pattern: {e}")))
}

fn metadata_pattern(field_labels: &[&str], value: &str) -> String {
    format!(
        "{META_PREFIX}{}{META_SEPARATOR}{value}",
        labels::alternation(field_labels)
    )
}

/// Unanchored `label: value`, the layout of the earliest documents.
fn loose_pattern(label: &str, value: &str) -> String {
    format!(
        r"{}(?:\*\*)?[ \t]*[:：][ \t]*{value}",
        regex::escape(label)
    )
}

fn status_pattern(statuses: &[Status], anchored: bool) -> String {
    let glyphs: Vec<String> = statuses.iter().map(|s| regex::escape(s.glyph())).collect();
    let words: Vec<&str> = statuses.iter().map(|s| s.word()).collect();
    let value = format!(
        "({}){VARIATION_SELECTOR}?[ \\t]*({})",
        glyphs.join("|"),
        words.join("|")
    );
    if anchored {
        metadata_pattern(labels::STATUS, &value)
    } else {
        loose_pattern(labels::STATUS[0], &value)
    }
}

/// Value on the header line, or after a bare `任务清单:` on the next
/// non-blank line that is not a heading, list item or tag.
static TITLE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^#+[ \t]*{}(?:[ \t]*[:：]?[ \t]*(\S[^\n]*)|[ \t]*[:：][ \t]*\r?\n\s*([^\s#*+\[-][^\n]*))$",
        labels::alternation(labels::TITLE)
    ))
    .expect("valid title header regex")
});

static ANY_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#+[ \t]*([^\n]*)$").expect("valid heading regex"));

static BLOCKER_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^#{{1,6}}[ \t]*{}[ \t]*[:：]?[ \t]*\r?$",
        labels::alternation(labels::BLOCKER)
    ))
    .expect("valid blocker heading regex")
});

/// A `阻塞点:` metadata line; the label must open the line.
static BLOCKER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "{META_PREFIX}{}{META_SEPARATOR}",
        labels::alternation(labels::BLOCKER)
    ))
    .expect("valid blocker marker regex")
});

static LEVEL2_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##(?:[^#]|$)").expect("valid level-2 heading regex"));

/// Start of the next level-2 heading at or after `from`.
#[must_use]
pub fn next_level2_heading(text: &str, from: usize) -> Option<usize> {
    LEVEL2_HEADING.find_at(text, from).map(|m| m.start())
}

/// End of the line containing `pos` (index of its `\n`, or text length).
#[must_use]
pub fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map_or(text.len(), |i| pos + i)
}

// ============================================================================
// Extractors
// ============================================================================

fn clip_title(raw: &str) -> String {
    let first_line = raw.lines().next().unwrap_or_default();
    first_line
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect::<String>()
        .trim()
        .to_string()
}

fn header_title(text: &str) -> Option<Located<String>> {
    TITLE_HEADER.captures_iter(text).find_map(|caps| {
        let m = caps.get(1).or_else(|| caps.get(2))?;
        let span = trimmed_span(text, m.start(), m.end())?;
        Some(Located {
            value: clip_title(span.slice(text)),
            span,
        })
    })
}

fn first_heading_title(text: &str) -> Option<Located<String>> {
    ANY_HEADING.captures_iter(text).find_map(|caps| {
        let m = caps.get(1)?;
        let span = trimmed_span(text, m.start(), m.end())?;
        let value = span.slice(text);
        (value.chars().count() < MAX_TITLE_CHARS).then(|| Located {
            value: value.to_string(),
            span,
        })
    })
}

fn status_from(re: &Regex, text: &str) -> Option<Located<Status>> {
    re.captures_iter(text).find_map(|caps| {
        let glyph = caps.get(1)?;
        let word = caps.get(2)?;
        Status::from_pair(glyph.as_str(), word.as_str()).map(|status| Located {
            value: status,
            span: Span::new(glyph.start(), word.end()),
        })
    })
}

fn timestamp_from(re: &Regex, text: &str) -> Option<Located<NaiveDateTime>> {
    re.captures_iter(text).find_map(|caps| {
        let date = caps.get(1)?;
        let time = caps.get(2)?;
        parse_timestamp(&format!("{} {}", date.as_str(), time.as_str())).map(|value| Located {
            value,
            span: Span::new(date.start(), time.end()),
        })
    })
}

fn token_from(re: &Regex, text: &str) -> Option<Located<String>> {
    re.captures(text).and_then(|caps| {
        let m = caps.get(1)?;
        Some(Located {
            value: m.as_str().to_string(),
            span: Span::new(m.start(), m.end()),
        })
    })
}

fn integer_from(re: &Regex, text: &str) -> Option<Located<i64>> {
    re.captures_iter(text).find_map(|caps| {
        let m = caps.get(1)?;
        m.as_str().parse().ok().map(|value| Located {
            value,
            span: Span::new(m.start(), m.end()),
        })
    })
}

fn agent_from(table: &AgentTable, caps: &Captures<'_>, whole_tag: bool) -> Option<Located<Agent>> {
    let icon = caps.get(1);
    let name = caps.get(2)?;
    let start = match (whole_tag, icon) {
        (true, _) => caps.get(0)?.start(),
        (false, Some(icon)) => icon.start(),
        (false, None) => name.start(),
    };
    let end = if whole_tag {
        caps.get(0)?.end()
    } else {
        name.end()
    };
    Some(Located {
        value: table.resolve(name.as_str(), icon.map(|m| m.as_str())),
        span: Span::new(start, end),
    })
}

/// Section body below a blocker heading, up to the next level-2 heading.
fn blocker_body(text: &str, heading_end: usize) -> Located<String> {
    let body_start = (line_end(text, heading_end) + 1).min(text.len());
    let body_end = next_level2_heading(text, body_start).unwrap_or(text.len());
    located_or_empty(text, body_start, body_end)
}

/// Value after a blocker metadata label.
///
/// The rest of the label line when it holds text; otherwise the paragraph
/// below it, ending at a blank line or the next level-2 heading.
fn marker_body(text: &str, marker_end: usize) -> Located<String> {
    let eol = line_end(text, marker_end);
    if let Some(span) = trimmed_span(text, marker_end, eol) {
        return Located {
            value: span.slice(text).to_string(),
            span,
        };
    }
    let body_start = (eol + 1).min(text.len());
    let paragraph_end = text[body_start..]
        .find("\n\n")
        .map_or(text.len(), |i| body_start + i);
    let body_end = next_level2_heading(text, body_start)
        .unwrap_or(text.len())
        .min(paragraph_end);
    located_or_empty(text, body_start, body_end)
}

fn located_or_empty(text: &str, body_start: usize, body_end: usize) -> Located<String> {
    match trimmed_span(text, body_start, body_end) {
        Some(span) => Located {
            value: span.slice(text).to_string(),
            span,
        },
        None => Located {
            value: String::new(),
            span: Span::empty_at(body_start),
        },
    }
}

// ============================================================================
// Grammar
// ============================================================================

/// The complete rule set for one agent table.
#[derive(Debug)]
pub struct Grammar {
    agents: AgentTable,
    pub title: RuleChain<String>,
    pub status: RuleChain<Status>,
    pub agent: RuleChain<Agent>,
    pub created_at: RuleChain<NaiveDateTime>,
    pub updated_at: RuleChain<NaiveDateTime>,
    pub owner: RuleChain<String>,
    pub sort_order: RuleChain<i64>,
    pub blocker: RuleChain<String>,
}

impl Grammar {
    /// Build the rule chains for `agents`.
    pub fn new(agents: AgentTable) -> Result<Self> {
        let title = RuleChain::new()
            .rule("task-list-header", header_title)
            .rule("first-heading", first_heading_title);

        let historical = compile(&status_pattern(&Status::HISTORICAL, true))?;
        let planned = compile(&status_pattern(&[Status::Planned], true))?;
        let loose_status = compile(&status_pattern(&Status::ALL, false))?;
        let status = RuleChain::new()
            .rule("metadata-line", move |text| status_from(&historical, text))
            .rule("metadata-line-planned", move |text| status_from(&planned, text))
            .rule("inline", move |text| status_from(&loose_status, text));

        let icons = agents.icon_pattern().to_string();
        let inline_tag = compile(&format!(
            r"\[({icons}){VARIATION_SELECTOR}?[ \t]*([^\]\s]+)\]"
        ))?;
        let agent_line = compile(&metadata_pattern(
            labels::AGENT,
            &format!(r"(?:({icons}){VARIATION_SELECTOR}?[ \t]*)?([^\s*\]]+)"),
        ))?;
        let tag_table = agents.clone();
        let line_table = agents.clone();
        let agent = RuleChain::new()
            .rule("inline-tag", move |text| {
                inline_tag
                    .captures_iter(text)
                    .find_map(|caps| agent_from(&tag_table, &caps, true))
            })
            .rule("metadata-line", move |text| {
                agent_line
                    .captures_iter(text)
                    .find_map(|caps| agent_from(&line_table, &caps, false))
            });

        let created_at = timestamp_chain(labels::CREATED)?;
        let updated_at = timestamp_chain(labels::UPDATED)?;

        let owner_line = compile(&metadata_pattern(labels::OWNER, r"([^\s*]+)"))?;
        let owner_loose = compile(&loose_pattern(labels::OWNER[0], r"([^\s*]+)"))?;
        let owner = RuleChain::new()
            .rule("metadata-line", move |text| token_from(&owner_line, text))
            .rule("inline", move |text| token_from(&owner_loose, text));

        let sort_line = compile(&metadata_pattern(labels::SORT, r"([-+]?\d+)"))?;
        let sort_order =
            RuleChain::new().rule("metadata-line", move |text| integer_from(&sort_line, text));

        let blocker = RuleChain::new()
            .rule("heading", |text| {
                BLOCKER_HEADING
                    .find(text)
                    .map(|m| blocker_body(text, m.end()))
            })
            .rule("marker", |text| {
                BLOCKER_MARKER
                    .find(text)
                    .map(|m| marker_body(text, m.end()))
            });

        Ok(Self {
            agents,
            title,
            status,
            agent,
            created_at,
            updated_at,
            owner,
            sort_order,
            blocker,
        })
    }

    #[must_use]
    pub fn agents(&self) -> &AgentTable {
        &self.agents
    }

    /// Span of the value the parser would read for `field`.
    #[must_use]
    pub fn locate(&self, text: &str, field: Field) -> Option<Span> {
        match field {
            Field::Title => self.title.first_match(text).map(|l| l.span),
            Field::Status => self.status.first_match(text).map(|l| l.span),
            Field::Agent => self.agent.first_match(text).map(|l| l.span),
            Field::CreatedAt => self.created_at.first_match(text).map(|l| l.span),
            Field::UpdatedAt => self.updated_at.first_match(text).map(|l| l.span),
            Field::Owner => self.owner.first_match(text).map(|l| l.span),
            Field::SortOrder => self.sort_order.first_match(text).map(|l| l.span),
            Field::Blocker => self.blocker.first_match(text).map(|l| l.span),
        }
    }
}

impl Default for Grammar {
    fn default() -> Self {
        // The builtin table only contains escaped literal icons.
        Self::new(AgentTable::builtin()).expect("builtin grammar compiles")
    }
}

fn timestamp_chain(field_labels: &'static [&'static str]) -> Result<RuleChain<NaiveDateTime>> {
    let line = compile(&metadata_pattern(field_labels, TIMESTAMP_VALUE))?;
    let loose = compile(&loose_pattern(field_labels[0], TIMESTAMP_VALUE))?;
    Ok(RuleChain::new()
        .rule("metadata-line", move |text| timestamp_from(&line, text))
        .rule("inline", move |text| timestamp_from(&loose, text)))
}

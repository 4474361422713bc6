//! Archive header handling.
//!
//! Archiving moves a document to the archive shelf behind a metadata
//! header. Restoring strips exactly that header, so the document comes back
//! byte-identical to what was archived.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::document::{format_timestamp, parse_timestamp};
use crate::error::{Result, TaskboardError};

const ARCHIVED_PREFIX: &str = "<!-- ARCHIVED: ";
const REASON_PREFIX: &str = "<!-- REASON: ";
const COMMENT_SUFFIX: &str = " -->";

/// Metadata written above an archived document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveHeader {
    /// Raw header value; normally `YYYY-MM-DD HH:MM`.
    pub archived_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ArchiveHeader {
    #[must_use]
    pub fn new(at: NaiveDateTime, reason: Option<&str>) -> Self {
        Self {
            archived_at: format_timestamp(at),
            reason: reason.map(sanitize_reason).filter(|r| !r.is_empty()),
        }
    }

    /// Archive time, when the header holds a well-formed timestamp.
    #[must_use]
    pub fn archived_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.archived_at)
    }

    fn render(&self) -> String {
        let mut out = format!("{ARCHIVED_PREFIX}{}{COMMENT_SUFFIX}\n", self.archived_at);
        if let Some(reason) = &self.reason {
            out.push_str(&format!("{REASON_PREFIX}{reason}{COMMENT_SUFFIX}\n"));
        }
        out.push('\n');
        out
    }
}

/// Keep the reason on one line and unable to close the comment early.
fn sanitize_reason(reason: &str) -> String {
    reason
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("-->", "->")
}

/// Split the first line off `text`, without its newline.
fn take_line(text: &str) -> Option<(&str, &str)> {
    text.split_once('\n')
}

fn comment_value<'t>(line: &'t str, prefix: &str) -> Option<&'t str> {
    line.strip_prefix(prefix)?.strip_suffix(COMMENT_SUFFIX)
}

/// Prefix `text` with an archive header.
#[must_use]
pub fn wrap(text: &str, header: &ArchiveHeader) -> String {
    let mut out = header.render();
    out.push_str(text);
    out
}

/// Read the archive header of `text`, if it carries one.
#[must_use]
pub fn read_header(text: &str) -> Option<ArchiveHeader> {
    split(text).ok().map(|(header, _)| header)
}

#[must_use]
pub fn is_archived(text: &str) -> bool {
    read_header(text).is_some()
}

/// Strip the archive header, returning the original document.
///
/// Exactly one header block is removed. Text without one is an error.
pub fn unwrap(text: &str) -> Result<String> {
    split(text).map(|(_, body)| body.to_string())
}

fn split(text: &str) -> Result<(ArchiveHeader, &str)> {
    let (first, rest) = take_line(text)
        .ok_or_else(|| TaskboardError::archive("document has no archive header"))?;
    let archived_at = comment_value(first, ARCHIVED_PREFIX)
        .ok_or_else(|| TaskboardError::archive("document has no archive header"))?;

    let (reason, rest) = match take_line(rest) {
        Some((line, after)) => match comment_value(line, REASON_PREFIX) {
            Some(reason) => (Some(reason.to_string()), after),
            None => (None, rest),
        },
        None => (None, rest),
    };

    let body = rest
        .strip_prefix('\n')
        .ok_or_else(|| TaskboardError::archive("archive header is not followed by a blank line"))?;

    Ok((
        ArchiveHeader {
            archived_at: archived_at.to_string(),
            reason,
        },
        body,
    ))
}

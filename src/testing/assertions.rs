//! Assertions for span-preserving edits.

use crate::document::{Span, TaskRecord};

/// Assert that `after` is `before` with exactly `span` replaced by
/// `replacement`.
///
/// # Panics
///
/// Panics with both texts when anything outside the span changed.
///
/// # Example
///
/// ```rust,ignore
/// let span = grammar.locate(text, Field::Owner).unwrap();
/// let edited = splice(text, span, "bob");
/// assert_only_span_changed(text, &edited, span, "bob");
/// ```
pub fn assert_only_span_changed(before: &str, after: &str, span: Span, replacement: &str) {
    let prefix = &before[..span.start];
    let suffix = &before[span.end..];
    assert!(
        after.starts_with(prefix),
        "Text before the span changed.\nBefore: {before:?}\nAfter: {after:?}"
    );
    assert!(
        after.ends_with(suffix),
        "Text after the span changed.\nBefore: {before:?}\nAfter: {after:?}"
    );
    assert_eq!(
        after.len(),
        prefix.len() + replacement.len() + suffix.len(),
        "Unexpected length change.\nBefore: {before:?}\nAfter: {after:?}"
    );
    assert_eq!(
        &after[span.start..span.start + replacement.len()],
        replacement,
        "Span does not hold the replacement."
    );
}

/// Assert that `after` only grew: `before` survives as a prefix-and-suffix
/// pair around a single insertion.
///
/// # Panics
///
/// Panics if any original byte was removed or rewritten.
pub fn assert_insertion_only(before: &str, after: &str) {
    assert!(
        after.len() >= before.len(),
        "Document shrank from {} to {} bytes.",
        before.len(),
        after.len()
    );
    let common_prefix = before
        .char_indices()
        .zip(after.chars())
        .take_while(|((_, a), b)| a == b)
        .last()
        .map_or(0, |((i, c), _)| i + c.len_utf8());
    assert!(
        after.ends_with(&before[common_prefix..]),
        "Original text was rewritten, not extended.\nBefore: {before:?}\nAfter: {after:?}"
    );
}

/// Assert that `field` was found in the document, not defaulted.
///
/// # Panics
///
/// Panics if the parser substituted a default for `field`.
pub fn assert_field_found(record: &TaskRecord, field: crate::document::Field) {
    assert!(
        !record.is_default(field),
        "Expected {field} to be read from the document, but it was defaulted.\nDefaulted: {:?}",
        record.defaulted
    );
}

/// Assert that `field` fell back to its default.
///
/// # Panics
///
/// Panics if the parser found a value for `field`.
pub fn assert_field_defaulted(record: &TaskRecord, field: crate::document::Field) {
    assert!(
        record.is_default(field),
        "Expected {field} to be defaulted, but the document supplied it."
    );
}

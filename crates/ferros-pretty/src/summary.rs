//! # Summary Rendering
//!
//! One-line renderings of values, sequences and tuples.
//!
//! These helpers never decode anything themselves: a nested value's summary
//! comes from [`Formatter::nested_summary`], which dispatches to that value's
//! own decoder. That is what makes `Vec<Option<String>>` render as
//! `(1) vec![Some("a")]` without any decoder knowing about the others.

use crate::formatter::Formatter;
use crate::host::Host;

/// Placeholder for values with neither a summary nor a scalar value.
pub const UNAVAILABLE: &str = "{...}";

/// Marker appended when a preview is cut short.
pub const ELLIPSIS: &str = "...";

/// Short text for one value.
///
/// Falls back from the value's own summary to its scalar text to `fallback`.
pub fn value_summary<H: Host>(fmt: &Formatter<'_, H>, value: &H::Value, fallback: &str) -> String
{
    if let Some(summary) = fmt.nested_summary(value) {
        return summary;
    }
    if let Some(text) = fmt.host().value_text(value) {
        return text;
    }
    fallback.to_string()
}

/// Comma-joined preview of `values`, cut after `max_chars` characters.
///
/// Elements are pulled lazily; once the preview is cut no further element is
/// created, so previewing a huge container costs only a few reads.
pub fn sequence_summary<H, I>(fmt: &Formatter<'_, H>, values: I, max_chars: usize) -> String
where
    H: Host,
    I: IntoIterator<Item = H::Value>,
{
    let mut text = String::new();
    for value in values {
        if !text.is_empty() {
            text.push_str(", ");
        }
        text.push_str(&value_summary(fmt, &value, UNAVAILABLE));
        if text.chars().count() > max_chars {
            text.push_str(", ");
            text.push_str(ELLIPSIS);
            break;
        }
    }
    text
}

/// `(a, b, c)` over the raw children of `value`, starting at `skip_first`.
pub fn tuple_summary<H: Host>(fmt: &Formatter<'_, H>, value: &H::Value, skip_first: usize) -> String
{
    let host = fmt.host();
    let fields: Vec<String> = (skip_first..host.num_children(value))
        .map(|index| match host.child_at(value, index) {
            Some(child) => value_summary(fmt, &child, UNAVAILABLE),
            None => UNAVAILABLE.to_string(),
        })
        .collect();
    format!("({})", fields.join(", "))
}

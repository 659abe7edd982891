//! # Structural Accessors
//!
//! Small helpers for walking raw struct layouts through a [`Host`].
//!
//! Field lookups return `Option` so decoders can probe several historical
//! layouts in a row without treating a miss as a failure.

use smallvec::SmallVec;
use tracing::debug;

use crate::error::FormatResult;
use crate::host::Host;
use crate::types::Address;

/// Chained field lookup: `child_path(host, v, &["buf", "ptr"])` is `v.buf.ptr`.
///
/// Returns `None` as soon as one link is missing.
pub fn child_path<H: Host>(host: &H, value: &H::Value, path: &[&str]) -> Option<H::Value>
{
    let mut current = value.clone();
    for name in path {
        current = host.child_by_name(&current, name)?;
    }
    Some(current)
}

/// First path in `candidates` that resolves, in order.
pub fn first_path<H: Host>(host: &H, value: &H::Value, candidates: &[&[&str]]) -> Option<H::Value>
{
    candidates.iter().find_map(|path| child_path(host, value, path))
}

/// Raw pointer inside a `Unique<T>`/`NonNull<T>` wrapper.
///
/// Between 1.33 and 1.63 `Unique::pointer` was a bare `*const T`; later it is a
/// `NonNull<T>` whose only field is the pointer.
pub fn read_unique_ptr<H: Host>(host: &H, value: &H::Value) -> Option<H::Value>
{
    let pointer = host.child_by_name(value, "pointer")?;
    if host.is_pointer(&pointer) {
        return Some(pointer);
    }
    host.child_at(&pointer, 0)
}

/// Unsigned scalar, unwrapping single-field newtypes such as `Cap(usize)`.
pub fn read_usize<H: Host>(host: &H, value: &H::Value) -> Option<u64>
{
    let mut current = value.clone();
    for _ in 0..4 {
        if !host.is_struct(&current) {
            return host.as_unsigned(&current);
        }
        current = host.child_at(&current, 0)?;
    }
    None
}

/// Address a pointer value holds.
pub fn pointer_address<H: Host>(host: &H, pointer: &H::Value) -> Option<Address>
{
    host.as_unsigned(pointer).map(Address::from)
}

/// Read `len` bytes at `address` and decode them as UTF-8, replacing invalid
/// sequences.
///
/// ## Errors
///
/// Returns the host's [`crate::FormatError::MemoryRead`] when the range is not
/// readable. A zero length never touches memory.
pub fn read_text<H: Host>(host: &H, address: Address, len: u64) -> FormatResult<String>
{
    if len == 0 {
        return Ok(String::new());
    }
    let bytes = host.read_memory(address, len)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Like [`read_text`], for the first `len` bytes of a longer string.
///
/// A character split by the cut is dropped instead of rendered as U+FFFD.
///
/// ## Errors
///
/// Same as [`read_text`].
pub fn read_text_prefix<H: Host>(host: &H, address: Address, len: u64) -> FormatResult<String>
{
    if len == 0 {
        return Ok(String::new());
    }
    let mut bytes = host.read_memory(address, len)?;
    bytes.truncate(complete_prefix_len(&bytes));
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Length of `bytes` without a trailing, incomplete UTF-8 sequence.
fn complete_prefix_len(bytes: &[u8]) -> usize
{
    // a sequence is at most 4 bytes, so only the last 3 can start a cut one
    let end = bytes.len();
    for start in (end.saturating_sub(3)..end).rev() {
        let lead = bytes[start];
        if lead & 0xc0 == 0x80 {
            continue;
        }
        let needed = match lead {
            0xf0..=0xff => 4,
            0xe0..=0xef => 3,
            0xc0..=0xdf => 2,
            _ => 1,
        };
        return if end - start < needed { start } else { end };
    }
    end
}

/// Top-level generic parameters of a type name.
///
/// Nesting is tracked so that inner commas stay inside their parameter:
///
/// ```rust
/// use ferros_pretty::access::template_params;
///
/// assert_eq!(template_params("Foo<Bar<X,Y>,Z>").as_slice(), ["Bar<X,Y>", "Z"]);
/// assert!(template_params("u32").is_empty());
/// ```
pub fn template_params(type_name: &str) -> SmallVec<[String; 4]>
{
    let mut params = SmallVec::new();
    let mut level = 0usize;
    let mut start = 0usize;
    for (i, c) in type_name.char_indices() {
        match c {
            '<' => {
                level += 1;
                if level == 1 {
                    start = i + 1;
                }
            }
            '>' => {
                level = level.saturating_sub(1);
                if level == 0 {
                    params.push(type_name[start..i].trim().to_string());
                }
            }
            ',' if level == 1 => {
                params.push(type_name[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    params
}

/// Index encoded in a synthetic child name: `"[3]"` or `"3"`.
pub fn parse_child_index(name: &str) -> Option<usize>
{
    let trimmed = name.trim_start_matches('[').trim_end_matches(']');
    match trimmed.parse() {
        Ok(index) => Some(index),
        Err(err) => {
            debug!(name, %err, "not an index child name");
            None
        }
    }
}

/// Last top-level `::` segment of a path-qualified name, generic arguments
/// dropped.
///
/// Separators inside `<...>` belong to type arguments and are skipped, so
/// `core::option::Option<alloc::string::String>` yields `Option` and
/// `core::option::Option<i32>::Some` yields `Some`.
pub fn last_path_segment(type_name: &str) -> &str
{
    let mut depth = 0usize;
    let mut start = 0;
    let mut previous_colon = false;
    for (index, ch) in type_name.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ':' if depth == 0 && previous_colon => start = index + 1,
            _ => {}
        }
        previous_colon = ch == ':' && !previous_colon;
    }
    let segment = &type_name[start..];
    segment.split('<').next().unwrap_or(segment)
}

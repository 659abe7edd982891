//! # String Providers
//!
//! Every string flavour decodes to a byte [`ElementView`]; the summary reads
//! those bytes and shows them as quoted UTF-8.
//!
//! At most [`crate::FormatterConfig::max_string_bytes`] bytes are read, so a
//! garbage length in an uninitialized `String` costs one bounded read. When
//! the length exceeds the cap the text ends in `...`.
//!
//! | kind | layout |
//! |---|---|
//! | `&str` | `data_ptr`, `length` |
//! | `String` | `vec` |
//! | `CString` | `inner` (boxed slice), length minus the NUL |
//! | `OsString` | `inner.inner` (a `Vec<u8>`), or `inner.inner.bytes` on Windows |
//! | `PathBuf` | `inner`, then as `OsString` |
//! | `&CStr`, `&OsStr`, `&Path` | raw `[pointer, length]` at the value's address |

use tracing::{debug, error};

use super::array::{element_at, slice_view, vec_view, view_len};
use crate::access::{child_path, parse_child_index, read_text, read_text_prefix};
use crate::error::{FormatError, FormatResult};
use crate::formatter::Formatter;
use crate::host::Host;
use crate::provider::{Provider, ProviderKind};
use crate::summary::ELLIPSIS;
use crate::types::ElementView;

/// Decoder for the string family
#[derive(Debug)]
pub struct StringProvider<H: Host>
{
    kind: ProviderKind,
    view: ElementView<H::Type>,
}

impl<H: Host> StringProvider<H>
{
    /// Decode any string kind.
    ///
    /// ## Errors
    ///
    /// [`FormatError::MissingField`] for unknown layouts; for the unsized
    /// kinds also [`FormatError::MemoryRead`] when the slice header is not
    /// readable.
    pub fn new(kind: ProviderKind, fmt: &Formatter<'_, H>, value: &H::Value) -> FormatResult<Self>
    {
        let host = fmt.host();
        let view = match kind {
            ProviderKind::String => {
                let vec = host.child_by_name(value, "vec").ok_or_else(|| FormatError::missing(kind, "vec"))?;
                vec_view(host, kind, &vec)?
            }
            ProviderKind::CString => {
                let inner = host.child_by_name(value, "inner").ok_or_else(|| FormatError::missing(kind, "inner"))?;
                let mut view = slice_view(host, kind, &inner)?;
                view.len = view.len.saturating_sub(1);
                view
            }
            ProviderKind::OsString => os_string_view(host, kind, value)?,
            ProviderKind::PathBuf => {
                let inner = host.child_by_name(value, "inner").ok_or_else(|| FormatError::missing(kind, "inner"))?;
                os_string_view(host, kind, &inner)?
            }
            ProviderKind::CStr => {
                let mut view = ffi_slice_view(host, kind, value)?;
                view.len = view.len.saturating_sub(1);
                view
            }
            ProviderKind::OsStr | ProviderKind::Path => ffi_slice_view(host, kind, value)?,
            _ => slice_view(host, kind, value)?,
        };
        Ok(Self { kind, view })
    }

    /// The decoded byte view.
    pub fn view(&self) -> &ElementView<H::Type>
    {
        &self.view
    }
}

/// `OsString` wraps a `Buf`, which on Windows adds a `bytes` layer.
fn os_string_view<H: Host>(host: &H, kind: ProviderKind, value: &H::Value) -> FormatResult<ElementView<H::Type>>
{
    let mut vec = child_path(host, value, &["inner", "inner"]).ok_or_else(|| FormatError::missing(kind, "inner.inner"))?;
    if let Some(bytes) = host.child_by_name(&vec, "bytes") {
        debug!(%kind, "windows os string layout");
        vec = bytes;
    }
    vec_view(host, kind, &vec)
}

/// Unsized slices carry incomplete debug info, so the standard fat pointer
/// layout `[data pointer, length]` is read straight from memory.
fn ffi_slice_view<H: Host>(host: &H, kind: ProviderKind, value: &H::Value) -> FormatResult<ElementView<H::Type>>
{
    let address = host
        .load_address(value)
        .ok_or_else(|| FormatError::ValueUnavailable(format!("{kind} value has no load address")))?;
    let item_type = host.byte_type().ok_or_else(|| FormatError::missing(kind, "u8 type"))?;
    let base = host.read_pointer(address)?;
    let len = host.read_pointer(address + host.pointer_size())?;
    Ok(ElementView {
        base: base.into(),
        item_type,
        item_size: 1,
        len,
    })
}

impl<H: Host> Provider<H> for StringProvider<H>
{
    fn has_children(&self, _fmt: &Formatter<'_, H>) -> FormatResult<bool>
    {
        Ok(true)
    }

    fn child_count(&self, _fmt: &Formatter<'_, H>) -> FormatResult<usize>
    {
        Ok(view_len(&self.view))
    }

    fn child_at(&self, fmt: &Formatter<'_, H>, index: usize) -> FormatResult<Option<H::Value>>
    {
        if !self.view.contains(index) {
            return Ok(None);
        }
        let host = fmt.host();
        Ok(element_at(host, &self.view, index, index as u64).map(|byte| host.with_char_format(byte)))
    }

    fn child_index_of(&self, _fmt: &Formatter<'_, H>, name: &str) -> FormatResult<Option<usize>>
    {
        Ok(parse_child_index(name))
    }

    fn summary(&self, fmt: &Formatter<'_, H>) -> FormatResult<Option<String>>
    {
        let limit = fmt.config().max_string_bytes;
        let truncated = self.view.len > limit;
        let read = if truncated {
            read_text_prefix(fmt.host(), self.view.base, limit)
        } else {
            read_text(fmt.host(), self.view.base, self.view.len)
        };
        let mut text = match read {
            Ok(text) => text,
            Err(err) => {
                error!(kind = %self.kind, %err, "string contents unreadable");
                return Ok(None);
            }
        };
        if truncated {
            text.push_str(ELLIPSIS);
        }
        Ok(Some(format!("\"{text}\"")))
    }
}

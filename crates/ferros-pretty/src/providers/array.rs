//! # Array-like Providers
//!
//! `Vec<T>`, `VecDeque<T>`, `&[T]` and `slice$<T>`.
//!
//! Every container here reduces to an [`ElementView`]: a base address, an
//! element type and size, and a count. Child `i` is created at
//! `base + i * size` and named `[i]`.

use smallvec::SmallVec;
use tracing::debug;

use crate::access::{child_path, parse_child_index, pointer_address, read_unique_ptr, read_usize, template_params};
use crate::error::{FormatError, FormatResult};
use crate::formatter::Formatter;
use crate::host::Host;
use crate::provider::{Provider, ProviderKind};
use crate::summary::sequence_summary;
use crate::types::ElementView;

/// Element view over the memory a typed pointer points at.
pub(crate) fn view_from_pointer<H: Host>(
    host: &H,
    kind: ProviderKind,
    pointer: &H::Value,
    len: u64,
) -> FormatResult<ElementView<H::Type>>
{
    let base = pointer_address(host, pointer).ok_or_else(|| FormatError::missing(kind, "data pointer value"))?;
    let item_type = host
        .pointee_type(&host.type_of(pointer))
        .ok_or_else(|| FormatError::missing(kind, "element type"))?;
    let item_size = host
        .type_size(&item_type)
        .ok_or_else(|| FormatError::missing(kind, "element size"))?;
    Ok(ElementView {
        base,
        item_type,
        item_size,
        len,
    })
}

/// Child `[index]` of a view, reading storage slot `slot`.
pub(crate) fn element_at<H: Host>(host: &H, view: &ElementView<H::Type>, index: usize, slot: u64) -> Option<H::Value>
{
    host.value_at_address(&format!("[{index}]"), view.element_address(slot), &view.item_type)
}

/// Number of children a view exposes.
pub(crate) fn view_len<T>(view: &ElementView<T>) -> usize
{
    usize::try_from(view.len).unwrap_or(usize::MAX)
}

/// `vec.buf.ptr` and `vec.len`, shared with `String` and `OsString`.
pub(crate) fn vec_view<H: Host>(host: &H, kind: ProviderKind, vec: &H::Value) -> FormatResult<ElementView<H::Type>>
{
    let pointer = child_path(host, vec, &["buf", "ptr"])
        .and_then(|ptr| read_unique_ptr(host, &ptr))
        .ok_or_else(|| FormatError::missing(kind, "buf.ptr.pointer"))?;
    let len = child_path(host, vec, &["len"])
        .and_then(|len| read_usize(host, &len))
        .ok_or_else(|| FormatError::missing(kind, "len"))?;
    view_from_pointer(host, kind, &pointer, len)
}

/// `data_ptr` and `length` of a fat slice reference.
pub(crate) fn slice_view<H: Host>(host: &H, kind: ProviderKind, slice: &H::Value) -> FormatResult<ElementView<H::Type>>
{
    let pointer = host
        .child_by_name(slice, "data_ptr")
        .ok_or_else(|| FormatError::missing(kind, "data_ptr"))?;
    let len = host
        .child_by_name(slice, "length")
        .and_then(|len| host.as_unsigned(&len))
        .ok_or_else(|| FormatError::missing(kind, "length"))?;
    view_from_pointer(host, kind, &pointer, len)
}

/// Decoder for `Vec<T>` and slices
#[derive(Debug)]
pub struct ArrayProvider<H: Host>
{
    kind: ProviderKind,
    view: ElementView<H::Type>,
    display_type: Option<String>,
}

impl<H: Host> ArrayProvider<H>
{
    /// Decode a `Vec`, `&[T]` or `slice$<T>`.
    ///
    /// ## Errors
    ///
    /// [`FormatError::MissingField`] when the layout is not recognised.
    pub fn new(kind: ProviderKind, fmt: &Formatter<'_, H>, value: &H::Value) -> FormatResult<Self>
    {
        let host = fmt.host();
        let view = match kind {
            ProviderKind::Vec => vec_view(host, kind, value)?,
            _ => slice_view(host, kind, value)?,
        };
        let display_type = if kind == ProviderKind::MsvcSlice {
            let params = template_params(&host.type_name(value));
            params.first().map(|item| format!("&[{item}]"))
        } else {
            None
        };
        Ok(Self { kind, view, display_type })
    }

    /// The decoded element view.
    pub fn view(&self) -> &ElementView<H::Type>
    {
        &self.view
    }

    fn element(&self, host: &H, index: usize) -> Option<H::Value>
    {
        if !self.view.contains(index) {
            return None;
        }
        element_at(host, &self.view, index, index as u64)
    }
}

impl<H: Host> Provider<H> for ArrayProvider<H>
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
        Ok(self.element(fmt.host(), index))
    }

    fn child_index_of(&self, _fmt: &Formatter<'_, H>, name: &str) -> FormatResult<Option<usize>>
    {
        Ok(parse_child_index(name))
    }

    fn summary(&self, fmt: &Formatter<'_, H>) -> FormatResult<Option<String>>
    {
        let host = fmt.host();
        let len = view_len(&self.view);
        let preview = sequence_summary(
            fmt,
            (0..len).map_while(|index| self.element(host, index)),
            fmt.config().preview_chars,
        );
        let summary = match self.kind {
            ProviderKind::Vec => format!("({len}) vec![{preview}]"),
            _ => format!("({len}) &[{preview}]"),
        };
        Ok(Some(summary))
    }

    fn display_type_name(&self) -> Option<String>
    {
        self.display_type.clone()
    }
}

/// How a `VecDeque` records its live range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeLayout
{
    /// `tail` (first element) and `head` (one past the last), before 1.67
    TailHead,
    /// `head` (first element) and `len`, since 1.67
    HeadLen,
}

/// Field pairs identifying each layout, probed in order.
const DEQUE_LAYOUTS: &[(DequeLayout, [&str; 2])] = &[
    (DequeLayout::TailHead, ["tail", "head"]),
    (DequeLayout::HeadLen, ["head", "len"]),
];

/// Decoder for `VecDeque<T>`
///
/// Storage is a ring of `cap` slots; logical element `i` lives in slot
/// `(start + i) % cap`.
#[derive(Debug)]
pub struct DequeProvider<H: Host>
{
    layout: DequeLayout,
    view: ElementView<H::Type>,
    cap: u64,
    start: u64,
}

impl<H: Host> DequeProvider<H>
{
    /// Decode a `VecDeque`.
    ///
    /// ## Errors
    ///
    /// [`FormatError::MissingField`] when no known layout matches.
    pub fn new(fmt: &Formatter<'_, H>, value: &H::Value) -> FormatResult<Self>
    {
        let host = fmt.host();
        let kind = ProviderKind::VecDeque;
        let pointer = child_path(host, value, &["buf", "ptr"])
            .and_then(|ptr| read_unique_ptr(host, &ptr))
            .ok_or_else(|| FormatError::missing(kind, "buf.ptr.pointer"))?;
        let cap = child_path(host, value, &["buf", "cap"])
            .and_then(|cap| read_usize(host, &cap))
            .ok_or_else(|| FormatError::missing(kind, "buf.cap"))?;

        let (layout, [first, second]) = DEQUE_LAYOUTS
            .iter()
            .find_map(|(layout, names)| {
                let fields: SmallVec<[u64; 2]> = names
                    .iter()
                    .map_while(|name| host.child_by_name(value, name).and_then(|field| read_usize(host, &field)))
                    .collect();
                (fields.len() == 2).then(|| (*layout, [fields[0], fields[1]]))
            })
            .ok_or_else(|| FormatError::missing(kind, "tail/head or head/len"))?;
        debug!(?layout, cap, "vec_deque layout");

        let (start, len) = match layout {
            DequeLayout::TailHead => {
                let (tail, head) = (first, second);
                let len = if cap == 0 {
                    0
                } else {
                    let diff = i128::from(head) - i128::from(tail);
                    // rem_euclid of a non-negative modulus is in 0..cap
                    u64::try_from(diff.rem_euclid(i128::from(cap))).unwrap_or(0)
                };
                (tail, len)
            }
            DequeLayout::HeadLen => (first, if cap == 0 { 0 } else { second }),
        };

        Ok(Self {
            layout,
            view: view_from_pointer(host, kind, &pointer, len)?,
            cap,
            start,
        })
    }

    /// Which layout the value uses.
    pub fn layout(&self) -> DequeLayout
    {
        self.layout
    }

    fn element(&self, host: &H, index: usize) -> Option<H::Value>
    {
        if !self.view.contains(index) || self.cap == 0 {
            return None;
        }
        let slot = (u128::from(self.start) + index as u128) % u128::from(self.cap);
        element_at(host, &self.view, index, u64::try_from(slot).ok()?)
    }
}

impl<H: Host> Provider<H> for DequeProvider<H>
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
        Ok(self.element(fmt.host(), index))
    }

    fn child_index_of(&self, _fmt: &Formatter<'_, H>, name: &str) -> FormatResult<Option<usize>>
    {
        Ok(parse_child_index(name))
    }

    fn summary(&self, fmt: &Formatter<'_, H>) -> FormatResult<Option<String>>
    {
        let host = fmt.host();
        let len = view_len(&self.view);
        let preview = sequence_summary(
            fmt,
            (0..len).map_while(|index| self.element(host, index)),
            fmt.config().preview_chars,
        );
        Ok(Some(format!("({len}) VecDeque[{preview}]")))
    }
}

//! # Smart-Pointer and Cell Providers
//!
//! These providers are transparent: children, counts and index lookups are
//! forwarded to the payload, so `Rc<Vec<i32>>` expands exactly like the
//! `Vec<i32>` inside it. Only the summary adds a prefix.

use tracing::debug;

use crate::access::{child_path, read_unique_ptr};
use crate::error::{FormatError, FormatResult};
use crate::formatter::Formatter;
use crate::host::Host;
use crate::provider::{Provider, ProviderKind};
use crate::summary::{value_summary, UNAVAILABLE};

/// Where a reference-counted box keeps its counters and payload
struct RefCountLayout
{
    strong: &'static [&'static str],
    weak: &'static [&'static str],
    payload: &'static str,
}

/// `RcBox { strong: Cell<usize>, weak: Cell<usize>, value: T }`
const RC_LAYOUT: RefCountLayout = RefCountLayout {
    strong: &["strong", "value", "value"],
    weak: &["weak", "value", "value"],
    payload: "value",
};

/// `ArcInner { strong: AtomicUsize, weak: AtomicUsize, data: T }`
const ARC_LAYOUT: RefCountLayout = RefCountLayout {
    strong: &["strong", "v", "value"],
    weak: &["weak", "v", "value"],
    payload: "data",
};

/// Shared transparent forwarding to a payload value, one nesting level down.
fn forward_has_children<H: Host>(fmt: &Formatter<'_, H>, payload: Option<&H::Value>) -> FormatResult<bool>
{
    payload.map_or(Ok(false), |payload| fmt.descend(|| fmt.has_children(payload)))
}

fn forward_child_count<H: Host>(fmt: &Formatter<'_, H>, payload: Option<&H::Value>) -> FormatResult<usize>
{
    payload.map_or(Ok(0), |payload| fmt.descend(|| fmt.child_count(payload)))
}

fn forward_child_at<H: Host>(fmt: &Formatter<'_, H>, payload: Option<&H::Value>, index: usize) -> FormatResult<Option<H::Value>>
{
    payload.map_or(Ok(None), |payload| fmt.descend(|| fmt.child_at(payload, index)))
}

fn forward_child_index_of<H: Host>(fmt: &Formatter<'_, H>, payload: Option<&H::Value>, name: &str) -> FormatResult<Option<usize>>
{
    payload.map_or(Ok(None), |payload| fmt.descend(|| fmt.child_index_of(payload, name)))
}

/// Decoder for `Rc<T>`, `rc::Weak<T>`, `Arc<T>` and `sync::Weak<T>`
///
/// Reported weak count excludes the implicit weak reference all strong
/// pointers share. With no strong references left the payload has been
/// dropped and is never read.
#[derive(Debug)]
pub struct RefCountedProvider<H: Host>
{
    strong: u64,
    weak: u64,
    payload: Option<H::Value>,
}

impl<H: Host> RefCountedProvider<H>
{
    /// Decode an `Rc`/`Arc` family value.
    ///
    /// ## Errors
    ///
    /// [`FormatError::MissingField`] when the pointer or counters are absent.
    pub fn new(kind: ProviderKind, fmt: &Formatter<'_, H>, value: &H::Value) -> FormatResult<Self>
    {
        let host = fmt.host();
        let layout = if kind == ProviderKind::Arc { &ARC_LAYOUT } else { &RC_LAYOUT };
        let inner = host
            .child_by_name(value, "ptr")
            .and_then(|ptr| read_unique_ptr(host, &ptr))
            .ok_or_else(|| FormatError::missing(kind, "ptr.pointer"))?;
        let strong = child_path(host, &inner, layout.strong)
            .and_then(|count| host.as_unsigned(&count))
            .ok_or_else(|| FormatError::missing(kind, layout.strong.join(".")))?;
        let mut weak = child_path(host, &inner, layout.weak)
            .and_then(|count| host.as_unsigned(&count))
            .ok_or_else(|| FormatError::missing(kind, layout.weak.join(".")))?;

        let payload = if strong > 0 {
            weak = weak.saturating_sub(1);
            Some(
                host.child_by_name(&inner, layout.payload)
                    .ok_or_else(|| FormatError::missing(kind, layout.payload))?,
            )
        } else {
            debug!(%kind, weak, "payload already dropped");
            None
        };
        Ok(Self { strong, weak, payload })
    }

    /// Strong reference count.
    pub fn strong(&self) -> u64
    {
        self.strong
    }

    /// Weak reference count, implicit reference excluded.
    pub fn weak(&self) -> u64
    {
        self.weak
    }
}

impl<H: Host> Provider<H> for RefCountedProvider<H>
{
    fn has_children(&self, fmt: &Formatter<'_, H>) -> FormatResult<bool>
    {
        forward_has_children(fmt, self.payload.as_ref())
    }

    fn child_count(&self, fmt: &Formatter<'_, H>) -> FormatResult<usize>
    {
        forward_child_count(fmt, self.payload.as_ref())
    }

    fn child_at(&self, fmt: &Formatter<'_, H>, index: usize) -> FormatResult<Option<H::Value>>
    {
        forward_child_at(fmt, self.payload.as_ref(), index)
    }

    fn child_index_of(&self, fmt: &Formatter<'_, H>, name: &str) -> FormatResult<Option<usize>>
    {
        forward_child_index_of(fmt, self.payload.as_ref(), name)
    }

    fn summary(&self, fmt: &Formatter<'_, H>) -> FormatResult<Option<String>>
    {
        let payload = match &self.payload {
            Some(payload) => value_summary(fmt, payload, UNAVAILABLE),
            None => "<disposed>".to_string(),
        };
        Ok(Some(format!("(refs:{}, weak:{}) {payload}", self.strong, self.weak)))
    }
}

/// Payload paths of the plain wrappers.
fn deref_payload<H: Host>(host: &H, kind: ProviderKind, value: &H::Value) -> Option<H::Value>
{
    match kind {
        ProviderKind::Mutex => child_path(host, value, &["data", "value"]),
        ProviderKind::RefBorrow => {
            let field = host.child_by_name(value, "value")?;
            // `debug_cell` stores a reference, std a `NonNull<T>`
            let pointer = if host.is_pointer(&field) { field } else { read_unique_ptr(host, &field)? };
            host.dereference(&pointer)
        }
        _ => child_path(host, value, &["value", "value"]),
    }
}

/// Decoder for `Mutex<T>`, `Cell<T>`, `Ref<T>` and `RefMut<T>`
#[derive(Debug)]
pub struct DerefProvider<H: Host>
{
    payload: H::Value,
}

impl<H: Host> DerefProvider<H>
{
    /// Locate the payload.
    ///
    /// ## Errors
    ///
    /// [`FormatError::MissingField`] when the payload cannot be reached.
    pub fn new(kind: ProviderKind, fmt: &Formatter<'_, H>, value: &H::Value) -> FormatResult<Self>
    {
        let payload = deref_payload(fmt.host(), kind, value).ok_or_else(|| FormatError::missing(kind, "payload"))?;
        Ok(Self { payload })
    }
}

impl<H: Host> Provider<H> for DerefProvider<H>
{
    fn has_children(&self, fmt: &Formatter<'_, H>) -> FormatResult<bool>
    {
        forward_has_children(fmt, Some(&self.payload))
    }

    fn child_count(&self, fmt: &Formatter<'_, H>) -> FormatResult<usize>
    {
        forward_child_count(fmt, Some(&self.payload))
    }

    fn child_at(&self, fmt: &Formatter<'_, H>, index: usize) -> FormatResult<Option<H::Value>>
    {
        forward_child_at(fmt, Some(&self.payload), index)
    }

    fn child_index_of(&self, fmt: &Formatter<'_, H>, name: &str) -> FormatResult<Option<usize>>
    {
        forward_child_index_of(fmt, Some(&self.payload), name)
    }

    fn summary(&self, fmt: &Formatter<'_, H>) -> FormatResult<Option<String>>
    {
        Ok(Some(value_summary(fmt, &self.payload, UNAVAILABLE)))
    }
}

/// Borrow state of a `RefCell`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowState
{
    /// Not borrowed
    Unused,
    /// `n` live shared borrows
    Shared(i64),
    /// One live mutable borrow (negative counter)
    Exclusive,
}

impl BorrowState
{
    /// Interpret the raw `borrow` counter.
    pub fn from_counter(counter: i64) -> Self
    {
        match counter {
            0 => BorrowState::Unused,
            n if n < 0 => BorrowState::Exclusive,
            n => BorrowState::Shared(n),
        }
    }

    /// Summary prefix, empty when unborrowed.
    pub fn annotation(self) -> String
    {
        match self {
            BorrowState::Unused => String::new(),
            BorrowState::Shared(n) => format!("(borrowed:{n}) "),
            BorrowState::Exclusive => "(borrowed:mut) ".to_string(),
        }
    }
}

/// Decoder for `RefCell<T>` (std and `debug_cell`)
#[derive(Debug)]
pub struct RefCellProvider<H: Host>
{
    payload: H::Value,
    borrow: BorrowState,
}

impl<H: Host> RefCellProvider<H>
{
    /// Locate the payload and read the borrow counter.
    ///
    /// ## Errors
    ///
    /// [`FormatError::MissingField`] when either is absent.
    pub fn new(fmt: &Formatter<'_, H>, value: &H::Value) -> FormatResult<Self>
    {
        let host = fmt.host();
        let kind = ProviderKind::RefCell;
        let payload = child_path(host, value, &["value", "value"]).ok_or_else(|| FormatError::missing(kind, "value.value"))?;
        let counter = child_path(host, value, &["borrow", "value", "value"])
            .and_then(|borrow| host.as_signed(&borrow))
            .ok_or_else(|| FormatError::missing(kind, "borrow.value.value"))?;
        Ok(Self {
            payload,
            borrow: BorrowState::from_counter(counter),
        })
    }

    /// Borrow state at decode time.
    pub fn borrow_state(&self) -> BorrowState
    {
        self.borrow
    }
}

impl<H: Host> Provider<H> for RefCellProvider<H>
{
    fn has_children(&self, fmt: &Formatter<'_, H>) -> FormatResult<bool>
    {
        forward_has_children(fmt, Some(&self.payload))
    }

    fn child_count(&self, fmt: &Formatter<'_, H>) -> FormatResult<usize>
    {
        forward_child_count(fmt, Some(&self.payload))
    }

    fn child_at(&self, fmt: &Formatter<'_, H>, index: usize) -> FormatResult<Option<H::Value>>
    {
        forward_child_at(fmt, Some(&self.payload), index)
    }

    fn child_index_of(&self, fmt: &Formatter<'_, H>, name: &str) -> FormatResult<Option<usize>>
    {
        forward_child_index_of(fmt, Some(&self.payload), name)
    }

    fn summary(&self, fmt: &Formatter<'_, H>) -> FormatResult<Option<String>>
    {
        Ok(Some(format!(
            "{}{}",
            self.borrow.annotation(),
            value_summary(fmt, &self.payload, UNAVAILABLE)
        )))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_borrow_state_from_counter()
    {
        assert_eq!(BorrowState::from_counter(0), BorrowState::Unused);
        assert_eq!(BorrowState::from_counter(3), BorrowState::Shared(3));
        assert_eq!(BorrowState::from_counter(-1), BorrowState::Exclusive);
    }

    #[test]
    fn test_borrow_annotation()
    {
        assert_eq!(BorrowState::Unused.annotation(), "");
        assert_eq!(BorrowState::Shared(2).annotation(), "(borrowed:2) ");
        assert_eq!(BorrowState::Exclusive.annotation(), "(borrowed:mut) ");
    }
}

//! # Provider Protocol
//!
//! The contract every decoder implements, and the closed set of decoders.
//!
//! ## Lifecycle
//!
//! 1. The formatter sees a value whose type name matches a registration.
//! 2. [`Decoder::initialize`] decodes the value once, caching every fact later
//!    queries need (element base, count, variant, occupied buckets).
//! 3. Queries ([`Provider::child_count`], [`Provider::summary`], ...) read only
//!    those cached facts. They are idempotent and never write memory.
//! 4. The decoder is dropped when its generation goes stale.
//!
//! `update` always answers `false`: a value identity is structurally
//! immutable for its decoder's lifetime, because the host mints new
//! identities after the process runs.

use std::fmt;

use tracing::debug;

use crate::error::FormatResult;
use crate::formatter::Formatter;
use crate::host::Host;
use crate::providers::array::{ArrayProvider, DequeProvider};
use crate::providers::enums::EnumProvider;
use crate::providers::hashtable::HashTableProvider;
use crate::providers::pointer::{DerefProvider, RefCellProvider, RefCountedProvider};
use crate::providers::string::StringProvider;
use crate::providers::tuple::TupleProvider;

/// Decoder families a type-name pattern can be registered against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind
{
    /// `alloc::vec::Vec<T>`
    Vec,
    /// `alloc::collections::vec_deque::VecDeque<T>`
    VecDeque,
    /// `&[T]`
    Slice,
    /// `slice$<T>` (`*-windows-msvc`)
    MsvcSlice,
    /// `&str`
    Str,
    /// `alloc::string::String`
    String,
    /// `std::ffi::c_str::CString`
    CString,
    /// `std::ffi::os_str::OsString`
    OsString,
    /// `std::path::PathBuf`
    PathBuf,
    /// `&std::ffi::c_str::CStr`
    CStr,
    /// `&std::ffi::os_str::OsStr`
    OsStr,
    /// `&std::path::Path`
    Path,
    /// `alloc::rc::Rc<T>` and `alloc::rc::Weak<T>`
    Rc,
    /// `alloc::sync::Arc<T>` and `alloc::sync::Weak<T>`
    Arc,
    /// `std::sync::mutex::Mutex<T>`
    Mutex,
    /// `core::cell::Cell<T>`
    Cell,
    /// `core::cell::RefCell<T>`
    RefCell,
    /// `core::cell::Ref<T>` / `RefMut<T>`
    RefBorrow,
    /// Sum types in any of the supported encodings
    Enum,
    /// `(A, B, ...)`
    Tuple,
    /// `tuple$<A, B, ...>` (`*-windows-msvc`)
    MsvcTuple,
    /// `std::collections::hash::map::HashMap<K, V>`
    HashMap,
    /// `std::collections::hash::set::HashSet<T>`
    HashSet,
}

impl fmt::Display for ProviderKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::Debug::fmt(self, f)
    }
}

/// Queries the host issues against a decoded value
///
/// Every method reads cached facts only. Child handles are created on demand
/// from those facts.
pub trait Provider<H: Host>
{
    /// `true` if the value should be expandable.
    ///
    /// ## Errors
    ///
    /// Forwarding providers propagate the payload decoder's failure.
    fn has_children(&self, fmt: &Formatter<'_, H>) -> FormatResult<bool>;

    /// Number of synthetic children.
    ///
    /// ## Errors
    ///
    /// Forwarding providers propagate the payload decoder's failure.
    fn child_count(&self, fmt: &Formatter<'_, H>) -> FormatResult<usize>;

    /// Synthetic child `index`; `Ok(None)` when out of range.
    ///
    /// ## Errors
    ///
    /// Forwarding providers propagate the payload decoder's failure.
    fn child_at(&self, fmt: &Formatter<'_, H>, index: usize) -> FormatResult<Option<H::Value>>;

    /// Index of the synthetic child called `name`.
    ///
    /// ## Errors
    ///
    /// Forwarding providers propagate the payload decoder's failure.
    fn child_index_of(&self, fmt: &Formatter<'_, H>, name: &str) -> FormatResult<Option<usize>>;

    /// One-line summary; `Ok(None)` when unavailable.
    ///
    /// ## Errors
    ///
    /// Unexpected faults only; unreadable memory yields `Ok(None)`.
    fn summary(&self, fmt: &Formatter<'_, H>) -> FormatResult<Option<String>>;

    /// Whether the host should re-check structure. Never needed.
    fn update(&self) -> bool
    {
        false
    }

    /// Rust spelling of the value's type, when the debug info spells it
    /// differently (`slice$<u8>` is shown as `&[u8]`).
    fn display_type_name(&self) -> Option<String>
    {
        None
    }
}

/// One decoded value
///
/// A closed union over the provider families, matched once per query.
#[derive(Debug)]
pub enum Decoder<H: Host>
{
    /// Vec, slices
    Array(ArrayProvider<H>),
    /// VecDeque
    Deque(DequeProvider<H>),
    /// Every string flavour
    Text(StringProvider<H>),
    /// Rc, Arc
    RefCounted(RefCountedProvider<H>),
    /// Mutex, Cell, Ref, RefMut
    Deref(DerefProvider<H>),
    /// RefCell
    RefCell(RefCellProvider<H>),
    /// Sum types
    Enum(EnumProvider<H>),
    /// Tuples
    Tuple(TupleProvider<H>),
    /// HashMap, HashSet
    Table(HashTableProvider<H>),
}

impl<H: Host> Decoder<H>
{
    /// Decode `value` as a `kind`.
    ///
    /// ## Errors
    ///
    /// Fails when no known layout of `kind` matches the value, or when memory
    /// the layout depends on (control bytes, FFI slice headers) is unreadable.
    pub fn initialize(kind: ProviderKind, fmt: &Formatter<'_, H>, value: &H::Value) -> FormatResult<Self>
    {
        debug!(%kind, type_name = %fmt.host().type_name(value), "initializing decoder");
        let decoder = match kind {
            ProviderKind::Vec | ProviderKind::Slice | ProviderKind::MsvcSlice => {
                Decoder::Array(ArrayProvider::new(kind, fmt, value)?)
            }
            ProviderKind::VecDeque => Decoder::Deque(DequeProvider::new(fmt, value)?),
            ProviderKind::Str
            | ProviderKind::String
            | ProviderKind::CString
            | ProviderKind::OsString
            | ProviderKind::PathBuf
            | ProviderKind::CStr
            | ProviderKind::OsStr
            | ProviderKind::Path => Decoder::Text(StringProvider::new(kind, fmt, value)?),
            ProviderKind::Rc | ProviderKind::Arc => Decoder::RefCounted(RefCountedProvider::new(kind, fmt, value)?),
            ProviderKind::Mutex | ProviderKind::Cell | ProviderKind::RefBorrow => {
                Decoder::Deref(DerefProvider::new(kind, fmt, value)?)
            }
            ProviderKind::RefCell => Decoder::RefCell(RefCellProvider::new(fmt, value)?),
            ProviderKind::Enum => Decoder::Enum(EnumProvider::new(fmt, value)?),
            ProviderKind::Tuple | ProviderKind::MsvcTuple => Decoder::Tuple(TupleProvider::new(kind, fmt, value)),
            ProviderKind::HashMap | ProviderKind::HashSet => Decoder::Table(HashTableProvider::new(kind, fmt, value)?),
        };
        Ok(decoder)
    }

    fn provider(&self) -> &dyn Provider<H>
    {
        match self {
            Decoder::Array(p) => p,
            Decoder::Deque(p) => p,
            Decoder::Text(p) => p,
            Decoder::RefCounted(p) => p,
            Decoder::Deref(p) => p,
            Decoder::RefCell(p) => p,
            Decoder::Enum(p) => p,
            Decoder::Tuple(p) => p,
            Decoder::Table(p) => p,
        }
    }
}

impl<H: Host> Provider<H> for Decoder<H>
{
    fn has_children(&self, fmt: &Formatter<'_, H>) -> FormatResult<bool>
    {
        self.provider().has_children(fmt)
    }

    fn child_count(&self, fmt: &Formatter<'_, H>) -> FormatResult<usize>
    {
        self.provider().child_count(fmt)
    }

    fn child_at(&self, fmt: &Formatter<'_, H>, index: usize) -> FormatResult<Option<H::Value>>
    {
        self.provider().child_at(fmt, index)
    }

    fn child_index_of(&self, fmt: &Formatter<'_, H>, name: &str) -> FormatResult<Option<usize>>
    {
        self.provider().child_index_of(fmt, name)
    }

    fn summary(&self, fmt: &Formatter<'_, H>) -> FormatResult<Option<String>>
    {
        self.provider().summary(fmt)
    }

    fn update(&self) -> bool
    {
        self.provider().update()
    }

    fn display_type_name(&self) -> Option<String>
    {
        self.provider().display_type_name()
    }
}

//! # Host Interface
//!
//! The reflection surface this crate needs from a native debugger.
//!
//! The host owns the debugged process and every value handle. Decoders only
//! read through handles and ask for derived ones (a child, a value at a
//! computed address, a dereference). Each capability maps onto one call of a
//! typical debugger scripting API:
//!
//! | method | LLDB equivalent |
//! |---|---|
//! | [`Host::child_by_name`] | `SBValue::GetChildMemberWithName` |
//! | [`Host::value_text`] | `SBValue::GetValue` |
//! | [`Host::host_summary`] | `SBValue::GetSummary` (built-in formatters only) |
//! | [`Host::value_at_address`] | `SBValue::CreateValueFromAddress` |
//! | [`Host::read_memory`] | `SBProcess::ReadMemory` |
//!
//! ## Raw vs synthetic
//!
//! Every method here is *raw*: it sees the compiler's struct layout, never the
//! decoded view. Decoded (synthetic) children go through
//! [`crate::Formatter`], which consults the registry first.
//!
//! ## Probing
//!
//! Lookups return `Option`. `None` is the normal answer when a layout simply
//! doesn't have the field asked for; decoders use it to select a layout.

pub mod memory;

use std::fmt;

use crate::error::{FormatError, FormatResult};
use crate::types::{Address, Generation, ValueId};

/// Capabilities consumed from the host debugger
///
/// ## Thread Safety
///
/// Queries are single-threaded and synchronous. Implementations are free to
/// use interior mutability without locking.
pub trait Host
{
    /// Opaque value handle
    type Value: Clone + fmt::Debug;
    /// Opaque type descriptor
    type Type: Clone + fmt::Debug;

    /// Stable identity of a value within the current generation.
    fn value_id(&self, value: &Self::Value) -> ValueId;

    /// Current validity epoch.
    fn generation(&self) -> Generation;

    /// Dynamic type name, e.g. `alloc::vec::Vec<i32>` or
    /// `enum$<core::option::Option<i32>>`.
    fn type_name(&self, value: &Self::Value) -> String;

    /// Display name of the value (its field name, or `[i]` for elements).
    fn value_name(&self, value: &Self::Value) -> Option<String>;

    /// Number of raw children.
    ///
    /// Pointers to aggregates report the pointee's children.
    fn num_children(&self, value: &Self::Value) -> usize;

    /// Raw child by position.
    fn child_at(&self, value: &Self::Value, index: usize) -> Option<Self::Value>;

    /// Raw child by field name, dereferencing pointers first.
    fn child_by_name(&self, value: &Self::Value, name: &str) -> Option<Self::Value>;

    /// Position of the raw child called `name`.
    fn index_of_child(&self, value: &Self::Value, name: &str) -> Option<usize>;

    /// Scalar or pointer value read as unsigned.
    fn as_unsigned(&self, value: &Self::Value) -> Option<u64>;

    /// Scalar value read as signed.
    fn as_signed(&self, value: &Self::Value) -> Option<i64>;

    /// Textual scalar value: a number, an enumerator name, a pointer.
    ///
    /// `None` for aggregates.
    fn value_text(&self, value: &Self::Value) -> Option<String>;

    /// Summary the host computed on its own (built-in formatters).
    fn host_summary(&self, _value: &Self::Value) -> Option<String>
    {
        None
    }

    /// `true` if the value is a raw pointer or reference.
    fn is_pointer(&self, value: &Self::Value) -> bool;

    /// `true` if the value's canonical type is a struct/class/union.
    fn is_struct(&self, value: &Self::Value) -> bool;

    /// Static type of the value.
    fn type_of(&self, value: &Self::Value) -> Self::Type;

    /// Pointee of a pointer type.
    fn pointee_type(&self, ty: &Self::Type) -> Option<Self::Type>;

    /// Size of a type in bytes.
    fn type_size(&self, ty: &Self::Type) -> Option<u64>;

    /// Name of a type.
    fn type_display_name(&self, ty: &Self::Type) -> String;

    /// Template argument `index` of a generic type, when the debug info has
    /// template parameters (not the case on `*-windows-msvc`).
    fn template_argument(&self, ty: &Self::Type, index: usize) -> Option<Self::Type>;

    /// Type with typedefs stripped.
    fn canonical_type(&self, ty: &Self::Type) -> Self::Type
    {
        ty.clone()
    }

    /// Look up a type by its full name.
    fn find_type(&self, name: &str) -> Option<Self::Type>;

    /// The `u8` type, used as element type for raw byte views.
    fn byte_type(&self) -> Option<Self::Type>;

    /// Pointer width of the target, in bytes.
    fn pointer_size(&self) -> u64;

    /// Address the value lives at, if it lives in memory.
    fn load_address(&self, value: &Self::Value) -> Option<Address>;

    /// Follow a pointer.
    fn dereference(&self, value: &Self::Value) -> Option<Self::Value>;

    /// Read `len` bytes of process memory.
    ///
    /// ## Errors
    ///
    /// [`FormatError::MemoryRead`] if any byte of the range is inaccessible.
    fn read_memory(&self, address: Address, len: u64) -> FormatResult<Vec<u8>>;

    /// New value handle of type `ty` living at `address`, displayed as `name`.
    fn value_at_address(&self, name: &str, address: Address, ty: &Self::Type) -> Option<Self::Value>;

    /// Value of type `ty` located `offset` bytes after `value`, displayed as
    /// `name`. With offset 0 and the value's own type this renames a value.
    fn child_at_offset(&self, value: &Self::Value, name: &str, offset: u64, ty: &Self::Type) -> Option<Self::Value>
    {
        let address = self.load_address(value)?.checked_add(offset)?;
        self.value_at_address(name, address, ty)
    }

    /// Ask the host to render a value as a character.
    fn with_char_format(&self, value: Self::Value) -> Self::Value
    {
        value
    }

    /// Read one little-endian, target-sized pointer.
    ///
    /// ## Errors
    ///
    /// Propagates the failure of [`Host::read_memory`].
    fn read_pointer(&self, address: Address) -> FormatResult<u64>
    {
        let width = self.pointer_size();
        let bytes = self.read_memory(address, width)?;
        if bytes.len() as u64 != width || width > 8 {
            return Err(FormatError::MemoryRead {
                address,
                len: width,
                reason: format!("short read of {} bytes", bytes.len()),
            });
        }
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(u64::from_le_bytes(buf))
    }
}

//! # Error Types
//!
//! Error handling for value decoding.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! ## What is *not* an error
//!
//! A missing field during layout probing is expected: the standard library
//! changed its internal layout many times, and decoders try each known layout
//! in turn. Those misses are modelled with `Option` and never reach this type.
//! A [`FormatError`] means either every known layout missed, a memory read
//! failed, or the debug info is malformed.

use thiserror::Error;

use crate::provider::ProviderKind;
use crate::types::Address;

/// Main error type for decoding operations
///
/// ## Error Categories
///
/// 1. **Layout errors**: MissingField, InvalidTypeName, NestingTooDeep
/// 2. **Memory errors**: MemoryRead
/// 3. **Host errors**: ValueUnavailable
/// 4. **Registration errors**: InvalidPattern
#[derive(Error, Debug)]
pub enum FormatError
{
    /// None of the known layouts for a type family matched the value
    ///
    /// This happens when:
    /// - The value comes from a standard library version we don't know about
    /// - The debug info for the value is incomplete
    /// - A pattern was registered against the wrong provider kind
    #[error("{kind} layout not recognised: missing field `{path}`")]
    MissingField
    {
        /// Provider that was decoding the value
        kind: ProviderKind,
        /// Dotted field path that could not be resolved
        path: String,
    },

    /// Reading memory from the debugged process failed
    ///
    /// Typically the address is unmapped (uninitialized pointer, freed
    /// allocation, truncated core dump).
    #[error("failed to read {len} bytes at {address}: {reason}")]
    MemoryRead
    {
        /// Start of the requested range
        address: Address,
        /// Number of bytes requested
        len: u64,
        /// Host-provided failure status
        reason: String,
    },

    /// A type name did not have the shape its layout requires
    ///
    /// Example: a niche-encoded `enum$<T, min, max, name>` whose bounds are
    /// not integers.
    #[error("malformed type name `{type_name}`: {reason}")]
    InvalidTypeName
    {
        /// The offending type name
        type_name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Decoding descended through more nested values than allowed
    ///
    /// Deep `Rc` chains and reference cycles end here instead of exhausting
    /// the stack.
    #[error("nesting deeper than {limit} levels")]
    NestingTooDeep
    {
        /// The configured limit
        limit: usize,
    },

    /// The host returned no value where one was required
    #[error("value unavailable: {0}")]
    ValueUnavailable(String),

    /// A type-name pattern failed to compile during registration
    #[error("invalid type pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl FormatError
{
    /// Shorthand for [`FormatError::MissingField`].
    pub fn missing(kind: ProviderKind, path: impl Into<String>) -> Self
    {
        FormatError::MissingField { kind, path: path.into() }
    }
}

/// Convenience type alias for `Result<T, FormatError>`
///
/// ```rust
/// use ferros_pretty::error::FormatResult;
/// fn foo() -> FormatResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type FormatResult<T> = std::result::Result<T, FormatError>;

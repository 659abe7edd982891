//! Identity and element views.

use std::fmt;

use super::Address;

/// Stable numeric identity the host assigns to a value handle
///
/// Two handles with the same identity refer to the same value in the same
/// generation, so decoders built for one can serve the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u64);

impl From<u64> for ValueId
{
    fn from(value: u64) -> Self
    {
        ValueId(value)
    }
}

impl fmt::Display for ValueId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "#{}", self.0)
    }
}

/// Host validity epoch
///
/// The host bumps the generation whenever the process runs, because memory
/// behind every value may have changed or been reused. Decoders cached under
/// an older generation must not be consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(pub u64);

impl Generation
{
    /// The generation after this one.
    #[must_use]
    pub const fn next(self) -> Self
    {
        Generation(self.0 + 1)
    }
}

/// Normalised shape of every contiguous container
///
/// `Vec`, `VecDeque`, slices and all string flavours decode into this:
/// a base address, an element type, its size and a logical count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementView<T>
{
    /// Address of element 0 (storage slot 0 for ring buffers)
    pub base: Address,
    /// Element type descriptor
    pub item_type: T,
    /// Element size in bytes
    pub item_size: u64,
    /// Logical number of elements
    pub len: u64,
}

impl<T> ElementView<T>
{
    /// Address of storage slot `index`.
    pub fn element_address(&self, index: u64) -> Address
    {
        self.base.offset(index, self.item_size)
    }

    /// `true` if `index` addresses a live element.
    pub fn contains(&self, index: usize) -> bool
    {
        (index as u64) < self.len
    }
}

//! Memory address type.

use std::fmt;
use std::ops::{Add, Sub};

/// Strongly typed address in the debugged process
///
/// Decoders compute element and bucket addresses from base pointers, so
/// keeping addresses apart from sizes and counts catches a whole class of
/// `base + index` mistakes at compile time.
///
/// ## Example
///
/// ```rust
/// use ferros_pretty::types::Address;
///
/// let base = Address::from(0x1000);
/// assert_eq!(base.offset(3, 4), Address::from(0x100c));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Address of element `index` in an array of `item_size`-byte elements
    /// starting here.
    ///
    /// Wraps on overflow; the result is only ever handed to the host, which
    /// reports the read failure.
    pub fn offset(self, index: u64, item_size: u64) -> Self
    {
        Address(self.0.wrapping_add(index.wrapping_mul(item_size)))
    }

    /// Add an offset to this address, checking for overflow
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}

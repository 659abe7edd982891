//! # Types
//!
//! Host-agnostic types shared by every decoder.
//!
//! These types describe *views* over memory the host owns: where elements
//! live, how big they are, which identity and generation a value belongs to.
//! Nothing here owns process data.

pub mod address;
pub mod view;

// Re-export all public types
pub use address::Address;
pub use view::{ElementView, Generation, ValueId};

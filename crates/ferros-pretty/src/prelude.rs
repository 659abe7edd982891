//! Common module for library exports

pub use crate::error::{FormatError, FormatResult};
pub use crate::formatter::Formatter;
pub use crate::host::Host;
pub use crate::provider::{Provider, ProviderKind};
pub use crate::registry::{FormatterRegistry, MatchKind};
pub use crate::types::{Address, ElementView, Generation, ValueId};

//! # Formatter Registry
//!
//! Maps type names to provider kinds.
//!
//! Registrations are either exact type names or regular expressions. Exact
//! names always win; regexes are tried in registration order. The default
//! table ([`FormatterRegistry::rust`]) covers every standard-library layout
//! this crate knows, including the older `collections::` paths and the
//! `*-windows-msvc` spellings.
//!
//! ## Example
//!
//! ```rust
//! use ferros_pretty::provider::ProviderKind;
//! use ferros_pretty::registry::FormatterRegistry;
//!
//! let registry = FormatterRegistry::rust()?;
//! assert_eq!(registry.lookup("alloc::vec::Vec<u8>"), Some(ProviderKind::Vec));
//! assert_eq!(registry.lookup("std::path::PathBuf"), Some(ProviderKind::PathBuf));
//! # Ok::<(), ferros_pretty::error::FormatError>(())
//! ```

use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, trace};

use crate::error::FormatResult;
use crate::provider::ProviderKind;

/// How a registration matches type names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind
{
    /// Whole type name equals the pattern
    Exact,
    /// Pattern is a regular expression searched in the type name
    Regex,
}

/// Built-in registrations: (pattern, match kind, provider).
const RUST_FORMATTERS: &[(&str, MatchKind, ProviderKind)] = &[
    (r"^\(.*\)$", MatchKind::Regex, ProviderKind::Tuple),
    // *-windows-msvc uses this name since 1.47
    (r"^tuple\$?<.+>$", MatchKind::Regex, ProviderKind::MsvcTuple),
    ("&str", MatchKind::Exact, ProviderKind::Str),
    ("str*", MatchKind::Exact, ProviderKind::Str),
    // *-windows-msvc
    ("str", MatchKind::Exact, ProviderKind::Str),
    ("collections::string::String", MatchKind::Exact, ProviderKind::String),
    ("alloc::string::String", MatchKind::Exact, ProviderKind::String),
    (r"^collections::vec::Vec<.+>$", MatchKind::Regex, ProviderKind::Vec),
    (r"^alloc::vec::Vec<.+>$", MatchKind::Regex, ProviderKind::Vec),
    (r"^collections::vec_deque::VecDeque<.+>$", MatchKind::Regex, ProviderKind::VecDeque),
    (r"^alloc::collections::vec_deque::VecDeque<.+>$", MatchKind::Regex, ProviderKind::VecDeque),
    (r"^enum\$<.+>$", MatchKind::Regex, ProviderKind::Enum),
    (r"^&(mut *)?\[.*\]$", MatchKind::Regex, ProviderKind::Slice),
    (r"^(mut *)?slice\$?<.+>.*$", MatchKind::Regex, ProviderKind::MsvcSlice),
    ("std::ffi::c_str::CString", MatchKind::Exact, ProviderKind::CString),
    (r"^&?std::ffi::c_str::CStr", MatchKind::Regex, ProviderKind::CStr),
    ("std::ffi::os_str::OsString", MatchKind::Exact, ProviderKind::OsString),
    (r"^&?std::ffi::os_str::OsStr", MatchKind::Regex, ProviderKind::OsStr),
    ("std::path::PathBuf", MatchKind::Exact, ProviderKind::PathBuf),
    (r"^&?std::path::Path", MatchKind::Regex, ProviderKind::Path),
    (r"^alloc::rc::Rc<.+>$", MatchKind::Regex, ProviderKind::Rc),
    (r"^alloc::rc::Weak<.+>$", MatchKind::Regex, ProviderKind::Rc),
    (r"^alloc::(sync|arc)::Arc<.+>$", MatchKind::Regex, ProviderKind::Arc),
    (r"^alloc::(sync|arc)::Weak<.+>$", MatchKind::Regex, ProviderKind::Arc),
    (r"^std::sync::mutex::Mutex<.+>$", MatchKind::Regex, ProviderKind::Mutex),
    (r"^core::cell::Cell<.+>$", MatchKind::Regex, ProviderKind::Cell),
    (r"^(core::cell|debug_cell)::RefCell<.+>$", MatchKind::Regex, ProviderKind::RefCell),
    (r"^(core::cell|debug_cell)::Ref(Mut)?<.+>$", MatchKind::Regex, ProviderKind::RefBorrow),
    (r"^std::collections::hash::map::HashMap<.+>$", MatchKind::Regex, ProviderKind::HashMap),
    (r"^std::collections::hash::set::HashSet<.+>$", MatchKind::Regex, ProviderKind::HashSet),
    (r"^core::option::Option<.+>(::\w+)?$", MatchKind::Regex, ProviderKind::Enum),
    (r"^core::result::Result<.+>(::\w+)?$", MatchKind::Regex, ProviderKind::Enum),
    (r"^alloc::borrow::Cow<.+>(::\w+)?$", MatchKind::Regex, ProviderKind::Enum),
];

/// Type-name → provider table for one category
///
/// A category can be disabled as a whole, in which case every lookup misses
/// and the host falls back to raw display.
#[derive(Debug, Clone)]
pub struct FormatterRegistry
{
    category: String,
    enabled: bool,
    exact: HashMap<String, ProviderKind>,
    patterns: Vec<(Regex, ProviderKind)>,
}

impl FormatterRegistry
{
    /// Empty, enabled category.
    #[must_use]
    pub fn new(category: impl Into<String>) -> Self
    {
        Self {
            category: category.into(),
            enabled: true,
            exact: HashMap::new(),
            patterns: Vec::new(),
        }
    }

    /// The built-in Rust table under the `Rust` category.
    ///
    /// ## Errors
    ///
    /// Only if a built-in pattern fails to compile.
    pub fn rust() -> FormatResult<Self>
    {
        Self::rust_in("Rust")
    }

    /// The built-in Rust table under a custom category name.
    ///
    /// ## Errors
    ///
    /// Only if a built-in pattern fails to compile.
    pub fn rust_in(category: impl Into<String>) -> FormatResult<Self>
    {
        let mut registry = Self::new(category);
        for &(pattern, match_kind, kind) in RUST_FORMATTERS {
            registry.register(pattern, match_kind, kind)?;
        }
        debug!(category = %registry.category, registrations = registry.len(), "registered rust formatters");
        Ok(registry)
    }

    /// Register `kind` for type names matching `pattern`.
    ///
    /// Registering the same exact name twice replaces the earlier entry.
    ///
    /// ## Errors
    ///
    /// [`crate::FormatError::InvalidPattern`] if a regex pattern does not compile.
    pub fn register(&mut self, pattern: &str, match_kind: MatchKind, kind: ProviderKind) -> FormatResult<()>
    {
        match match_kind {
            MatchKind::Exact => {
                self.exact.insert(pattern.to_string(), kind);
            }
            MatchKind::Regex => {
                self.patterns.push((Regex::new(pattern)?, kind));
            }
        }
        Ok(())
    }

    /// Provider for `type_name`, exact registrations first.
    pub fn lookup(&self, type_name: &str) -> Option<ProviderKind>
    {
        if !self.enabled {
            return None;
        }
        if let Some(kind) = self.exact.get(type_name) {
            trace!(type_name, %kind, "exact formatter match");
            return Some(*kind);
        }
        let found = self
            .patterns
            .iter()
            .find(|(regex, _)| regex.is_match(type_name))
            .map(|(_, kind)| *kind);
        if let Some(kind) = found {
            trace!(type_name, %kind, "regex formatter match");
        }
        found
    }

    /// Category name.
    pub fn category(&self) -> &str
    {
        &self.category
    }

    /// Turn the whole category on or off.
    pub fn set_enabled(&mut self, enabled: bool)
    {
        self.enabled = enabled;
    }

    /// Whether lookups can match.
    pub fn is_enabled(&self) -> bool
    {
        self.enabled
    }

    /// Number of registrations.
    pub fn len(&self) -> usize
    {
        self.exact.len() + self.patterns.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}

//! # Formatter Configuration
//!
//! Display limits and dispatch options.
//!
//! Defaults match what the formatters have always used; every limit can be
//! overridden from the environment so a user can widen a preview without
//! rebuilding the extension.
//!
//! ## Environment Variables
//!
//! - `FERROS_PRETTY_STRING_LIMIT`: maximum bytes decoded for a string summary (default: 1000)
//! - `FERROS_PRETTY_PREVIEW_CHARS`: characters of element preview in container summaries (default: 32)
//! - `FERROS_PRETTY_CASCADE`: `true`/`false`, render nested values through their decoders (default: true)
//! - `FERROS_PRETTY_MAX_DEPTH`: nested values followed from one query (default: 64)
//! - `FERROS_PRETTY_MAX_CHILDREN`: children materialized by one `children` call (default: 100000)

use std::env;

use once_cell::sync::Lazy;
use tracing::warn;

/// Default cap on string bytes decoded for a summary.
pub const DEFAULT_MAX_STRING_BYTES: u64 = 1000;
/// Default preview length of sequence summaries.
pub const DEFAULT_PREVIEW_CHARS: usize = 32;
/// Default descent limit when chasing niche discriminants.
pub const DEFAULT_MAX_ENUM_DEPTH: usize = 20;
/// Default cap on hash-table control bytes scanned.
pub const DEFAULT_MAX_TABLE_BUCKETS: u64 = 1 << 24;
/// Default limit on nested values followed from one query.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;
/// Default cap on children collected by one `children` call.
pub const DEFAULT_MAX_CHILDREN: usize = 100_000;

static ENV_CONFIG: Lazy<FormatterConfig> = Lazy::new(FormatterConfig::from_env);

/// Limits and options shared by every decoder of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterConfig
{
    /// Hard cap on bytes read for a string summary
    ///
    /// Protects against uninitialized values whose length field is garbage.
    pub max_string_bytes: u64,
    /// Accumulated length after which a sequence preview is cut with `, ...`
    pub preview_chars: usize,
    /// Maximum struct nesting followed to reach a niche discriminant
    pub max_enum_depth: usize,
    /// Maximum control bytes scanned in one hash table
    pub max_table_buckets: u64,
    /// Maximum nested values (summaries, forwarded pointers) followed from one query
    pub max_nesting_depth: usize,
    /// Maximum children collected by [`crate::Formatter::children`]
    ///
    /// A garbage length field otherwise asks for billions of handles.
    pub max_children: usize,
    /// Render nested values through their own decoders instead of raw values
    pub cascade: bool,
    /// Category the formatters are registered under
    pub category: String,
}

impl Default for FormatterConfig
{
    fn default() -> Self
    {
        Self {
            max_string_bytes: DEFAULT_MAX_STRING_BYTES,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            max_enum_depth: DEFAULT_MAX_ENUM_DEPTH,
            max_table_buckets: DEFAULT_MAX_TABLE_BUCKETS,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_children: DEFAULT_MAX_CHILDREN,
            cascade: true,
            category: "Rust".to_string(),
        }
    }
}

impl FormatterConfig
{
    /// Defaults with environment overrides applied.
    ///
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self
    {
        let mut config = Self::default();
        if let Some(limit) = env_value::<u64>("FERROS_PRETTY_STRING_LIMIT") {
            config.max_string_bytes = limit;
        }
        if let Some(chars) = env_value::<usize>("FERROS_PRETTY_PREVIEW_CHARS") {
            config.preview_chars = chars;
        }
        if let Some(depth) = env_value::<usize>("FERROS_PRETTY_MAX_DEPTH") {
            config.max_nesting_depth = depth;
        }
        if let Some(children) = env_value::<usize>("FERROS_PRETTY_MAX_CHILDREN") {
            config.max_children = children;
        }
        if let Some(cascade) = env::var("FERROS_PRETTY_CASCADE").ok().and_then(|raw| parse_flag(&raw)) {
            config.cascade = cascade;
        }
        config
    }

    /// Process-wide configuration read from the environment once.
    pub fn global() -> &'static FormatterConfig
    {
        &ENV_CONFIG
    }

    /// Set the string byte cap.
    #[must_use]
    pub fn with_max_string_bytes(mut self, limit: u64) -> Self
    {
        self.max_string_bytes = limit;
        self
    }

    /// Set the sequence preview length.
    #[must_use]
    pub fn with_preview_chars(mut self, chars: usize) -> Self
    {
        self.preview_chars = chars;
        self
    }

    /// Enable or disable cascading into nested decoders.
    #[must_use]
    pub fn with_cascade(mut self, cascade: bool) -> Self
    {
        self.cascade = cascade;
        self
    }

    /// Set the nesting limit.
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self
    {
        self.max_nesting_depth = depth;
        self
    }

    /// Set the cap on collected children.
    #[must_use]
    pub fn with_max_children(mut self, children: usize) -> Self
    {
        self.max_children = children;
        self
    }

    /// Set the control-byte scan cap.
    #[must_use]
    pub fn with_max_table_buckets(mut self, buckets: u64) -> Self
    {
        self.max_table_buckets = buckets;
        self
    }
}

fn env_value<T: std::str::FromStr>(name: &str) -> Option<T>
{
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring unparseable configuration value");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool>
{
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!(value = raw, "ignoring unparseable flag");
            None
        }
    }
}

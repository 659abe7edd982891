//! # ferros-pretty
//!
//! Rust value formatters for native debuggers.
//!
//! A native debugger sees a `Vec<String>` as a struct of raw pointers and
//! capacities. This crate teaches it the Rust view: synthetic children (the
//! elements, the map entries, the active enum variant's fields) and one-line
//! summaries such as `(2) vec!["a", "b"]` or `(refs:2, weak:0) Some(5)`.
//!
//! ## Layers
//!
//! - [`host`]: the reflection API consumed from the debugger, plus an
//!   in-memory implementation
//! - [`registry`]: type-name patterns → [`ProviderKind`]
//! - [`providers`]: one decoder per type family, robust to the layout changes
//!   of past standard library versions
//! - [`formatter`]: the per-session dispatcher and decoder cache
//! - [`extension`]: debugger load-time initialization
//!
//! ## Example
//!
//! ```rust
//! use ferros_pretty::host::memory::MemoryHost;
//! use ferros_pretty::{Formatter, FormatterRegistry};
//!
//! let mut host = MemoryHost::new();
//! let u32_ty = host.primitive("u32").expect("registered");
//! let pair = host.define_struct("(u32, u32)", &[("__0", u32_ty), ("__1", u32_ty)]);
//! let value = host.allocate_value("pair", pair);
//! host.set_field(&value, "__0", 1)?;
//! host.set_field(&value, "__1", 2)?;
//!
//! let registry = FormatterRegistry::rust()?;
//! let formatter = Formatter::new(&host, &registry);
//! assert_eq!(formatter.summary(&value)?.as_deref(), Some("(1, 2)"));
//! # Ok::<(), ferros_pretty::FormatError>(())
//! ```

pub mod access;
pub mod cache;
pub mod config;
pub mod error;
pub mod extension;
pub mod formatter;
pub mod host;
pub mod prelude;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod summary;
pub mod types;

pub use config::FormatterConfig;
pub use error::{FormatError, FormatResult};
pub use formatter::Formatter;
pub use host::Host;
pub use provider::ProviderKind;
pub use registry::FormatterRegistry;

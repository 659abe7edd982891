//! # Formatter Session
//!
//! Routes "format this value" requests to the right decoder.
//!
//! A [`Formatter`] binds a [`Host`], a [`FormatterRegistry`] and a
//! [`FormatterConfig`]. It answers the synthetic-children and summary
//! queries for *any* value: values whose type name is registered go through
//! their (cached) decoder, everything else falls back to the host's raw view.
//! Decoders use the same entry points for nested values, so formatting
//! cascades through nested structures, up to
//! [`FormatterConfig::max_nesting_depth`] levels below the outermost query.
//!
//! ## Usage
//!
//! ```rust
//! use ferros_pretty::host::Host;
//! use ferros_pretty::{FormatResult, Formatter, FormatterRegistry};
//!
//! fn show<H: Host>(host: &H, value: &H::Value) -> FormatResult<()>
//! {
//!     let registry = FormatterRegistry::rust()?;
//!     let formatter = Formatter::new(host, &registry);
//!     if let Some(summary) = formatter.summary(value)? {
//!         println!("{summary}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Failures
//!
//! Every failing query is logged with the provider kind, value identity and
//! type name, then returned to the caller. Nested summaries are the one
//! exception: a child that cannot be summarised renders through its scalar
//! value or a placeholder, like a host would render it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, error};

use crate::cache::DecoderCache;
use crate::config::FormatterConfig;
use crate::error::{FormatError, FormatResult};
use crate::host::Host;
use crate::provider::{Decoder, Provider, ProviderKind};
use crate::registry::FormatterRegistry;

/// Decoding session over one host
pub struct Formatter<'a, H: Host>
{
    host: &'a H,
    registry: &'a FormatterRegistry,
    config: FormatterConfig,
    cache: RefCell<DecoderCache<H>>,
    /// Nested values currently being followed
    depth: Cell<usize>,
}

impl<'a, H: Host> Formatter<'a, H>
{
    /// Session with the environment-derived configuration.
    pub fn new(host: &'a H, registry: &'a FormatterRegistry) -> Self
    {
        Self::with_config(host, registry, FormatterConfig::global().clone())
    }

    /// Session with an explicit configuration.
    pub fn with_config(host: &'a H, registry: &'a FormatterRegistry, config: FormatterConfig) -> Self
    {
        Self {
            host,
            registry,
            config,
            cache: RefCell::new(DecoderCache::new()),
            depth: Cell::new(0),
        }
    }

    /// The host this session reads through.
    pub fn host(&self) -> &'a H
    {
        self.host
    }

    /// The registry this session dispatches with.
    pub fn registry(&self) -> &'a FormatterRegistry
    {
        self.registry
    }

    /// Active limits.
    pub fn config(&self) -> &FormatterConfig
    {
        &self.config
    }

    /// Number of decoders cached for the current generation.
    pub fn cached_decoders(&self) -> usize
    {
        self.cache.borrow().len()
    }

    /// Provider kind registered for the value's type, if any.
    pub fn provider_kind(&self, value: &H::Value) -> Option<ProviderKind>
    {
        self.registry.lookup(&self.host.type_name(value))
    }

    /// Decoder for `value`, built on first use and cached per identity.
    ///
    /// `Ok(None)` means no formatter is registered for the value's type.
    ///
    /// ## Errors
    ///
    /// Propagates (and logs) decoder initialization failures.
    pub fn decoder(&self, value: &H::Value) -> FormatResult<Option<Rc<Decoder<H>>>>
    {
        let Some(kind) = self.provider_kind(value) else {
            return Ok(None);
        };
        let id = self.host.value_id(value);
        let generation = self.host.generation();
        if let Some(cached) = self.cache.borrow_mut().get(id, generation, kind) {
            return Ok(Some(cached));
        }

        // Initialization may format nested values, which re-enters the cache.
        let decoder = Rc::new(
            Decoder::initialize(kind, self, value).inspect_err(|err| self.log_failure("initialize", kind, value, err))?,
        );
        self.cache
            .borrow_mut()
            .insert(id, generation, kind, Rc::clone(&decoder));
        Ok(Some(decoder))
    }

    /// Whether the value should be shown as expandable.
    ///
    /// ## Errors
    ///
    /// Decoder failures, logged.
    pub fn has_children(&self, value: &H::Value) -> FormatResult<bool>
    {
        match self.decoder(value)? {
            Some(decoder) => self.query("has_children", value, &decoder, |d| d.has_children(self)),
            None => Ok(self.host.num_children(value) > 0),
        }
    }

    /// Number of (synthetic) children.
    ///
    /// ## Errors
    ///
    /// Decoder failures, logged.
    pub fn child_count(&self, value: &H::Value) -> FormatResult<usize>
    {
        match self.decoder(value)? {
            Some(decoder) => self.query("child_count", value, &decoder, |d| d.child_count(self)),
            None => Ok(self.host.num_children(value)),
        }
    }

    /// Child `index`, or `Ok(None)` when out of range.
    ///
    /// ## Errors
    ///
    /// Decoder failures, logged.
    pub fn child_at(&self, value: &H::Value, index: usize) -> FormatResult<Option<H::Value>>
    {
        match self.decoder(value)? {
            Some(decoder) => self.query("child_at", value, &decoder, |d| d.child_at(self, index)),
            None => Ok(self.host.child_at(value, index)),
        }
    }

    /// Index of the child displayed as `name`.
    ///
    /// ## Errors
    ///
    /// Decoder failures, logged.
    pub fn child_index_of(&self, value: &H::Value, name: &str) -> FormatResult<Option<usize>>
    {
        match self.decoder(value)? {
            Some(decoder) => self.query("child_index_of", value, &decoder, |d| d.child_index_of(self, name)),
            None => Ok(self.host.index_of_child(value, name)),
        }
    }

    /// All children, in order.
    ///
    /// ## Errors
    ///
    /// Decoder failures, logged.
    pub fn children(&self, value: &H::Value) -> FormatResult<Vec<H::Value>>
    {
        let reported = self.child_count(value)?;
        let count = reported.min(self.config.max_children);
        if count < reported {
            debug!(reported, limit = self.config.max_children, "child list truncated");
        }
        let mut children = Vec::with_capacity(count.min(1024));
        for index in 0..count {
            if let Some(child) = self.child_at(value, index)? {
                children.push(child);
            }
        }
        Ok(children)
    }

    /// One-line summary, or `Ok(None)` when no summary is available.
    ///
    /// ## Errors
    ///
    /// Decoder failures, logged.
    pub fn summary(&self, value: &H::Value) -> FormatResult<Option<String>>
    {
        match self.decoder(value)? {
            Some(decoder) => self.query("summary", value, &decoder, |d| d.summary(self)),
            None => Ok(self.host.host_summary(value)),
        }
    }

    /// Type name to show for the value.
    ///
    /// ## Errors
    ///
    /// Decoder failures, logged.
    pub fn display_type_name(&self, value: &H::Value) -> FormatResult<String>
    {
        let decoded = self.decoder(value)?.and_then(|decoder| decoder.display_type_name());
        Ok(decoded.unwrap_or_else(|| self.host.type_name(value)))
    }

    /// Summary of a value nested inside another one.
    ///
    /// Honours [`FormatterConfig::cascade`]: without cascading, nested values
    /// only get the host's own summary. Failures were already logged and
    /// degrade to `None`, and so does nesting past the depth limit.
    pub fn nested_summary(&self, value: &H::Value) -> Option<String>
    {
        if !self.config.cascade {
            return self.host.host_summary(value);
        }
        self.descend(|| self.summary(value)).ok().flatten()
    }

    /// Run `step` one nesting level deeper.
    ///
    /// Decoders wrap every query they make on a nested value in this, so a
    /// long `Rc` chain or a reference cycle stops at the configured depth.
    ///
    /// ## Errors
    ///
    /// [`FormatError::NestingTooDeep`] past
    /// [`FormatterConfig::max_nesting_depth`], otherwise whatever `step`
    /// returns.
    pub fn descend<T>(&self, step: impl FnOnce() -> FormatResult<T>) -> FormatResult<T>
    {
        let depth = self.depth.get();
        let limit = self.config.max_nesting_depth;
        if depth >= limit {
            debug!(limit, "nesting limit reached");
            return Err(FormatError::NestingTooDeep { limit });
        }
        self.depth.set(depth + 1);
        let result = step();
        self.depth.set(depth);
        result
    }

    fn query<T>(
        &self,
        operation: &str,
        value: &H::Value,
        decoder: &Decoder<H>,
        run: impl FnOnce(&Decoder<H>) -> FormatResult<T>,
    ) -> FormatResult<T>
    {
        run(decoder).inspect_err(|err| {
            if let Some(kind) = self.provider_kind(value) {
                self.log_failure(operation, kind, value, err);
            }
        })
    }

    fn log_failure(&self, operation: &str, kind: ProviderKind, value: &H::Value, err: &FormatError)
    {
        error!(
            operation,
            %kind,
            id = %self.host.value_id(value),
            type_name = %self.host.type_name(value),
            %err,
            "formatter query failed"
        );
    }
}

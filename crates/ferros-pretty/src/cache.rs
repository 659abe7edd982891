//! # Decoder Cache
//!
//! Decoders keyed by value identity, stamped with the host generation.
//!
//! The host asks for structure and for a summary through two separate
//! request paths; both land here so a value is decoded once. Entries never
//! outlive their generation: the first lookup under a newer generation
//! evicts everything older, because the memory behind those values may have
//! been reused.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::host::Host;
use crate::provider::{Decoder, ProviderKind};
use crate::types::{Generation, ValueId};

struct CacheEntry<H: Host>
{
    kind: ProviderKind,
    decoder: Rc<Decoder<H>>,
}

/// Generation-stamped arena of decoder instances
///
/// ## Thread Safety
///
/// Not thread-safe; the formatter keeps it behind a `RefCell`.
pub struct DecoderCache<H: Host>
{
    generation: Generation,
    entries: HashMap<ValueId, CacheEntry<H>>,
}

impl<H: Host> Default for DecoderCache<H>
{
    fn default() -> Self
    {
        Self {
            generation: Generation::default(),
            entries: HashMap::new(),
        }
    }
}

impl<H: Host> DecoderCache<H>
{
    /// Empty cache at generation 0.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Decoder cached for `id`, if it was built as `kind` in `generation`.
    pub fn get(&mut self, id: ValueId, generation: Generation, kind: ProviderKind) -> Option<Rc<Decoder<H>>>
    {
        self.advance(generation);
        let entry = self.entries.get(&id)?;
        if entry.kind != kind {
            return None;
        }
        trace!(%id, %kind, "decoder cache hit");
        Some(Rc::clone(&entry.decoder))
    }

    /// Remember `decoder` for `id` in `generation`.
    pub fn insert(&mut self, id: ValueId, generation: Generation, kind: ProviderKind, decoder: Rc<Decoder<H>>)
    {
        self.advance(generation);
        if generation == self.generation {
            self.entries.insert(id, CacheEntry { kind, decoder });
        }
    }

    /// Drop entries older than `generation`.
    ///
    /// Lookups call this implicitly; hosts with a resume callback may call it
    /// eagerly to release memory sooner.
    pub fn advance(&mut self, generation: Generation)
    {
        if generation > self.generation {
            trace!(from = self.generation.0, to = generation.0, evicted = self.entries.len(), "decoder cache generation advanced");
            self.entries.clear();
            self.generation = generation;
        }
    }

    /// Generation the live entries belong to.
    pub fn generation(&self) -> Generation
    {
        self.generation
    }

    /// Number of live entries.
    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    /// `true` if nothing is cached.
    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    /// Forget every entry.
    pub fn clear(&mut self)
    {
        self.entries.clear();
    }
}

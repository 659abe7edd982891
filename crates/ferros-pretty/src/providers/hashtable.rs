//! # Hash Table Providers
//!
//! `HashMap<K, V>` and `HashSet<T>`, both backed by a hashbrown `RawTable`.
//!
//! A `RawTable` keeps `bucket_mask + 1` buckets and one control byte per
//! bucket. A bucket is occupied when its control byte has the top bit clear.
//! Where the buckets live changed over time:
//!
//! | layout | bucket storage |
//! |---|---|
//! | [`TableLayout::Reversed`] | just below `ctrl`, bucket `i` paired with control byte `n - 1 - i` |
//! | [`TableLayout::Forward`] | behind a separate `data` pointer, in control-byte order |
//!
//! The occupied list is built once, in control-byte scan order, so child
//! order is stable across queries.

use tracing::{debug, warn};

use crate::access::{child_path, first_path, parse_child_index, pointer_address, read_unique_ptr, read_usize, template_params};
use crate::error::{FormatError, FormatResult};
use crate::formatter::Formatter;
use crate::host::Host;
use crate::provider::{Provider, ProviderKind};
use crate::types::{Address, ElementView};

/// Control byte bit marking an empty or deleted bucket.
const CTRL_EMPTY_BIT: u8 = 0x80;

/// Where a table keeps its buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout
{
    /// Buckets end at the control bytes, in reverse order (hashbrown 0.2+)
    Reversed,
    /// Buckets behind `data`, in forward order (std 1.36 until hashbrown 0.2)
    Forward,
}

/// Paths to the `RawTable` of a `HashSet`, newest first.
const SET_TABLE_PATHS: &[&[&str]] = &[&["base", "map", "table"], &["map", "base", "table"]];

/// Paths to the `RawTable` of a `HashMap`.
const MAP_TABLE_PATHS: &[&[&str]] = &[&["base", "table"]];

/// `true` if the control byte marks an occupied bucket.
pub fn is_occupied(ctrl: u8) -> bool
{
    ctrl & CTRL_EMPTY_BIT == 0
}

/// Logical bucket indices of the occupied slots, in scan order.
///
/// ```rust
/// use ferros_pretty::providers::hashtable::{occupied_buckets, TableLayout};
///
/// let ctrl = [0x11, 0xff, 0x80, 0x22];
/// assert_eq!(occupied_buckets(&ctrl, TableLayout::Forward), [0, 3]);
/// assert_eq!(occupied_buckets(&ctrl, TableLayout::Reversed), [3, 0]);
/// ```
pub fn occupied_buckets(ctrl: &[u8], layout: TableLayout) -> Vec<u64>
{
    let count = ctrl.len() as u64;
    ctrl.iter()
        .zip(0u64..)
        .filter(|(byte, _)| is_occupied(**byte))
        .map(|(_, slot)| match layout {
            TableLayout::Reversed => count - 1 - slot,
            TableLayout::Forward => slot,
        })
        .collect()
}

/// Decoder for `HashMap` and `HashSet`
#[derive(Debug)]
pub struct HashTableProvider<H: Host>
{
    kind: ProviderKind,
    layout: TableLayout,
    /// Scanned buckets; `len` is below `capacity` only when the scan was capped
    buckets: ElementView<H::Type>,
    /// `bucket_mask + 1`
    capacity: u64,
    occupied: Vec<u64>,
}

impl<H: Host> HashTableProvider<H>
{
    /// Locate the table, probe its layout and scan the control bytes.
    ///
    /// ## Errors
    ///
    /// - [`FormatError::MissingField`] when the table or its fields are absent
    /// - [`FormatError::MemoryRead`] when the control bytes are unreadable
    pub fn new(kind: ProviderKind, fmt: &Formatter<'_, H>, value: &H::Value) -> FormatResult<Self>
    {
        let host = fmt.host();
        let paths = if kind == ProviderKind::HashSet { SET_TABLE_PATHS } else { MAP_TABLE_PATHS };
        let table = first_path(host, value, paths).ok_or_else(|| FormatError::missing(kind, "base.table"))?;
        let item_type = item_type(host, kind, &table)?;
        let item_size = host
            .type_size(&item_type)
            .ok_or_else(|| FormatError::missing(kind, "item size"))?;

        let (layout, raw) = if let Some(inner) = host.child_by_name(&table, "table") {
            (TableLayout::Reversed, inner)
        } else if host.child_by_name(&table, "data").is_none() {
            (TableLayout::Reversed, table)
        } else {
            (TableLayout::Forward, table)
        };

        let bucket_mask = host
            .child_by_name(&raw, "bucket_mask")
            .and_then(|mask| read_usize(host, &mask))
            .ok_or_else(|| FormatError::missing(kind, "bucket_mask"))?;
        let capacity = bucket_mask.saturating_add(1);
        let limit = fmt.config().max_table_buckets;
        let num_buckets = capacity.min(limit);
        if num_buckets < capacity {
            warn!(%kind, capacity, limit, "bucket count exceeds scan limit, truncating");
        }

        let ctrl = child_path(host, &raw, &["ctrl", "pointer"])
            .and_then(|pointer| pointer_address(host, &pointer))
            .ok_or_else(|| FormatError::missing(kind, "ctrl.pointer"))?;
        let ctrl_bytes = host.read_memory(ctrl, num_buckets)?;

        let base = match layout {
            TableLayout::Reversed => ctrl - item_size.wrapping_mul(num_buckets),
            TableLayout::Forward => host
                .child_by_name(&raw, "data")
                .and_then(|data| read_unique_ptr(host, &data))
                .and_then(|pointer| pointer_address(host, &pointer))
                .ok_or_else(|| FormatError::missing(kind, "data.pointer"))?,
        };
        let occupied = occupied_buckets(&ctrl_bytes, layout);
        debug!(%kind, ?layout, capacity, num_buckets, size = occupied.len(), "hash table scanned");

        Ok(Self {
            kind,
            layout,
            buckets: ElementView {
                base,
                item_type,
                item_size,
                len: num_buckets,
            },
            capacity,
            occupied,
        })
    }

    /// Which bucket layout the table uses.
    pub fn layout(&self) -> TableLayout
    {
        self.layout
    }

    /// Bucket count of the table, scanned or not.
    pub fn capacity(&self) -> u64
    {
        self.capacity
    }

    /// Number of buckets scanned.
    pub fn scanned(&self) -> u64
    {
        self.buckets.len
    }

    /// Address of the bucket behind occupied entry `index`.
    pub fn bucket_address(&self, index: usize) -> Option<Address>
    {
        self.occupied
            .get(index)
            .map(|bucket| self.buckets.element_address(*bucket))
    }
}

/// Element type of the table's buckets.
///
/// Template arguments are missing on `*-windows-msvc`, so the item type is
/// looked up by the name spelled in `RawTable<ITEM>`.
fn item_type<H: Host>(host: &H, kind: ProviderKind, table: &H::Value) -> FormatResult<H::Type>
{
    let table_type = host.type_of(table);
    let item = match host.template_argument(&table_type, 0) {
        Some(item) => item,
        None => {
            let table_name = host.type_display_name(&table_type);
            let params = template_params(&table_name);
            params
                .first()
                .and_then(|name| host.find_type(name))
                .ok_or_else(|| FormatError::missing(kind, format!("item type of `{table_name}`")))?
        }
    };
    Ok(host.canonical_type(&item))
}

impl<H: Host> Provider<H> for HashTableProvider<H>
{
    fn has_children(&self, _fmt: &Formatter<'_, H>) -> FormatResult<bool>
    {
        Ok(true)
    }

    fn child_count(&self, _fmt: &Formatter<'_, H>) -> FormatResult<usize>
    {
        Ok(self.occupied.len())
    }

    fn child_at(&self, fmt: &Formatter<'_, H>, index: usize) -> FormatResult<Option<H::Value>>
    {
        let host = fmt.host();
        let Some(address) = self.bucket_address(index) else {
            return Ok(None);
        };
        let name = format!("[{index}]");
        let Some(item) = host.value_at_address(&name, address, &self.buckets.item_type) else {
            return Ok(None);
        };
        if self.kind != ProviderKind::HashSet {
            return Ok(Some(item));
        }
        // sets store `(T, ())`
        Ok(host
            .child_at(&item, 0)
            .and_then(|key| host.child_at_offset(&key, &name, 0, &host.type_of(&key))))
    }

    fn child_index_of(&self, _fmt: &Formatter<'_, H>, name: &str) -> FormatResult<Option<usize>>
    {
        Ok(parse_child_index(name))
    }

    fn summary(&self, _fmt: &Formatter<'_, H>) -> FormatResult<Option<String>>
    {
        Ok(Some(format!("size={}, capacity={}", self.occupied.len(), self.capacity())))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_occupancy_bit()
    {
        assert!(is_occupied(0x00));
        assert!(is_occupied(0x7f));
        assert!(!is_occupied(0x80));
        assert!(!is_occupied(0xff));
    }

    #[test]
    fn test_occupied_buckets_forward()
    {
        let ctrl = [0xff, 0x12, 0xff, 0x34];
        assert_eq!(occupied_buckets(&ctrl, TableLayout::Forward), [1, 3]);
    }

    #[test]
    fn test_occupied_buckets_reversed()
    {
        let ctrl = [0xff, 0x12, 0xff, 0x34];
        assert_eq!(occupied_buckets(&ctrl, TableLayout::Reversed), [2, 0]);
    }

    #[test]
    fn test_occupied_buckets_empty()
    {
        assert!(occupied_buckets(&[], TableLayout::Reversed).is_empty());
        assert!(occupied_buckets(&[0xff; 8], TableLayout::Forward).is_empty());
    }
}

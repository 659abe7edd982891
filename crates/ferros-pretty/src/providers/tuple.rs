//! Tuple providers.
//!
//! Native tuples keep their raw children and only gain a `(a, b)` summary.
//! `tuple$<A, B>` on `*-windows-msvc` names its fields `__0`, `__1`; those are
//! re-exposed as `0`, `1` and the type is shown as `(A, B)`.

use crate::access::{parse_child_index, template_params};
use crate::error::FormatResult;
use crate::formatter::Formatter;
use crate::host::Host;
use crate::provider::{Provider, ProviderKind};
use crate::summary::tuple_summary;

/// Decoder for `(A, B, ...)` and `tuple$<A, B, ...>`
#[derive(Debug)]
pub struct TupleProvider<H: Host>
{
    value: H::Value,
    display_type: Option<String>,
}

impl<H: Host> TupleProvider<H>
{
    /// Wrap a tuple value; `MsvcTuple` values also get a `(A, B)` display type.
    pub fn new(kind: ProviderKind, fmt: &Formatter<'_, H>, value: &H::Value) -> Self
    {
        let display_type = (kind == ProviderKind::MsvcTuple)
            .then(|| format!("({})", template_params(&fmt.host().type_name(value)).join(", ")));
        Self {
            value: value.clone(),
            display_type,
        }
    }

    fn renames_fields(&self) -> bool
    {
        self.display_type.is_some()
    }
}

impl<H: Host> Provider<H> for TupleProvider<H>
{
    fn has_children(&self, fmt: &Formatter<'_, H>) -> FormatResult<bool>
    {
        Ok(fmt.host().num_children(&self.value) > 0)
    }

    fn child_count(&self, fmt: &Formatter<'_, H>) -> FormatResult<usize>
    {
        Ok(fmt.host().num_children(&self.value))
    }

    fn child_at(&self, fmt: &Formatter<'_, H>, index: usize) -> FormatResult<Option<H::Value>>
    {
        let host = fmt.host();
        let Some(field) = host.child_at(&self.value, index) else {
            return Ok(None);
        };
        if self.renames_fields() {
            return Ok(host.child_at_offset(&field, &index.to_string(), 0, &host.type_of(&field)));
        }
        Ok(Some(field))
    }

    fn child_index_of(&self, fmt: &Formatter<'_, H>, name: &str) -> FormatResult<Option<usize>>
    {
        if self.renames_fields() {
            return Ok(parse_child_index(name));
        }
        Ok(fmt.host().index_of_child(&self.value, name))
    }

    fn summary(&self, fmt: &Formatter<'_, H>) -> FormatResult<Option<String>>
    {
        Ok(Some(tuple_summary(fmt, &self.value, 0)))
    }

    fn display_type_name(&self) -> Option<String>
    {
        self.display_type.clone()
    }
}

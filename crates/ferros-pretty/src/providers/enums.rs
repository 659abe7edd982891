//! # Sum-Type Providers
//!
//! Enum values reach the debugger in one of several encodings, depending on
//! the compiler version and the target's debug-info format:
//!
//! - **Template-encoded** (`*-windows-msvc`): the type is named
//!   `enum$<T>` with a `discriminant` field and `variant0`, `variant1`, ...
//!   members, or `enum$<T, min, max, name>` for niche-optimized enums with a
//!   `dataful_variant` member.
//! - **Legacy sentinels**: the first field is named `RUST$ENCODED$ENUM$...`
//!   (niche-optimized) or `RUST$ENUM$DISR` (explicit tag).
//! - **Dynamic type name**: the debugger already resolved the variant, and
//!   the type name ends with it (`core::option::Option<i32>::Some`).
//!
//! The layout is probed in that order. Whatever the encoding, the result is a
//! variant name plus an optional payload whose fields become the children.

use tracing::debug;

use crate::access::{last_path_segment, parse_child_index, template_params};
use crate::error::{FormatError, FormatResult};
use crate::formatter::Formatter;
use crate::host::Host;
use crate::provider::{Provider, ProviderKind};
use crate::summary::tuple_summary;

/// First-field prefix of a niche-optimized legacy enum.
pub const ENCODED_ENUM_PREFIX: &str = "RUST$ENCODED$ENUM$";

/// First-field name of an explicitly tagged legacy enum.
pub const ENUM_DISCRIMINANT: &str = "RUST$ENUM$DISR";

/// Encoding an enum value was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumLayout
{
    /// `enum$<T>`: `discriminant` selects `variant{N}`
    Template,
    /// `enum$<T, min, max, name>`: discriminant range selects the dataful variant
    NicheTemplate,
    /// `RUST$ENCODED$ENUM$i$j$Null`: nested field zero means the null variant
    LegacyNiche,
    /// `RUST$ENUM$DISR` followed by the payload fields
    LegacyTagged,
    /// Variant taken from the dynamic type name
    DynamicName,
}

/// Decoder for sum types
#[derive(Debug)]
pub struct EnumProvider<H: Host>
{
    layout: EnumLayout,
    variant: String,
    payload: Option<H::Value>,
    /// Payload fields hidden from the children (the legacy tag)
    skip: usize,
    /// Fields are `0`/`__0`, ... rather than named
    positional: bool,
    display_type: Option<String>,
}

/// Facts every layout decoder produces
struct Decoded<V>
{
    layout: EnumLayout,
    variant: String,
    payload: Option<V>,
    skip: usize,
    display_type: Option<String>,
}

impl<H: Host> EnumProvider<H>
{
    /// Probe the encoding and decode the active variant.
    ///
    /// ## Errors
    ///
    /// - [`FormatError::InvalidTypeName`] for malformed `enum$<...>` names or
    ///   sentinel fields
    /// - [`FormatError::MissingField`] when a tag field is unreadable
    /// - [`FormatError::NestingTooDeep`] when a niche discriminant is buried
    ///   deeper than [`crate::FormatterConfig::max_enum_depth`] structs
    pub fn new(fmt: &Formatter<'_, H>, value: &H::Value) -> FormatResult<Self>
    {
        let host = fmt.host();
        let type_name = host.type_name(value);
        let first_field = host.child_at(value, 0).and_then(|child| host.value_name(&child));

        let decoded = if type_name.starts_with("enum$<") && host.child_by_name(value, "discriminant").is_some() {
            decode_template(host, value, &type_name)?
        } else {
            match first_field.as_deref() {
                Some(name) if name.starts_with(ENCODED_ENUM_PREFIX) => {
                    decode_legacy_niche(host, value, name, fmt.config().max_enum_depth)?
                }
                Some(ENUM_DISCRIMINANT) => decode_legacy_tagged(host, value)?,
                _ => Decoded {
                    layout: EnumLayout::DynamicName,
                    variant: last_path_segment(&type_name).to_string(),
                    payload: Some(value.clone()),
                    skip: 0,
                    display_type: None,
                },
            }
        };
        debug!(layout = ?decoded.layout, variant = %decoded.variant, "enum decoded");

        let positional = decoded
            .payload
            .as_ref()
            .and_then(|payload| host.child_at(payload, decoded.skip))
            .and_then(|field| host.value_name(&field))
            .is_some_and(|name| name == "0" || name == "__0");

        Ok(Self {
            layout: decoded.layout,
            variant: decoded.variant,
            payload: decoded.payload,
            skip: decoded.skip,
            positional,
            display_type: decoded.display_type,
        })
    }

    /// Which encoding the value used.
    pub fn layout(&self) -> EnumLayout
    {
        self.layout
    }

    /// Active variant name.
    pub fn variant(&self) -> &str
    {
        &self.variant
    }

    fn field_count(&self, host: &H) -> usize
    {
        self.payload
            .as_ref()
            .map_or(0, |payload| host.num_children(payload).saturating_sub(self.skip))
    }

    /// Template-encoded positional fields are named `__0`; they are shown
    /// as `0`, `1`, ... like a tuple.
    fn renames_fields(&self) -> bool
    {
        self.positional && matches!(self.layout, EnumLayout::Template | EnumLayout::NicheTemplate)
    }
}

fn decode_template<H: Host>(host: &H, value: &H::Value, type_name: &str) -> FormatResult<Decoded<H::Value>>
{
    let params = template_params(type_name);
    let discriminant = host
        .child_by_name(value, "discriminant")
        .ok_or_else(|| FormatError::missing(ProviderKind::Enum, "discriminant"))?;
    let raw = host
        .as_unsigned(&discriminant)
        .ok_or_else(|| FormatError::missing(ProviderKind::Enum, "discriminant value"))?;
    let tag_name = host.value_text(&discriminant).unwrap_or_else(|| raw.to_string());
    let display_type = params.first().cloned();

    match params.len() {
        1 => Ok(Decoded {
            layout: EnumLayout::Template,
            variant: tag_name,
            payload: host.child_by_name(value, &format!("variant{raw}")),
            skip: 0,
            display_type,
        }),
        4 => {
            let bound = |text: &str| {
                text.parse::<u64>().map_err(|err| FormatError::InvalidTypeName {
                    type_name: type_name.to_string(),
                    reason: format!("niche bound `{text}`: {err}"),
                })
            };
            let (min, max) = (bound(&params[1])?, bound(&params[2])?);
            let (variant, payload) = if (min..=max).contains(&raw) {
                (params[3].clone(), host.child_by_name(value, "dataful_variant"))
            } else {
                (tag_name, None)
            };
            Ok(Decoded {
                layout: EnumLayout::NicheTemplate,
                variant,
                payload,
                skip: 0,
                display_type,
            })
        }
        n => Err(FormatError::InvalidTypeName {
            type_name: type_name.to_string(),
            reason: format!("expected 1 or 4 parameters, found {n}"),
        }),
    }
}

fn decode_legacy_niche<H: Host>(
    host: &H,
    value: &H::Value,
    field_name: &str,
    max_depth: usize,
) -> FormatResult<Decoded<H::Value>>
{
    let invalid = |reason: String| FormatError::InvalidTypeName {
        type_name: field_name.to_string(),
        reason,
    };
    let encoded = &field_name[ENCODED_ENUM_PREFIX.len()..];
    let mut tokens: Vec<&str> = encoded.split('$').collect();
    let null_variant = tokens
        .pop()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| invalid("no null variant name".to_string()))?
        .to_string();
    let indices = tokens
        .iter()
        .map(|token| token.parse::<usize>().map_err(|err| invalid(format!("index `{token}`: {err}"))))
        .collect::<FormatResult<Vec<_>>>()?;

    let dataful = host
        .child_at(value, 0)
        .ok_or_else(|| FormatError::missing(ProviderKind::Enum, field_name))?;
    let mut discriminant = dataful.clone();
    for (depth, index) in indices.iter().enumerate() {
        discriminant = host
            .child_at(&discriminant, *index)
            .ok_or_else(|| FormatError::missing(ProviderKind::Enum, format!("{field_name} index {depth}")))?;
    }
    let mut descended = 0;
    while host.is_struct(&discriminant) {
        if descended == max_depth {
            return Err(FormatError::NestingTooDeep { limit: max_depth });
        }
        match host.child_at(&discriminant, 0) {
            Some(first) => discriminant = first,
            None => break,
        }
        descended += 1;
    }
    let raw = host
        .as_unsigned(&discriminant)
        .ok_or_else(|| FormatError::missing(ProviderKind::Enum, format!("{field_name} discriminant")))?;

    let (variant, payload) = if raw == 0 {
        (null_variant, None)
    } else {
        let name = last_path_segment(&host.type_name(&dataful)).to_string();
        (name, Some(dataful))
    };
    Ok(Decoded {
        layout: EnumLayout::LegacyNiche,
        variant,
        payload,
        skip: 0,
        display_type: None,
    })
}

fn decode_legacy_tagged<H: Host>(host: &H, value: &H::Value) -> FormatResult<Decoded<H::Value>>
{
    let tag = host
        .child_at(value, 0)
        .ok_or_else(|| FormatError::missing(ProviderKind::Enum, ENUM_DISCRIMINANT))?;
    let variant = host
        .value_text(&tag)
        .or_else(|| host.as_unsigned(&tag).map(|raw| raw.to_string()))
        .ok_or_else(|| FormatError::missing(ProviderKind::Enum, ENUM_DISCRIMINANT))?;
    Ok(Decoded {
        layout: EnumLayout::LegacyTagged,
        variant,
        payload: Some(value.clone()),
        skip: 1,
        display_type: None,
    })
}

impl<H: Host> Provider<H> for EnumProvider<H>
{
    fn has_children(&self, fmt: &Formatter<'_, H>) -> FormatResult<bool>
    {
        Ok(self.field_count(fmt.host()) > 0)
    }

    fn child_count(&self, fmt: &Formatter<'_, H>) -> FormatResult<usize>
    {
        Ok(self.field_count(fmt.host()))
    }

    fn child_at(&self, fmt: &Formatter<'_, H>, index: usize) -> FormatResult<Option<H::Value>>
    {
        let host = fmt.host();
        let Some(payload) = &self.payload else {
            return Ok(None);
        };
        if index >= self.field_count(host) {
            return Ok(None);
        }
        let Some(field) = host.child_at(payload, index + self.skip) else {
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
        Ok(self
            .payload
            .as_ref()
            .and_then(|payload| fmt.host().index_of_child(payload, name))
            .and_then(|index| index.checked_sub(self.skip)))
    }

    fn summary(&self, fmt: &Formatter<'_, H>) -> FormatResult<Option<String>>
    {
        let summary = match &self.payload {
            Some(payload) if self.field_count(fmt.host()) > 0 => {
                if self.positional {
                    format!("{}{}", self.variant, tuple_summary(fmt, payload, self.skip))
                } else {
                    format!("{}{{...}}", self.variant)
                }
            }
            _ => self.variant.clone(),
        };
        Ok(Some(summary))
    }

    fn display_type_name(&self) -> Option<String>
    {
        self.display_type.clone()
    }
}

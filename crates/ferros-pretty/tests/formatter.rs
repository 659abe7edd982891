//! Tests for session dispatch, caching and cascading

mod common;

use std::rc::Rc;

use common::{alloc_vec, fill_vec, formatter, prim, registry, string_type, vec_type};
use ferros_pretty::cache::DecoderCache;
use ferros_pretty::error::FormatError;
use ferros_pretty::host::memory::{MemValue, MemoryHost};
use ferros_pretty::host::Host;
use ferros_pretty::provider::{Decoder, ProviderKind};
use ferros_pretty::providers::tuple::TupleProvider;
use ferros_pretty::types::{Generation, ValueId};
use ferros_pretty::{Formatter, FormatterConfig};

/// `Vec<String>` whose elements are `texts`.
fn alloc_vec_of_strings(host: &mut MemoryHost, texts: &[&str]) -> MemValue
{
    let string_ty = string_type(host);
    let size = host.type_info(string_ty).size;
    let elements = host.allocate(size * texts.len() as u64);
    for (index, text) in texts.iter().enumerate() {
        let bytes = host.allocate_bytes(text.as_bytes());
        let element = host.value("e", string_ty, elements.offset(index as u64, size));
        let inner = host.field(&element, "vec").unwrap();
        fill_vec(host, &inner, bytes, text.len() as u64, text.len() as u64);
    }
    let ty = vec_type(host, string_ty);
    let vec = host.allocate_value("strings", ty);
    fill_vec(host, &vec, elements, texts.len() as u64, texts.len() as u64);
    vec
}

#[test]
fn test_decoder_is_built_once_per_value()
{
    let mut host = MemoryHost::new();
    let i32_ty = prim(&host, "i32");
    let vec = alloc_vec(&mut host, i32_ty, &[1, 2, 3]);
    let registry = registry();
    let fmt = formatter(&host, &registry);

    let first = fmt.decoder(&vec).unwrap().unwrap();
    assert_eq!(fmt.summary(&vec).unwrap().as_deref(), Some("(3) vec![1, 2, 3]"));
    assert_eq!(fmt.child_count(&vec).unwrap(), 3);
    let second = fmt.decoder(&vec).unwrap().unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(fmt.cached_decoders(), 1);
}

#[test]
fn test_resume_discards_cached_decoders()
{
    let mut host = MemoryHost::new();
    let i32_ty = prim(&host, "i32");
    let vec = alloc_vec(&mut host, i32_ty, &[1, 2]);
    let other = alloc_vec(&mut host, i32_ty, &[3]);
    let registry = registry();
    let fmt = formatter(&host, &registry);

    let before = fmt.decoder(&vec).unwrap().unwrap();
    fmt.summary(&other).unwrap();
    assert_eq!(fmt.cached_decoders(), 2);

    host.resume();
    let after = fmt.decoder(&vec).unwrap().unwrap();
    assert!(!Rc::ptr_eq(&before, &after));
    assert_eq!(fmt.cached_decoders(), 1);
}

#[test]
fn test_failed_initialization_is_not_cached()
{
    let mut host = MemoryHost::new();
    let usize_ty = prim(&host, "usize");
    let ty = host.define_struct("alloc::string::String", &[("bytes", usize_ty)]);
    let value = host.allocate_value("s", ty);
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert!(fmt.summary(&value).is_err());
    assert!(fmt.has_children(&value).is_err());
    assert_eq!(fmt.cached_decoders(), 0);
}

#[test]
fn test_cascade_renders_nested_values()
{
    let mut host = MemoryHost::new();
    let vec = alloc_vec_of_strings(&mut host, &["a", "bc"]);
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.summary(&vec).unwrap().as_deref(), Some("(2) vec![\"a\", \"bc\"]"));
    let second = fmt.child_at(&vec, 1).unwrap().unwrap();
    assert_eq!(fmt.provider_kind(&second), Some(ProviderKind::String));
    assert_eq!(fmt.summary(&second).unwrap().as_deref(), Some("\"bc\""));
}

#[test]
fn test_without_cascade_nested_values_are_raw()
{
    let mut host = MemoryHost::new();
    let vec = alloc_vec_of_strings(&mut host, &["a"]);
    let registry = registry();
    let fmt = Formatter::with_config(&host, &registry, FormatterConfig::default().with_cascade(false));

    assert_eq!(fmt.summary(&vec).unwrap().as_deref(), Some("(1) vec![{...}]"));
    assert_eq!(fmt.cached_decoders(), 1);
}

#[test]
fn test_nested_failure_degrades_to_placeholder()
{
    let mut host = MemoryHost::new();
    let usize_ty = prim(&host, "usize");
    let broken = host.define_struct("alloc::string::String", &[("bytes", usize_ty)]);
    let some = host.define_struct("core::option::Option<alloc::string::String>::Some", &[("__0", broken)]);
    let value = host.allocate_value("opt", some);
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.summary(&value).unwrap().as_deref(), Some("Some({...})"));
}

#[test]
fn test_unregistered_type_uses_raw_view()
{
    let mut host = MemoryHost::new();
    let u32_ty = prim(&host, "u32");
    let point = host.define_struct("geometry::Point", &[("x", u32_ty), ("y", u32_ty)]);
    let value = host.allocate_value("p", point);
    host.set_field(&value, "y", 4).unwrap();
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.provider_kind(&value), None);
    assert!(fmt.decoder(&value).unwrap().is_none());
    assert_eq!(fmt.summary(&value).unwrap(), None);
    assert!(fmt.has_children(&value).unwrap());
    assert_eq!(fmt.child_count(&value).unwrap(), 2);
    let y = fmt.child_at(&value, 1).unwrap().unwrap();
    assert_eq!(y.name(), "y");
    assert_eq!(host.as_unsigned(&y), Some(4));
    assert_eq!(fmt.child_index_of(&value, "y").unwrap(), Some(1));
    assert_eq!(fmt.display_type_name(&value).unwrap(), "geometry::Point");
    assert_eq!(fmt.cached_decoders(), 0);
}

#[test]
fn test_disabled_category_falls_back_to_raw_view()
{
    let mut host = MemoryHost::new();
    let i32_ty = prim(&host, "i32");
    let vec = alloc_vec(&mut host, i32_ty, &[1]);
    let mut registry = registry();
    registry.set_enabled(false);
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.provider_kind(&vec), None);
    assert_eq!(fmt.summary(&vec).unwrap(), None);
    assert_eq!(fmt.child_count(&vec).unwrap(), 2);
}

#[test]
fn test_native_tuple()
{
    let mut host = MemoryHost::new();
    let i32_ty = prim(&host, "i32");
    let bool_ty = prim(&host, "bool");
    let ty = common::tuple_type(&mut host, &[i32_ty, bool_ty]);
    let value = host.allocate_value("t", ty);
    host.set_field(&value, "__0", 7).unwrap();
    host.set_field(&value, "__1", 1).unwrap();
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.provider_kind(&value), Some(ProviderKind::Tuple));
    assert_eq!(fmt.summary(&value).unwrap().as_deref(), Some("(7, true)"));
    assert_eq!(fmt.child_at(&value, 0).unwrap().unwrap().name(), "__0");
    assert_eq!(fmt.child_index_of(&value, "__1").unwrap(), Some(1));
    assert_eq!(fmt.display_type_name(&value).unwrap(), "(i32, bool)");
}

#[test]
fn test_msvc_tuple_is_renamed()
{
    let mut host = MemoryHost::new();
    let u32_ty = prim(&host, "u32");
    let u8_ty = prim(&host, "u8");
    let ty = host.define_struct("tuple$<u32,u8>", &[("__0", u32_ty), ("__1", u8_ty)]);
    let value = host.allocate_value("t", ty);
    host.set_field(&value, "__0", 300).unwrap();
    host.set_field(&value, "__1", 9).unwrap();
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.provider_kind(&value), Some(ProviderKind::MsvcTuple));
    assert_eq!(fmt.display_type_name(&value).unwrap(), "(u32, u8)");
    assert_eq!(fmt.summary(&value).unwrap().as_deref(), Some("(300, 9)"));
    let second = fmt.child_at(&value, 1).unwrap().unwrap();
    assert_eq!(second.name(), "1");
    assert_eq!(host.as_unsigned(&second), Some(9));
    assert_eq!(fmt.child_index_of(&value, "1").unwrap(), Some(1));
    assert!(fmt.child_at(&value, 2).unwrap().is_none());
}

#[test]
fn test_cache_checks_kind_and_generation()
{
    let mut host = MemoryHost::new();
    let u8_ty = prim(&host, "u8");
    let ty = common::tuple_type(&mut host, &[u8_ty]);
    let value = host.allocate_value("t", ty);
    let registry = registry();
    let fmt = formatter(&host, &registry);
    let decoder = Rc::new(Decoder::Tuple(TupleProvider::new(ProviderKind::Tuple, &fmt, &value)));

    let mut cache = DecoderCache::<MemoryHost>::new();
    let id = ValueId(7);
    let start = Generation::default();
    cache.insert(id, start, ProviderKind::Tuple, Rc::clone(&decoder));

    assert!(cache.get(id, start, ProviderKind::Tuple).is_some());
    assert!(cache.get(id, start, ProviderKind::Vec).is_none());
    assert!(cache.get(ValueId(8), start, ProviderKind::Tuple).is_none());

    let next = start.next();
    assert!(cache.get(id, next, ProviderKind::Tuple).is_none());
    assert!(cache.is_empty());
    assert_eq!(cache.generation(), next);

    // inserts stamped with an older generation are dropped
    cache.insert(id, start, ProviderKind::Tuple, decoder);
    assert!(cache.is_empty());
}

#[test]
fn test_children_are_capped()
{
    let mut host = MemoryHost::new();
    let i32_ty = prim(&host, "i32");
    let vec = alloc_vec(&mut host, i32_ty, &[1, 2, 3]);
    let registry = registry();
    let fmt = Formatter::with_config(&host, &registry, FormatterConfig::default().with_max_children(2));

    assert_eq!(fmt.child_count(&vec).unwrap(), 3);
    let children = fmt.children(&vec).unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(host.as_unsigned(&children[1]), Some(2));
}

#[test]
fn test_descend_restores_depth()
{
    let host = MemoryHost::new();
    let registry = registry();
    let fmt = Formatter::with_config(&host, &registry, FormatterConfig::default().with_max_nesting_depth(1));

    assert_eq!(fmt.descend(|| Ok(1)).unwrap(), 1);
    let nested = fmt.descend(|| fmt.descend(|| Ok(2)));
    assert!(matches!(nested, Err(FormatError::NestingTooDeep { limit: 1 })));
    assert_eq!(fmt.descend(|| Ok(3)).unwrap(), 3);
}

//! Tests for Rc, Arc and the cell wrappers

mod common;

use common::{alloc_arc, alloc_rc, alloc_string, alloc_vec, cell_type, formatter, non_null, prim, registry, unsafe_cell};
use ferros_pretty::error::FormatError;
use ferros_pretty::host::memory::{MemValue, MemoryHost};
use ferros_pretty::host::Host;
use ferros_pretty::provider::{Decoder, ProviderKind};
use ferros_pretty::providers::pointer::BorrowState;
use ferros_pretty::{Formatter, FormatterConfig};

#[test]
fn test_rc_weak_count_excludes_implicit_reference()
{
    let mut host = MemoryHost::new();
    let i32_ty = prim(&host, "i32");
    let (rc, payload) = alloc_rc(&mut host, i32_ty, 3, 2);
    host.set_field(&payload, "", 5).unwrap();
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.provider_kind(&rc), Some(ProviderKind::Rc));
    assert_eq!(fmt.summary(&rc).unwrap().as_deref(), Some("(refs:3, weak:1) 5"));
    let decoder = fmt.decoder(&rc).unwrap().unwrap();
    assert!(matches!(&*decoder, Decoder::RefCounted(p) if p.strong() == 3 && p.weak() == 1));
}

#[test]
fn test_rc_without_strong_references_is_disposed()
{
    let mut host = MemoryHost::new();
    let i32_ty = prim(&host, "i32");
    let (rc, _) = alloc_rc(&mut host, i32_ty, 0, 1);
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.summary(&rc).unwrap().as_deref(), Some("(refs:0, weak:1) <disposed>"));
    assert!(!fmt.has_children(&rc).unwrap());
    assert_eq!(fmt.child_count(&rc).unwrap(), 0);
    assert!(fmt.child_at(&rc, 0).unwrap().is_none());
}

#[test]
fn test_rc_forwards_to_payload()
{
    let mut host = MemoryHost::new();
    let string = alloc_string(&mut host, "hi");
    let string_ty = string.ty();
    let (rc, payload) = alloc_rc(&mut host, string_ty, 1, 1);
    let bytes = host.read_memory(string.address(), host.type_info(string_ty).size).unwrap();
    host.write_bytes(payload.address(), &bytes).unwrap();
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.summary(&rc).unwrap().as_deref(), Some("(refs:1, weak:0) \"hi\""));
    assert_eq!(fmt.child_count(&rc).unwrap(), 2);
    let second = fmt.child_at(&rc, 1).unwrap().unwrap();
    assert_eq!(host.value_text(&second).as_deref(), Some("'i'"));
    assert_eq!(fmt.child_index_of(&rc, "[1]").unwrap(), Some(1));
}

#[test]
fn test_rc_of_vec_expands_like_vec()
{
    let mut host = MemoryHost::new();
    let u32_ty = prim(&host, "u32");
    let vec = alloc_vec(&mut host, u32_ty, &[1, 2]);
    let vec_ty = vec.ty();
    let (rc, payload) = alloc_rc(&mut host, vec_ty, 2, 1);
    let bytes = host.read_memory(vec.address(), host.type_info(vec_ty).size).unwrap();
    host.write_bytes(payload.address(), &bytes).unwrap();
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.summary(&rc).unwrap().as_deref(), Some("(refs:2, weak:0) (2) vec![1, 2]"));
    let names: Vec<String> = fmt.children(&rc).unwrap().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, ["[0]", "[1]"]);
}

#[test]
fn test_arc()
{
    let mut host = MemoryHost::new();
    let u64_ty = prim(&host, "u64");
    let (arc, payload) = alloc_arc(&mut host, u64_ty, 2, 3);
    host.set_field(&payload, "", 99).unwrap();
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.provider_kind(&arc), Some(ProviderKind::Arc));
    assert_eq!(fmt.summary(&arc).unwrap().as_deref(), Some("(refs:2, weak:2) 99"));
}

#[test]
fn test_arc_disposed()
{
    let mut host = MemoryHost::new();
    let u64_ty = prim(&host, "u64");
    let (arc, _) = alloc_arc(&mut host, u64_ty, 0, 2);
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.summary(&arc).unwrap().as_deref(), Some("(refs:0, weak:2) <disposed>"));
}

/// `RefCell<i32> { borrow: Cell<isize>, value: UnsafeCell<i32> }`
fn alloc_ref_cell(host: &mut MemoryHost, payload: u64, borrow: i64) -> MemValue
{
    let i32_ty = prim(host, "i32");
    let isize_ty = prim(host, "isize");
    let counter = cell_type(host, isize_ty);
    let cell = unsafe_cell(host, i32_ty);
    let ty = host.define_struct("core::cell::RefCell<i32>", &[("borrow", counter), ("value", cell)]);
    let value = host.allocate_value("cell", ty);
    host.set_signed_field(&value, "borrow.value.value", borrow).unwrap();
    host.set_field(&value, "value.value", payload).unwrap();
    value
}

#[test]
fn test_ref_cell_borrow_states()
{
    let mut host = MemoryHost::new();
    let unused = alloc_ref_cell(&mut host, 1, 0);
    let shared = alloc_ref_cell(&mut host, 2, 2);
    let exclusive = alloc_ref_cell(&mut host, 3, -1);
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.summary(&unused).unwrap().as_deref(), Some("1"));
    assert_eq!(fmt.summary(&shared).unwrap().as_deref(), Some("(borrowed:2) 2"));
    assert_eq!(fmt.summary(&exclusive).unwrap().as_deref(), Some("(borrowed:mut) 3"));

    let decoder = fmt.decoder(&exclusive).unwrap().unwrap();
    assert!(matches!(&*decoder, Decoder::RefCell(p) if p.borrow_state() == BorrowState::Exclusive));
}

#[test]
fn test_cell_and_mutex_are_transparent()
{
    let mut host = MemoryHost::new();
    let u32_ty = prim(&host, "u32");
    let bool_ty = prim(&host, "bool");
    let cell_ty = cell_type(&mut host, u32_ty);
    let data = unsafe_cell(&mut host, u32_ty);
    let mutex_ty = host.define_struct(
        "std::sync::mutex::Mutex<u32>",
        &[("inner", u32_ty), ("poison", bool_ty), ("data", data)],
    );
    let cell = host.allocate_value("c", cell_ty);
    host.set_field(&cell, "value.value", 11).unwrap();
    let mutex = host.allocate_value("m", mutex_ty);
    host.set_field(&mutex, "data.value", 12).unwrap();
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.provider_kind(&cell), Some(ProviderKind::Cell));
    assert_eq!(fmt.summary(&cell).unwrap().as_deref(), Some("11"));
    assert_eq!(fmt.provider_kind(&mutex), Some(ProviderKind::Mutex));
    assert_eq!(fmt.summary(&mutex).unwrap().as_deref(), Some("12"));
    assert_eq!(fmt.child_count(&mutex).unwrap(), 0);
}

#[test]
fn test_ref_follows_value_pointer()
{
    let mut host = MemoryHost::new();
    let string = alloc_string(&mut host, "guarded");
    let string_ty = string.ty();
    let ptr = non_null(&mut host, string_ty);
    let ref_ty = host.define_struct("core::cell::RefMut<alloc::string::String>", &[("value", ptr)]);
    let guard = host.allocate_value("g", ref_ty);
    host.set_field(&guard, "value.pointer", string.address().value()).unwrap();
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(fmt.provider_kind(&guard), Some(ProviderKind::RefBorrow));
    assert_eq!(fmt.summary(&guard).unwrap().as_deref(), Some("\"guarded\""));
    assert_eq!(fmt.child_count(&guard).unwrap(), 7);
}

#[test]
fn test_rc_missing_counters_is_an_error()
{
    let mut host = MemoryHost::new();
    let i32_ty = prim(&host, "i32");
    let rc_box = host.define_struct("alloc::rc::RcBox<i32>", &[("value", i32_ty)]);
    let ptr = non_null(&mut host, rc_box);
    let rc_ty = host.define_struct("alloc::rc::Rc<i32>", &[("ptr", ptr)]);
    let inner = host.allocate_value("b", rc_box);
    let rc = host.allocate_value("rc", rc_ty);
    host.set_field(&rc, "ptr.pointer", inner.address().value()).unwrap();
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert!(fmt.summary(&rc).is_err());
    assert!(fmt.child_count(&rc).is_err());
}

/// `Rc<Rc<...<i32>>>` nested `levels` deep around the value 7.
fn alloc_rc_chain(host: &mut MemoryHost, levels: usize) -> MemValue
{
    let i32_ty = prim(host, "i32");
    let (mut top, payload) = alloc_rc(host, i32_ty, 1, 1);
    host.set_field(&payload, "", 7).unwrap();
    for _ in 1..levels {
        let (rc, payload) = alloc_rc(host, top.ty(), 1, 1);
        let target = host.field(&top, "ptr.pointer").unwrap();
        let inner = host.as_unsigned(&target).unwrap();
        host.set_field(&payload, "ptr.pointer", inner).unwrap();
        top = rc;
    }
    top
}

#[test]
fn test_rc_chain_within_limit_renders_fully()
{
    let mut host = MemoryHost::new();
    let chain = alloc_rc_chain(&mut host, 3);
    let registry = registry();
    let fmt = formatter(&host, &registry);

    assert_eq!(
        fmt.summary(&chain).unwrap().as_deref(),
        Some("(refs:1, weak:0) (refs:1, weak:0) (refs:1, weak:0) 7")
    );
}

#[test]
fn test_rc_chain_deeper_than_limit_is_cut()
{
    let mut host = MemoryHost::new();
    let chain = alloc_rc_chain(&mut host, 10);
    let registry = registry();
    let config = FormatterConfig::default().with_max_nesting_depth(4);
    let fmt = Formatter::with_config(&host, &registry, config);

    let expected = format!("{}{{...}}", "(refs:1, weak:0) ".repeat(5));
    assert_eq!(fmt.summary(&chain).unwrap(), Some(expected));
    assert!(matches!(fmt.child_count(&chain), Err(FormatError::NestingTooDeep { limit: 4 })));

    // the depth counter unwinds after each query
    assert_eq!(fmt.summary(&chain).unwrap().map(|s| s.matches("refs").count()), Some(5));
}

#[test]
fn test_rc_chain_past_default_limit_does_not_overflow()
{
    let mut host = MemoryHost::new();
    let chain = alloc_rc_chain(&mut host, 100);
    let registry = registry();
    let fmt = formatter(&host, &registry);

    let summary = fmt.summary(&chain).unwrap().unwrap();
    assert_eq!(summary.matches("refs").count(), fmt.config().max_nesting_depth + 1);
    assert!(summary.ends_with("{...}"));
}

//! Builders for standard-library layouts inside a `MemoryHost`.

#![allow(dead_code)]

use ferros_pretty::host::memory::{MemValue, MemoryHost, TypeRef};
use ferros_pretty::types::Address;
use ferros_pretty::{Formatter, FormatterConfig, FormatterRegistry};

pub fn prim(host: &MemoryHost, name: &str) -> TypeRef
{
    host.primitive(name).unwrap()
}

pub fn name_of(host: &MemoryHost, ty: TypeRef) -> String
{
    host.type_info(ty).name.clone()
}

pub fn registry() -> FormatterRegistry
{
    FormatterRegistry::rust().unwrap()
}

pub fn formatter<'a>(host: &'a MemoryHost, registry: &'a FormatterRegistry) -> Formatter<'a, MemoryHost>
{
    Formatter::with_config(host, registry, FormatterConfig::default())
}

/// `NonNull<T> { pointer: *const T }`
pub fn non_null(host: &mut MemoryHost, elem: TypeRef) -> TypeRef
{
    let ptr = host.define_pointer(elem);
    let name = format!("core::ptr::non_null::NonNull<{}>", name_of(host, elem));
    host.define_struct(&name, &[("pointer", ptr)])
}

/// `Unique<T> { pointer: NonNull<T> }`
pub fn unique(host: &mut MemoryHost, elem: TypeRef) -> TypeRef
{
    let non_null = non_null(host, elem);
    let name = format!("core::ptr::unique::Unique<{}>", name_of(host, elem));
    host.define_struct(&name, &[("pointer", non_null)])
}

/// `RawVec<T> { ptr: Unique<T>, cap: usize }`
pub fn raw_vec(host: &mut MemoryHost, elem: TypeRef) -> TypeRef
{
    let unique = unique(host, elem);
    let usize_ty = prim(host, "usize");
    let name = format!("alloc::raw_vec::RawVec<{}>", name_of(host, elem));
    host.define_struct(&name, &[("ptr", unique), ("cap", usize_ty)])
}

/// `Vec<T> { buf: RawVec<T>, len: usize }`
pub fn vec_type(host: &mut MemoryHost, elem: TypeRef) -> TypeRef
{
    let raw_vec = raw_vec(host, elem);
    let usize_ty = prim(host, "usize");
    let name = format!("alloc::vec::Vec<{}>", name_of(host, elem));
    host.define_struct(&name, &[("buf", raw_vec), ("len", usize_ty)])
}

/// Map `items` as a contiguous array of `elem`.
pub fn alloc_array(host: &mut MemoryHost, elem: TypeRef, items: &[u64]) -> Address
{
    let size = host.type_info(elem).size;
    let base = host.allocate(size * items.len() as u64);
    for (i, item) in items.iter().enumerate() {
        host.write_uint(base.offset(i as u64, size), size, *item).unwrap();
    }
    base
}

/// Fill a `Vec`-shaped value at `vec` (a `Vec<T>` or a field of that type).
pub fn fill_vec(host: &mut MemoryHost, vec: &MemValue, base: Address, len: u64, cap: u64)
{
    host.set_field(vec, "buf.ptr.pointer.pointer", base.value()).unwrap();
    host.set_field(vec, "buf.cap", cap).unwrap();
    host.set_field(vec, "len", len).unwrap();
}

pub fn alloc_vec(host: &mut MemoryHost, elem: TypeRef, items: &[u64]) -> MemValue
{
    let ty = vec_type(host, elem);
    let base = alloc_array(host, elem, items);
    let vec = host.allocate_value("v", ty);
    fill_vec(host, &vec, base, items.len() as u64, items.len() as u64);
    vec
}

pub fn string_type(host: &mut MemoryHost) -> TypeRef
{
    let u8_ty = prim(host, "u8");
    let vec = vec_type(host, u8_ty);
    host.define_struct("alloc::string::String", &[("vec", vec)])
}

pub fn alloc_string(host: &mut MemoryHost, text: &str) -> MemValue
{
    let ty = string_type(host);
    let base = host.allocate_bytes(text.as_bytes());
    let value = host.allocate_value("s", ty);
    let vec = host.field(&value, "vec").unwrap();
    fill_vec(host, &vec, base, text.len() as u64, text.len() as u64);
    value
}

/// Fat slice reference type `{ data_ptr: *const T, length: usize }`.
pub fn slice_type(host: &mut MemoryHost, name: &str, elem: TypeRef) -> TypeRef
{
    let ptr = host.define_pointer(elem);
    let usize_ty = prim(host, "usize");
    host.define_struct(name, &[("data_ptr", ptr), ("length", usize_ty)])
}

pub fn alloc_slice(host: &mut MemoryHost, name: &str, elem: TypeRef, base: Address, len: u64) -> MemValue
{
    let ty = slice_type(host, name, elem);
    let value = host.allocate_value("slice", ty);
    host.set_field(&value, "data_ptr", base.value()).unwrap();
    host.set_field(&value, "length", len).unwrap();
    value
}

pub fn alloc_str(host: &mut MemoryHost, text: &str) -> MemValue
{
    let u8_ty = prim(host, "u8");
    let base = host.allocate_bytes(text.as_bytes());
    alloc_slice(host, "&str", u8_ty, base, text.len() as u64)
}

/// `UnsafeCell<T> { value: T }`
pub fn unsafe_cell(host: &mut MemoryHost, inner: TypeRef) -> TypeRef
{
    let name = format!("core::cell::UnsafeCell<{}>", name_of(host, inner));
    host.define_struct(&name, &[("value", inner)])
}

/// `Cell<T> { value: UnsafeCell<T> }`
pub fn cell_type(host: &mut MemoryHost, inner: TypeRef) -> TypeRef
{
    let unsafe_cell = unsafe_cell(host, inner);
    let name = format!("core::cell::Cell<{}>", name_of(host, inner));
    host.define_struct(&name, &[("value", unsafe_cell)])
}

/// `Rc<T> { ptr: NonNull<RcBox<T>> }` pointing at a fresh `RcBox`.
pub fn alloc_rc(host: &mut MemoryHost, payload: TypeRef, strong: u64, weak: u64) -> (MemValue, MemValue)
{
    let usize_ty = prim(host, "usize");
    let counter = cell_type(host, usize_ty);
    let payload_name = name_of(host, payload);
    let rc_box = host.define_struct(
        &format!("alloc::rc::RcBox<{payload_name}>"),
        &[("strong", counter), ("weak", counter), ("value", payload)],
    );
    let ptr = non_null(host, rc_box);
    let rc_ty = host.define_struct(&format!("alloc::rc::Rc<{payload_name}>"), &[("ptr", ptr)]);

    let inner = host.allocate_value("rc_box", rc_box);
    host.set_field(&inner, "strong.value.value", strong).unwrap();
    host.set_field(&inner, "weak.value.value", weak).unwrap();
    let rc = host.allocate_value("rc", rc_ty);
    host.set_field(&rc, "ptr.pointer", inner.address().value()).unwrap();
    let value = host.field(&inner, "value").unwrap();
    (rc, value)
}

/// `Arc<T> { ptr: NonNull<ArcInner<T>> }` pointing at a fresh `ArcInner`.
pub fn alloc_arc(host: &mut MemoryHost, payload: TypeRef, strong: u64, weak: u64) -> (MemValue, MemValue)
{
    let usize_ty = prim(host, "usize");
    let unsafe_cell = unsafe_cell(host, usize_ty);
    let atomic = host.define_struct("core::sync::atomic::AtomicUsize", &[("v", unsafe_cell)]);
    let payload_name = name_of(host, payload);
    let arc_inner = host.define_struct(
        &format!("alloc::sync::ArcInner<{payload_name}>"),
        &[("strong", atomic), ("weak", atomic), ("data", payload)],
    );
    let ptr = non_null(host, arc_inner);
    let arc_ty = host.define_struct(&format!("alloc::sync::Arc<{payload_name}>"), &[("ptr", ptr)]);

    let inner = host.allocate_value("arc_inner", arc_inner);
    host.set_field(&inner, "strong.v.value", strong).unwrap();
    host.set_field(&inner, "weak.v.value", weak).unwrap();
    let arc = host.allocate_value("arc", arc_ty);
    host.set_field(&arc, "ptr.pointer", inner.address().value()).unwrap();
    let value = host.field(&inner, "data").unwrap();
    (arc, value)
}

/// Tuple struct `(A, B, ...)` with fields `__0`, `__1`, ...
pub fn tuple_type(host: &mut MemoryHost, elems: &[TypeRef]) -> TypeRef
{
    let names: Vec<String> = elems.iter().map(|ty| name_of(host, *ty)).collect();
    let field_names: Vec<String> = (0..elems.len()).map(|i| format!("__{i}")).collect();
    let fields: Vec<(&str, TypeRef)> = field_names.iter().map(String::as_str).zip(elems.iter().copied()).collect();
    host.define_struct(&format!("({})", names.join(", ")), &fields)
}

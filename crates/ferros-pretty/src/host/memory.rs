//! # In-Memory Host
//!
//! A [`Host`] over a synthetic address space and a hand-built type table.
//!
//! `MemoryHost` lets decoders run without a debugger attached: types are
//! declared with their fields, memory is allocated from a bump allocator and
//! filled field by field, and value handles are plain `(address, type)`
//! pairs. Reads outside allocated regions fail the way reads of unmapped
//! pages fail in a live process.
//!
//! ## Example
//!
//! ```rust
//! use ferros_pretty::host::memory::MemoryHost;
//! use ferros_pretty::host::Host;
//!
//! let mut host = MemoryHost::new();
//! let u32_ty = host.primitive("u32").expect("registered");
//! let point = host.define_struct("Point", &[("x", u32_ty), ("y", u32_ty)]);
//! let value = host.allocate_value("p", point);
//! host.set_field(&value, "y", 7)?;
//!
//! let y = host.child_by_name(&value, "y").expect("field");
//! assert_eq!(host.as_unsigned(&y), Some(7));
//! # Ok::<(), ferros_pretty::FormatError>(())
//! ```

use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use tracing::trace;

use super::Host;
use crate::error::{FormatError, FormatResult};
use crate::types::{Address, Generation, ValueId};

/// First address handed out by the allocator.
const HEAP_START: u64 = 0x0001_0000;

/// Unmapped gap left after every allocation.
const GUARD_BYTES: u64 = 64;

/// Target pointer width.
const POINTER_SIZE: u64 = 8;

/// Primitive scalars registered by [`MemoryHost::new`]: (name, size, signed).
const PRIMITIVES: &[(&str, u64, bool)] = &[
    ("u8", 1, false),
    ("u16", 2, false),
    ("u32", 4, false),
    ("u64", 8, false),
    ("usize", 8, false),
    ("i8", 1, true),
    ("i16", 2, true),
    ("i32", 4, true),
    ("i64", 8, true),
    ("isize", 8, true),
];

/// Index of a type in a [`MemoryHost`]'s type table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef(usize);

/// A struct member
#[derive(Debug, Clone)]
pub struct Field
{
    /// Member name
    pub name: String,
    /// Byte offset from the start of the struct
    pub offset: u64,
    /// Member type
    pub ty: TypeRef,
}

/// Shape of a type
#[derive(Debug, Clone)]
pub enum TypeKind
{
    /// Integer
    Scalar
    {
        /// Two's complement
        signed: bool,
    },
    /// `bool`
    Bool,
    /// C-like enumeration, rendered by enumerator name
    Enumeration
    {
        /// Value → name
        enumerators: Vec<(u64, String)>,
    },
    /// Raw pointer or reference
    Pointer
    {
        /// Pointed-to type
        pointee: TypeRef,
    },
    /// Struct, tuple or union
    Struct
    {
        /// Members in declaration order
        fields: Vec<Field>,
        /// Generic arguments, when the debug info carries them
        template_args: Vec<TypeRef>,
    },
    /// Alias for another type
    Typedef
    {
        /// Aliased type
        target: TypeRef,
    },
}

/// One entry of the type table
#[derive(Debug, Clone)]
pub struct TypeInfo
{
    /// Fully qualified name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Alignment in bytes
    pub align: u64,
    /// Shape
    pub kind: TypeKind,
}

/// Handle to a value living in a [`MemoryHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemValue
{
    name: String,
    address: Address,
    ty: TypeRef,
    char_format: bool,
}

impl MemValue
{
    /// Where the value lives.
    pub fn address(&self) -> Address
    {
        self.address
    }

    /// Static type.
    pub fn ty(&self) -> TypeRef
    {
        self.ty
    }

    /// Display name.
    pub fn name(&self) -> &str
    {
        &self.name
    }
}

/// Synthetic process: a type table plus mapped memory regions
#[derive(Debug)]
pub struct MemoryHost
{
    types: Vec<TypeInfo>,
    by_name: HashMap<String, TypeRef>,
    regions: BTreeMap<u64, Vec<u8>>,
    next_address: u64,
    generation: Cell<Generation>,
}

impl Default for MemoryHost
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl MemoryHost
{
    /// Empty address space with the primitive integer types, `bool` and
    /// `()` registered.
    pub fn new() -> Self
    {
        let mut host = Self {
            types: Vec::new(),
            by_name: HashMap::new(),
            regions: BTreeMap::new(),
            next_address: HEAP_START,
            generation: Cell::new(Generation::default()),
        };
        for (name, size, signed) in PRIMITIVES {
            host.define_scalar(name, *size, *signed);
        }
        host.register(TypeInfo {
            name: "bool".to_string(),
            size: 1,
            align: 1,
            kind: TypeKind::Bool,
        });
        host.define_struct("()", &[]);
        host
    }

    fn register(&mut self, info: TypeInfo) -> TypeRef
    {
        if let Some(existing) = self.by_name.get(&info.name) {
            return *existing;
        }
        let ty = TypeRef(self.types.len());
        self.by_name.insert(info.name.clone(), ty);
        self.types.push(info);
        ty
    }

    fn info(&self, ty: TypeRef) -> &TypeInfo
    {
        &self.types[ty.0]
    }

    /// Follow typedefs to the underlying type.
    fn resolve(&self, ty: TypeRef) -> TypeRef
    {
        let mut current = ty;
        for _ in 0..16 {
            match self.info(current).kind {
                TypeKind::Typedef { target } => current = target,
                _ => break,
            }
        }
        current
    }

    /// A registered type by name.
    pub fn primitive(&self, name: &str) -> Option<TypeRef>
    {
        self.by_name.get(name).copied()
    }

    /// Type table entry.
    pub fn type_info(&self, ty: TypeRef) -> &TypeInfo
    {
        self.info(ty)
    }

    /// Register an integer type. Returns the existing type if `name` is taken.
    pub fn define_scalar(&mut self, name: &str, size: u64, signed: bool) -> TypeRef
    {
        self.register(TypeInfo {
            name: name.to_string(),
            size,
            align: size.clamp(1, 8),
            kind: TypeKind::Scalar { signed },
        })
    }

    /// Register a C-like enumeration of the given size.
    pub fn define_enumeration(&mut self, name: &str, size: u64, enumerators: &[(u64, &str)]) -> TypeRef
    {
        self.register(TypeInfo {
            name: name.to_string(),
            size,
            align: size.clamp(1, 8),
            kind: TypeKind::Enumeration {
                enumerators: enumerators.iter().map(|(v, n)| (*v, (*n).to_string())).collect(),
            },
        })
    }

    /// Register `*const T`.
    pub fn define_pointer(&mut self, pointee: TypeRef) -> TypeRef
    {
        let name = format!("*const {}", self.info(pointee).name);
        self.define_pointer_named(&name, pointee)
    }

    /// Register a pointer type under an explicit name, e.g. `&str`.
    pub fn define_pointer_named(&mut self, name: &str, pointee: TypeRef) -> TypeRef
    {
        self.register(TypeInfo {
            name: name.to_string(),
            size: POINTER_SIZE,
            align: POINTER_SIZE,
            kind: TypeKind::Pointer { pointee },
        })
    }

    /// Register a struct laid out in declaration order with natural alignment.
    pub fn define_struct(&mut self, name: &str, fields: &[(&str, TypeRef)]) -> TypeRef
    {
        self.define_generic_struct(name, fields, &[])
    }

    /// Register a struct that also records its generic arguments.
    pub fn define_generic_struct(&mut self, name: &str, fields: &[(&str, TypeRef)], template_args: &[TypeRef]) -> TypeRef
    {
        let mut offset = 0u64;
        let mut align = 1u64;
        let mut laid_out = Vec::with_capacity(fields.len());
        for (field_name, ty) in fields {
            let info = self.info(*ty);
            offset = align_up(offset, info.align);
            align = align.max(info.align);
            laid_out.push(Field {
                name: (*field_name).to_string(),
                offset,
                ty: *ty,
            });
            offset += info.size;
        }
        self.register(TypeInfo {
            name: name.to_string(),
            size: align_up(offset, align),
            align,
            kind: TypeKind::Struct {
                fields: laid_out,
                template_args: template_args.to_vec(),
            },
        })
    }

    /// Register a union: every member at offset 0.
    pub fn define_union(&mut self, name: &str, fields: &[(&str, TypeRef)]) -> TypeRef
    {
        let size = fields.iter().map(|(_, ty)| self.info(*ty).size).max().unwrap_or(0);
        let align = fields.iter().map(|(_, ty)| self.info(*ty).align).max().unwrap_or(1);
        let fields = fields
            .iter()
            .map(|(name, ty)| Field {
                name: (*name).to_string(),
                offset: 0,
                ty: *ty,
            })
            .collect();
        self.register(TypeInfo {
            name: name.to_string(),
            size: align_up(size, align),
            align,
            kind: TypeKind::Struct {
                fields,
                template_args: Vec::new(),
            },
        })
    }

    /// Register an alias.
    pub fn define_typedef(&mut self, name: &str, target: TypeRef) -> TypeRef
    {
        let info = self.info(target);
        let (size, align) = (info.size, info.align);
        self.register(TypeInfo {
            name: name.to_string(),
            size,
            align,
            kind: TypeKind::Typedef { target },
        })
    }

    /// Map `size` zeroed bytes and return their address.
    pub fn allocate(&mut self, size: u64) -> Address
    {
        let address = align_up(self.next_address, 16);
        self.next_address = address + size + GUARD_BYTES;
        self.regions.insert(address, vec![0; usize::try_from(size).unwrap_or(0)]);
        trace!(%address, size, "mapped region");
        Address::new(address)
    }

    /// Map and fill a byte buffer.
    pub fn allocate_bytes(&mut self, bytes: &[u8]) -> Address
    {
        let address = self.allocate(bytes.len() as u64);
        if let Some(region) = self.regions.get_mut(&address.value()) {
            region.copy_from_slice(bytes);
        }
        address
    }

    /// Map room for one `ty` and return a handle to it.
    pub fn allocate_value(&mut self, name: &str, ty: TypeRef) -> MemValue
    {
        let address = self.allocate(self.info(ty).size);
        self.value(name, ty, address)
    }

    /// Handle to a `ty` at `address`.
    pub fn value(&self, name: &str, ty: TypeRef, address: Address) -> MemValue
    {
        MemValue {
            name: name.to_string(),
            address,
            ty,
            char_format: false,
        }
    }

    /// Overwrite mapped memory.
    ///
    /// ## Errors
    ///
    /// [`FormatError::MemoryRead`] if the range is not fully mapped.
    pub fn write_bytes(&mut self, address: Address, bytes: &[u8]) -> FormatResult<()>
    {
        let len = bytes.len() as u64;
        let (start, region) = self
            .regions
            .range_mut(..=address.value())
            .next_back()
            .ok_or_else(|| unmapped(address, len))?;
        let offset = address.value() - start;
        let end = offset + len;
        if end > region.len() as u64 {
            return Err(unmapped(address, len));
        }
        region[offset as usize..end as usize].copy_from_slice(bytes);
        Ok(())
    }

    /// Store the low `size` bytes of `value`, little-endian.
    ///
    /// ## Errors
    ///
    /// [`FormatError::MemoryRead`] if the range is not fully mapped.
    pub fn write_uint(&mut self, address: Address, size: u64, value: u64) -> FormatResult<()>
    {
        let bytes = value.to_le_bytes();
        let width = usize::try_from(size.min(8)).unwrap_or(8);
        self.write_bytes(address, &bytes[..width])
    }

    /// Store an integer into a dotted field path, e.g. `"buf.cap"`.
    ///
    /// The path walks struct members only; pointers are not followed.
    ///
    /// ## Errors
    ///
    /// [`FormatError::ValueUnavailable`] for an unknown path, or a memory
    /// error if the value is not mapped.
    pub fn set_field(&mut self, value: &MemValue, path: &str, raw: u64) -> FormatResult<()>
    {
        let (address, ty) = self.field_location(value, path)?;
        let size = self.info(ty).size;
        self.write_uint(address, size, raw)
    }

    /// Store a signed integer into a dotted field path.
    ///
    /// ## Errors
    ///
    /// Same as [`MemoryHost::set_field`].
    pub fn set_signed_field(&mut self, value: &MemValue, path: &str, raw: i64) -> FormatResult<()>
    {
        self.set_field(value, path, u64::from_ne_bytes(raw.to_ne_bytes()))
    }

    /// Handle to the member at a dotted path, without following pointers.
    ///
    /// ## Errors
    ///
    /// [`FormatError::ValueUnavailable`] for an unknown path.
    pub fn field(&self, value: &MemValue, path: &str) -> FormatResult<MemValue>
    {
        let (address, ty) = self.field_location(value, path)?;
        let name = path.rsplit('.').next().unwrap_or(path);
        Ok(self.value(name, ty, address))
    }

    fn field_location(&self, value: &MemValue, path: &str) -> FormatResult<(Address, TypeRef)>
    {
        let mut address = value.address;
        let mut ty = value.ty;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            let field = self
                .fields(ty)
                .iter()
                .find(|field| field.name == segment)
                .ok_or_else(|| FormatError::ValueUnavailable(format!("no field `{segment}` in `{}`", self.info(ty).name)))?;
            address = address + field.offset;
            ty = field.ty;
        }
        Ok((address, ty))
    }

    fn fields(&self, ty: TypeRef) -> &[Field]
    {
        match &self.info(self.resolve(ty)).kind {
            TypeKind::Struct { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Mark every live value handle stale, like resuming the process.
    ///
    /// Takes `&self` so it can run while a formatter session borrows the host.
    pub fn resume(&self)
    {
        self.generation.set(self.generation.get().next());
    }

    fn read_raw(&self, value: &MemValue) -> Option<u64>
    {
        let size = self.info(value.ty).size.min(8);
        let bytes = self.read_memory(value.address, size).ok()?;
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(&bytes);
        Some(u64::from_le_bytes(buf))
    }

    /// Pointer target, `None` for non-pointers.
    fn deref_pointer(&self, value: &MemValue) -> Option<MemValue>
    {
        let TypeKind::Pointer { pointee } = self.info(self.resolve(value.ty)).kind else {
            return None;
        };
        let target = self.read_raw(value)?;
        Some(self.value(&format!("*{}", value.name), pointee, Address::new(target)))
    }

    /// Struct whose members a value's children are: itself, or its pointee.
    fn aggregate(&self, value: &MemValue) -> Option<MemValue>
    {
        if self.is_pointer(value) {
            return self.deref_pointer(value);
        }
        Some(value.clone())
    }
}

fn align_up(value: u64, align: u64) -> u64
{
    let align = align.max(1);
    value.div_ceil(align) * align
}

fn unmapped(address: Address, len: u64) -> FormatError
{
    FormatError::MemoryRead {
        address,
        len,
        reason: "address not mapped".to_string(),
    }
}

impl Host for MemoryHost
{
    type Value = MemValue;
    type Type = TypeRef;

    fn value_id(&self, value: &MemValue) -> ValueId
    {
        let mut hasher = DefaultHasher::new();
        value.address.value().hash(&mut hasher);
        value.ty.hash(&mut hasher);
        ValueId(hasher.finish())
    }

    fn generation(&self) -> Generation
    {
        self.generation.get()
    }

    fn type_name(&self, value: &MemValue) -> String
    {
        self.info(value.ty).name.clone()
    }

    fn value_name(&self, value: &MemValue) -> Option<String>
    {
        Some(value.name.clone())
    }

    fn num_children(&self, value: &MemValue) -> usize
    {
        self.aggregate(value).map_or(0, |aggregate| self.fields(aggregate.ty).len())
    }

    fn child_at(&self, value: &MemValue, index: usize) -> Option<MemValue>
    {
        let aggregate = self.aggregate(value)?;
        let field = self.fields(aggregate.ty).get(index)?;
        Some(self.value(&field.name, field.ty, aggregate.address + field.offset))
    }

    fn child_by_name(&self, value: &MemValue, name: &str) -> Option<MemValue>
    {
        let aggregate = self.aggregate(value)?;
        let field = self.fields(aggregate.ty).iter().find(|field| field.name == name)?;
        Some(self.value(&field.name, field.ty, aggregate.address + field.offset))
    }

    fn index_of_child(&self, value: &MemValue, name: &str) -> Option<usize>
    {
        let aggregate = self.aggregate(value)?;
        self.fields(aggregate.ty).iter().position(|field| field.name == name)
    }

    fn as_unsigned(&self, value: &MemValue) -> Option<u64>
    {
        match self.info(self.resolve(value.ty)).kind {
            TypeKind::Struct { .. } => None,
            _ => self.read_raw(value),
        }
    }

    fn as_signed(&self, value: &MemValue) -> Option<i64>
    {
        let raw = self.as_unsigned(value)?;
        let bits = self.info(value.ty).size.clamp(1, 8) * 8;
        let shift = 64 - bits;
        Some(i64::from_ne_bytes((raw << shift).to_ne_bytes()) >> shift)
    }

    fn value_text(&self, value: &MemValue) -> Option<String>
    {
        let resolved = self.resolve(value.ty);
        match &self.info(resolved).kind {
            TypeKind::Struct { .. } => None,
            TypeKind::Bool => self.read_raw(value).map(|raw| (raw != 0).to_string()),
            TypeKind::Enumeration { enumerators } => {
                let raw = self.read_raw(value)?;
                Some(
                    enumerators
                        .iter()
                        .find(|(v, _)| *v == raw)
                        .map_or_else(|| raw.to_string(), |(_, name)| name.clone()),
                )
            }
            TypeKind::Pointer { .. } => self.read_raw(value).map(|raw| format!("{}", Address::new(raw))),
            TypeKind::Scalar { signed } => {
                if value.char_format {
                    let raw = self.read_raw(value)?;
                    let byte = u8::try_from(raw).ok()?;
                    return Some(format!("'{}'", char::from(byte).escape_default()));
                }
                if *signed {
                    self.as_signed(value).map(|v| v.to_string())
                } else {
                    self.read_raw(value).map(|v| v.to_string())
                }
            }
            TypeKind::Typedef { .. } => None,
        }
    }

    fn is_pointer(&self, value: &MemValue) -> bool
    {
        matches!(self.info(self.resolve(value.ty)).kind, TypeKind::Pointer { .. })
    }

    fn is_struct(&self, value: &MemValue) -> bool
    {
        matches!(self.info(self.resolve(value.ty)).kind, TypeKind::Struct { .. })
    }

    fn type_of(&self, value: &MemValue) -> TypeRef
    {
        value.ty
    }

    fn pointee_type(&self, ty: &TypeRef) -> Option<TypeRef>
    {
        match self.info(self.resolve(*ty)).kind {
            TypeKind::Pointer { pointee } => Some(pointee),
            _ => None,
        }
    }

    fn type_size(&self, ty: &TypeRef) -> Option<u64>
    {
        Some(self.info(*ty).size)
    }

    fn type_display_name(&self, ty: &TypeRef) -> String
    {
        self.info(*ty).name.clone()
    }

    fn template_argument(&self, ty: &TypeRef, index: usize) -> Option<TypeRef>
    {
        match &self.info(self.resolve(*ty)).kind {
            TypeKind::Struct { template_args, .. } => template_args.get(index).copied(),
            _ => None,
        }
    }

    fn canonical_type(&self, ty: &TypeRef) -> TypeRef
    {
        self.resolve(*ty)
    }

    fn find_type(&self, name: &str) -> Option<TypeRef>
    {
        self.by_name.get(name).copied()
    }

    fn byte_type(&self) -> Option<TypeRef>
    {
        self.find_type("u8")
    }

    fn pointer_size(&self) -> u64
    {
        POINTER_SIZE
    }

    fn load_address(&self, value: &MemValue) -> Option<Address>
    {
        Some(value.address)
    }

    fn dereference(&self, value: &MemValue) -> Option<MemValue>
    {
        self.deref_pointer(value)
    }

    fn read_memory(&self, address: Address, len: u64) -> FormatResult<Vec<u8>>
    {
        if len == 0 {
            return Ok(Vec::new());
        }
        let (start, region) = self
            .regions
            .range(..=address.value())
            .next_back()
            .ok_or_else(|| unmapped(address, len))?;
        let offset = address.value() - start;
        let end = offset.checked_add(len).ok_or_else(|| unmapped(address, len))?;
        if end > region.len() as u64 {
            return Err(unmapped(address, len));
        }
        Ok(region[offset as usize..end as usize].to_vec())
    }

    fn value_at_address(&self, name: &str, address: Address, ty: &TypeRef) -> Option<MemValue>
    {
        Some(self.value(name, *ty, address))
    }

    fn with_char_format(&self, mut value: MemValue) -> MemValue
    {
        value.char_format = true;
        value
    }
}

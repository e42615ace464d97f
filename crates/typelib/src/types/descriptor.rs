// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for C-compatible memory layouts.

use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Shared, non-owning handle to a descriptor. The owning side is the
/// [`Registry`](crate::Registry) the descriptor was registered in.
pub type TypeRef = Arc<Type>;

/// Width of a native pointer on the current platform.
pub const POINTER_SIZE: usize = std::mem::size_of::<usize>();

/// Taxonomy bucket of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Numeric,
    Enum,
    Compound,
    Pointer,
    Array,
    Opaque,
    NullType,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Numeric => write!(f, "numeric"),
            Category::Enum => write!(f, "enum"),
            Category::Compound => write!(f, "compound"),
            Category::Pointer => write!(f, "pointer"),
            Category::Array => write!(f, "array"),
            Category::Opaque => write!(f, "opaque"),
            Category::NullType => write!(f, "null"),
        }
    }
}

/// Encoding of a numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Signed,
    Unsigned,
    Float,
}

impl NumericKind {
    /// Check whether `size` is a legal width for this encoding.
    pub fn accepts_size(self, size: usize) -> bool {
        match self {
            Self::Signed | Self::Unsigned => matches!(size, 1 | 2 | 4 | 8),
            Self::Float => matches!(size, 4 | 8),
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed => write!(f, "signed"),
            Self::Unsigned => write!(f, "unsigned"),
            Self::Float => write!(f, "float"),
        }
    }
}

/// Category-specific payload of a descriptor.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Integer or floating point scalar.
    Numeric(NumericKind),
    /// Enumeration stored as a signed integer.
    Enum(EnumDescriptor),
    /// Structure with fields at fixed offsets.
    Compound(Vec<Field>),
    /// Native pointer to the indirected type.
    Pointer(TypeRef),
    /// Fixed-length array.
    Array(ArrayDescriptor),
    /// Handle whose content is not described.
    Opaque,
    /// Zero-sized placeholder (`void`).
    Null,
}

/// Immutable description of a memory layout.
#[derive(Debug, Clone)]
pub struct Type {
    name: String,
    size: usize,
    kind: TypeKind,
}

impl Type {
    /// Create a numeric type.
    pub fn numeric(name: impl Into<String>, kind: NumericKind, size: usize) -> Result<Self> {
        let name = name.into();
        if !kind.accepts_size(size) {
            return Err(Error::invalid(
                "Type::numeric",
                format!("{kind} numeric '{name}' cannot be {size} bytes wide"),
            ));
        }
        Ok(Self {
            name,
            size,
            kind: TypeKind::Numeric(kind),
        })
    }

    /// Create an enumeration type.
    pub fn enumeration(name: impl Into<String>, desc: EnumDescriptor) -> Result<Self> {
        let name = name.into();
        if !NumericKind::Signed.accepts_size(desc.size) {
            return Err(Error::invalid(
                "Type::enumeration",
                format!("enum '{name}' cannot be {} bytes wide", desc.size),
            ));
        }
        Ok(Self {
            name,
            size: desc.size,
            kind: TypeKind::Enum(desc),
        })
    }

    /// Create a compound type with explicit offsets and total size.
    ///
    /// Every field must lie entirely inside `size`, field names must be
    /// unique and no two sized fields may share a byte. Use
    /// [`CompoundBuilder`](crate::types::CompoundBuilder) for natural C layout.
    pub fn compound(name: impl Into<String>, fields: Vec<Field>, size: usize) -> Result<Self> {
        let name = name.into();
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::invalid(
                    "Type::compound",
                    format!("'{name}' declares field '{}' twice", field.name),
                ));
            }
            let end = field.offset.checked_add(field.ty.size);
            if end.map_or(true, |end| end > size) {
                return Err(Error::SizeMismatch {
                    op: "Type::compound",
                    type_name: name,
                    expected: field.offset.saturating_add(field.ty.size),
                    actual: size,
                });
            }
        }

        let mut by_offset: Vec<&Field> = fields.iter().filter(|f| f.ty.size > 0).collect();
        by_offset.sort_by_key(|f| f.offset);
        for pair in by_offset.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.offset < prev.offset + prev.ty.size {
                return Err(Error::invalid(
                    "Type::compound",
                    format!(
                        "'{name}': field '{}' at {} overlaps '{}' at {}..{}",
                        next.name,
                        next.offset,
                        prev.name,
                        prev.offset,
                        prev.offset + prev.ty.size
                    ),
                ));
            }
        }

        Ok(Self {
            name,
            size,
            kind: TypeKind::Compound(fields),
        })
    }

    /// Create a fixed-length array type named `element[count]`.
    pub fn array(element: &TypeRef, count: usize) -> Result<Self> {
        let size = element.size.checked_mul(count).ok_or_else(|| {
            Error::invalid(
                "Type::array",
                format!("{}[{count}] overflows the address space", element.name),
            )
        })?;
        Ok(Self {
            name: format!("{}[{count}]", element.name),
            size,
            kind: TypeKind::Array(ArrayDescriptor::new(element.clone(), count)),
        })
    }

    /// Create a pointer type named `pointee*`.
    pub fn pointer(pointee: &TypeRef) -> Self {
        Self {
            name: format!("{}*", pointee.name),
            size: POINTER_SIZE,
            kind: TypeKind::Pointer(pointee.clone()),
        }
    }

    /// Create an opaque handle type.
    pub fn opaque(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            kind: TypeKind::Opaque,
        }
    }

    /// Create the zero-sized null type.
    pub fn null(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            kind: TypeKind::Null,
        }
    }

    pub(crate) fn from_parts(name: String, size: usize, kind: TypeKind) -> Self {
        Self { name, size, kind }
    }

    /// Structural identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Category payload.
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Taxonomy bucket.
    pub fn category(&self) -> Category {
        match &self.kind {
            TypeKind::Numeric(_) => Category::Numeric,
            TypeKind::Enum(_) => Category::Enum,
            TypeKind::Compound(_) => Category::Compound,
            TypeKind::Pointer(_) => Category::Pointer,
            TypeKind::Array(_) => Category::Array,
            TypeKind::Opaque => Category::Opaque,
            TypeKind::Null => Category::NullType,
        }
    }

    /// Alignment requirement in bytes.
    pub fn alignment(&self) -> usize {
        match &self.kind {
            TypeKind::Numeric(_) | TypeKind::Enum(_) => self.size.max(1),
            TypeKind::Compound(fields) => fields
                .iter()
                .map(|f| f.ty.alignment())
                .max()
                .unwrap_or(1),
            TypeKind::Pointer(_) => POINTER_SIZE,
            TypeKind::Array(arr) => arr.element.alignment(),
            // Largest power of two dividing the size, capped at 8
            TypeKind::Opaque => match self.size {
                0 => 1,
                n => (1usize << n.trailing_zeros()).min(8),
            },
            TypeKind::Null => 1,
        }
    }

    /// Numeric encoding, if numeric.
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self.kind {
            TypeKind::Numeric(kind) => Some(kind),
            _ => None,
        }
    }

    /// Fields, if compound.
    pub fn fields(&self) -> Option<&[Field]> {
        match &self.kind {
            TypeKind::Compound(fields) => Some(fields),
            _ => None,
        }
    }

    /// Get field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields()?.iter().find(|f| f.name == name)
    }

    /// Array payload, if array.
    pub fn array_descriptor(&self) -> Option<&ArrayDescriptor> {
        match &self.kind {
            TypeKind::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Indirected type, if pointer.
    pub fn pointee(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Pointer(target) => Some(target),
            _ => None,
        }
    }

    /// Enum payload, if enum.
    pub fn enum_descriptor(&self) -> Option<&EnumDescriptor> {
        match &self.kind {
            TypeKind::Enum(desc) => Some(desc),
            _ => None,
        }
    }

    /// True for the one-byte signed numeric named `char`.
    pub fn is_char(&self) -> bool {
        self.name == "char" && self.size == 1 && self.numeric_kind() == Some(NumericKind::Signed)
    }

    /// Deep structural comparison: name, size, category and layout, recursively.
    pub fn is_same(&self, other: &Type) -> bool {
        if self.name != other.name || self.size != other.size {
            return false;
        }
        match (&self.kind, &other.kind) {
            (TypeKind::Numeric(a), TypeKind::Numeric(b)) => a == b,
            (TypeKind::Enum(a), TypeKind::Enum(b)) => a.is_same(b),
            (TypeKind::Compound(a), TypeKind::Compound(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(fa, fb)| {
                        fa.name == fb.name && fa.offset == fb.offset && same_ref(&fa.ty, &fb.ty)
                    })
            }
            (TypeKind::Pointer(a), TypeKind::Pointer(b)) => same_ref(a, b),
            (TypeKind::Array(a), TypeKind::Array(b)) => {
                a.count == b.count && same_ref(&a.element, &b.element)
            }
            (TypeKind::Opaque, TypeKind::Opaque) | (TypeKind::Null, TypeKind::Null) => true,
            _ => false,
        }
    }

    /// Describe the first structural difference with `other`, if any.
    pub(crate) fn difference(&self, other: &Type) -> Option<String> {
        if self.category() != other.category() {
            return Some(format!(
                "category {} vs {}",
                self.category(),
                other.category()
            ));
        }
        if self.size != other.size {
            return Some(format!("size {} vs {}", self.size, other.size));
        }
        match (&self.kind, &other.kind) {
            (TypeKind::Numeric(a), TypeKind::Numeric(b)) if a != b => {
                Some(format!("numeric kind {a} vs {b}"))
            }
            (TypeKind::Enum(a), TypeKind::Enum(b)) => a.difference(b),
            (TypeKind::Compound(a), TypeKind::Compound(b)) => {
                if a.len() != b.len() {
                    return Some(format!("field count {} vs {}", a.len(), b.len()));
                }
                a.iter().zip(b).find_map(|(fa, fb)| {
                    if fa.name != fb.name {
                        Some(format!("field '{}' vs '{}'", fa.name, fb.name))
                    } else if fa.offset != fb.offset {
                        Some(format!(
                            "field '{}': offset {} vs {}",
                            fa.name, fa.offset, fb.offset
                        ))
                    } else {
                        ref_difference(&fa.ty, &fb.ty)
                            .map(|reason| format!("field '{}': {reason}", fa.name))
                    }
                })
            }
            (TypeKind::Pointer(a), TypeKind::Pointer(b)) => {
                ref_difference(a, b).map(|reason| format!("pointee: {reason}"))
            }
            (TypeKind::Array(a), TypeKind::Array(b)) => {
                if a.count != b.count {
                    Some(format!("element count {} vs {}", a.count, b.count))
                } else {
                    ref_difference(&a.element, &b.element)
                        .map(|reason| format!("element: {reason}"))
                }
            }
            _ => None,
        }
    }

    /// Rebuild this descriptor with every directly nested reference mapped
    /// through `f` (fields, array element, pointee).
    pub(crate) fn map_children<F>(&self, mut f: F) -> Result<Type>
    where
        F: FnMut(&TypeRef) -> Result<TypeRef>,
    {
        let kind = match &self.kind {
            TypeKind::Compound(fields) => TypeKind::Compound(
                fields
                    .iter()
                    .map(|field| {
                        Ok(Field::new(field.name.clone(), field.offset, f(&field.ty)?))
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            TypeKind::Array(arr) => TypeKind::Array(ArrayDescriptor::new(f(&arr.element)?, arr.count)),
            TypeKind::Pointer(target) => TypeKind::Pointer(f(target)?),
            other => other.clone(),
        };
        Ok(Type::from_parts(self.name.clone(), self.size, kind))
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {} bytes)", self.name, self.category(), self.size)
    }
}

fn same_ref(a: &TypeRef, b: &TypeRef) -> bool {
    Arc::ptr_eq(a, b) || a.is_same(b)
}

fn ref_difference(a: &TypeRef, b: &TypeRef) -> Option<String> {
    if same_ref(a, b) {
        None
    } else if a.name != b.name {
        Some(format!("{} vs {}", a.name, b.name))
    } else {
        a.difference(b)
            .map(|reason| format!("{}: {reason}", a.name))
    }
}

/// Type equality: same identity, or structurally identical.
///
/// Descriptors coming from two registries (or from independent definitions)
/// are distinct instances; this compares them by layout when identity fails.
pub fn types_equal(a: &TypeRef, b: &TypeRef) -> bool {
    same_ref(a, b)
}

/// Compound member.
#[derive(Debug, Clone)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Byte offset from the start of the compound.
    pub offset: usize,
    /// Field type.
    pub ty: TypeRef,
}

impl Field {
    /// Create a field descriptor.
    pub fn new(name: impl Into<String>, offset: usize, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            offset,
            ty,
        }
    }
}

/// Array type descriptor.
#[derive(Debug, Clone)]
pub struct ArrayDescriptor {
    /// Element type.
    pub element: TypeRef,
    /// Fixed element count.
    pub count: usize,
}

impl ArrayDescriptor {
    /// Create array descriptor.
    pub fn new(element: TypeRef, count: usize) -> Self {
        Self { element, count }
    }

    /// Byte size of the element storage (count x element size).
    pub fn byte_len(&self) -> usize {
        self.count * self.element.size()
    }
}

/// Enumeration descriptor.
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    /// Symbol to value mapping, in declaration order.
    pub values: Vec<EnumValue>,
    /// Storage width in bytes (default 4).
    pub size: usize,
}

impl EnumDescriptor {
    /// Create a 4-byte enum descriptor.
    pub fn new(values: Vec<EnumValue>) -> Self {
        Self { values, size: 4 }
    }

    /// Use a different storage width.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Value of a symbol.
    pub fn value_of(&self, symbol: &str) -> Option<i64> {
        self.values.iter().find(|v| v.name == symbol).map(|v| v.value)
    }

    /// First symbol carrying `value`.
    pub fn symbol_of(&self, value: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.value == value)
            .map(|v| v.name.as_str())
    }

    fn difference(&self, other: &EnumDescriptor) -> Option<String> {
        if self.values.len() != other.values.len() {
            return Some(format!(
                "symbol count {} vs {}",
                self.values.len(),
                other.values.len()
            ));
        }
        self.values
            .iter()
            .find(|v| other.value_of(&v.name) != Some(v.value))
            .map(|v| match other.value_of(&v.name) {
                Some(theirs) => format!("symbol '{}': {} vs {theirs}", v.name, v.value),
                None => format!("symbol '{}' missing", v.name),
            })
    }

    fn is_same(&self, other: &EnumDescriptor) -> bool {
        self.size == other.size
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .all(|v| other.value_of(&v.name) == Some(v.value))
    }
}

/// Enum symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Symbol name.
    pub name: String,
    /// Integer value.
    pub value: i64,
}

impl EnumValue {
    /// Create enum symbol.
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

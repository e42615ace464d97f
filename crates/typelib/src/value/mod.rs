// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Values: a memory address bound to a type descriptor.
//!
//! # Memory contract
//!
//! A [`Value`] does not manage its memory. For as long as a Value is used,
//! its address must point to at least `ty().size()` readable and writable
//! bytes. This is not checked for bound memory: binding a dangling or short
//! region is undefined behavior, which is why [`Value::bind`] and
//! [`Value::pointee`] are `unsafe`.
//!
//! [`Value::allocate`] hands out memory together with an ownership token.
//! Every Value derived from an allocated one (clones, fields, elements)
//! holds a share of that token, so it stays valid after the
//! [`OwnedValue`] itself is dropped.
//!
//! Values are neither `Send` nor `Sync`. Two Values over overlapping memory
//! race like raw pointers would; callers serialize access themselves.

mod buffer;
pub(crate) mod scalar;

pub use buffer::{Buffer, OwnedValue};
pub use scalar::{Primitive, Scalar};

use crate::config::{CsvOptions, SwapPolicy};
use crate::error::{Error, Result};
use crate::ops;
use crate::types::{Category, NumericKind, TypeKind, TypeRef, POINTER_SIZE};
use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

/// Binding of an address to a type.
#[derive(Clone)]
pub struct Value {
    data: NonNull<u8>,
    ty: TypeRef,
    /// Backing allocation, for values reached from [`Value::allocate`].
    owner: Option<Rc<Buffer>>,
}

impl Value {
    /// Bind an existing address. No copy, no ownership transfer.
    ///
    /// # Safety
    ///
    /// `data` must point to at least `ty.size()` readable and writable bytes
    /// for as long as the returned Value (or any Value derived from it) is
    /// used.
    pub unsafe fn bind(data: NonNull<u8>, ty: TypeRef) -> Self {
        Self {
            data,
            ty,
            owner: None,
        }
    }

    /// Allocate a buffer for `ty` and bind it.
    ///
    /// The buffer is zeroed, or a copy of `initial`, which must be exactly
    /// `ty.size()` bytes long.
    pub fn allocate(ty: &TypeRef, initial: Option<&[u8]>) -> Result<OwnedValue> {
        if let Some(bytes) = initial {
            if bytes.len() != ty.size() {
                return Err(Error::SizeMismatch {
                    op: "allocate",
                    type_name: ty.name().to_string(),
                    expected: ty.size(),
                    actual: bytes.len(),
                });
            }
        }

        let buffer = Buffer::zeroed(ty.size(), ty.alignment())?;
        if let Some(bytes) = initial {
            // SAFETY: the buffer holds exactly `bytes.len()` bytes and is fresh.
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), buffer.as_ptr().as_ptr(), bytes.len());
            }
        }
        let buffer = Rc::new(buffer);
        let value = Self {
            data: buffer.as_ptr(),
            ty: ty.clone(),
            owner: Some(buffer.clone()),
        };
        Ok(OwnedValue::new(value, buffer))
    }

    /// Bound address.
    pub fn data(&self) -> *mut u8 {
        self.data.as_ptr()
    }

    /// Bound descriptor.
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Size of the bound region.
    pub fn size(&self) -> usize {
        self.ty.size()
    }

    /// Category of the bound descriptor.
    pub fn category(&self) -> Category {
        self.ty.category()
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        // SAFETY: memory contract (module docs).
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.ty.size()) }
    }

    pub(crate) fn write_bytes(&self, offset: usize, bytes: &[u8]) {
        debug_assert!(offset + bytes.len() <= self.ty.size());
        // SAFETY: memory contract; the range lies inside the bound region.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.data.as_ptr().add(offset), bytes.len());
        }
    }

    /// Overwrite the bound region with zeros.
    pub fn zero(&self) {
        // SAFETY: memory contract.
        unsafe { std::ptr::write_bytes(self.data.as_ptr(), 0, self.ty.size()) };
    }

    /// Copy of exactly `size()` bytes.
    pub fn to_byte_array(&self) -> Vec<u8> {
        self.bytes().to_vec()
    }

    fn child(&self, offset: usize, ty: TypeRef) -> Value {
        // SAFETY: offset + ty.size() lies inside the parent region.
        let data = unsafe { NonNull::new_unchecked(self.data.as_ptr().add(offset)) };
        Value {
            data,
            ty,
            owner: self.owner.clone(),
        }
    }

    /// Value of a compound field, at its offset.
    pub fn field(&self, name: &str) -> Result<Value> {
        let fields = self.ty.fields().ok_or_else(|| {
            Error::category_mismatch("field", self.ty.name(), "compound", self.category())
        })?;
        let field = fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::FieldNotFound {
                op: "field",
                type_name: self.ty.name().to_string(),
                field: name.to_string(),
            })?;
        Ok(self.child(field.offset, field.ty.clone()))
    }

    /// Value of an array element.
    pub fn element(&self, index: usize) -> Result<Value> {
        let arr = self.ty.array_descriptor().ok_or_else(|| {
            Error::category_mismatch("element", self.ty.name(), "array", self.category())
        })?;
        if index >= arr.count {
            return Err(Error::IndexOutOfBounds {
                op: "element",
                type_name: self.ty.name().to_string(),
                index,
                length: arr.count,
            });
        }
        Ok(self.child(index * arr.element.size(), arr.element.clone()))
    }

    /// Address stored in a pointer value.
    pub fn pointer_address(&self) -> Result<usize> {
        if self.category() != Category::Pointer {
            return Err(Error::category_mismatch(
                "pointer_address",
                self.ty.name(),
                "pointer",
                self.category(),
            ));
        }
        let mut raw = [0u8; POINTER_SIZE];
        raw.copy_from_slice(self.bytes());
        Ok(usize::from_ne_bytes(raw))
    }

    /// Check whether a pointer value holds the null address.
    pub fn is_null_pointer(&self) -> Result<bool> {
        self.pointer_address().map(|addr| addr == 0)
    }

    /// Follow a pointer value. `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// The stored address must satisfy the memory contract for the
    /// indirected type.
    pub unsafe fn pointee(&self) -> Result<Option<Value>> {
        let TypeKind::Pointer(target) = self.ty.kind() else {
            return Err(Error::category_mismatch(
                "pointee",
                self.ty.name(),
                "pointer",
                self.category(),
            ));
        };
        let addr = self.pointer_address()?;
        Ok(NonNull::new(addr as *mut u8).map(|data| Value {
            data,
            ty: target.clone(),
            owner: None,
        }))
    }

    /// Decode a numeric or enum leaf.
    pub fn read(&self) -> Result<Scalar> {
        scalar::decode("read", &self.ty, self.bytes())
    }

    /// Encode a scalar into a numeric or enum leaf.
    pub fn write(&self, v: impl Into<Scalar>) -> Result<()> {
        let bytes = scalar::encode("write", &self.ty, &v.into())?;
        self.write_bytes(0, &bytes);
        Ok(())
    }

    /// Read a leaf whose encoding and width match `T` exactly.
    pub fn get<T: Primitive>(&self) -> Result<T> {
        self.check_primitive::<T>("get")?;
        let scalar = self.read()?;
        T::from_scalar(&scalar).ok_or_else(|| self.primitive_mismatch::<T>("get"))
    }

    /// Write a leaf whose encoding and width match `T` exactly.
    pub fn set<T: Primitive>(&self, v: T) -> Result<()> {
        self.check_primitive::<T>("set")?;
        let bytes = scalar::encode("set", &self.ty, &v.into_scalar())?;
        self.write_bytes(0, &bytes);
        Ok(())
    }

    fn check_primitive<T: Primitive>(&self, op: &'static str) -> Result<()> {
        let fits = match self.ty.kind() {
            TypeKind::Numeric(kind) => *kind == T::KIND,
            TypeKind::Enum(_) => T::KIND == NumericKind::Signed,
            _ => false,
        };
        if fits && self.ty.size() == std::mem::size_of::<T>() {
            Ok(())
        } else {
            Err(self.primitive_mismatch::<T>(op))
        }
    }

    fn primitive_mismatch<T: Primitive>(&self, op: &'static str) -> Error {
        Error::TypeMismatch {
            op,
            type_name: self.ty.name().to_string(),
            expected: format!("{} ({} bytes)", self.category(), self.ty.size()),
            found: format!("{} ({} bytes)", T::KIND, std::mem::size_of::<T>()),
        }
    }

    /// Raw byte comparison with another value of the same type.
    ///
    /// Comparing values of different types is a caller error (not checked).
    pub fn memory_equal(&self, other: &Value) -> bool {
        ops::memory_equal(self, other)
    }

    /// Reverse byte order of every numeric leaf, in place.
    pub fn endian_swap(&self, policy: SwapPolicy) {
        ops::endian_swap(self, policy);
    }

    /// One-line rendering of every leaf, joined with `separator`.
    pub fn to_csv(&self, separator: &str) -> String {
        let options = CsvOptions {
            separator: separator.to_string(),
            ..CsvOptions::default()
        };
        ops::csv_values(self, &options)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("data", &self.data)
            .field("type", &self.ty.name())
            .field("owned", &self.owner.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::types::{CompoundBuilder, EnumBuilder, Type};

    fn struct_a(registry: &Registry) -> TypeRef {
        let i = registry.resolve("int32_t").unwrap();
        registry
            .register(
                CompoundBuilder::new("A")
                    .field("a", &i)
                    .field("b", &i)
                    .field("c", &i)
                    .field("d", &i)
                    .build()
                    .unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_allocate_is_zeroed() {
        let registry = Registry::with_builtins();
        let a = struct_a(&registry);
        let v = Value::allocate(&a, None).unwrap();
        assert_eq!(v.to_byte_array(), vec![0u8; 16]);
    }

    #[test]
    fn test_allocate_initial_bytes() {
        let registry = Registry::with_builtins();
        let i = registry.resolve("int32_t").unwrap();
        let v = Value::allocate(&i, Some(&7i32.to_ne_bytes()[..])).unwrap();
        assert_eq!(v.get::<i32>().unwrap(), 7);

        let err = Value::allocate(&i, Some(&[1, 2, 3][..])).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                op: "allocate",
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_field_access() {
        let registry = Registry::with_builtins();
        let a = struct_a(&registry);
        let v = Value::allocate(&a, None).unwrap();
        for (name, x) in [("a", 10), ("b", 20), ("c", 30), ("d", 40)] {
            v.field(name).unwrap().set(x).unwrap();
        }
        let bytes = v.to_byte_array();
        assert_eq!(&bytes[4..8], &20i32.to_ne_bytes());
        assert_eq!(v.field("d").unwrap().get::<i32>().unwrap(), 40);

        assert!(matches!(
            v.field("e"),
            Err(Error::FieldNotFound { op: "field", .. })
        ));
        assert!(matches!(
            v.field("a").unwrap().field("x"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_element_bounds() {
        let registry = Registry::with_builtins();
        let f = registry.resolve("float").unwrap();
        let arr = registry.register(Type::array(&f, 3).unwrap()).unwrap();
        let v = Value::allocate(&arr, None).unwrap();
        v.element(2).unwrap().set(1.5f32).unwrap();
        assert_eq!(v.element(2).unwrap().get::<f32>().unwrap(), 1.5);
        assert!(matches!(
            v.element(3),
            Err(Error::IndexOutOfBounds {
                index: 3,
                length: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_typed_access_checks_width() {
        let registry = Registry::with_builtins();
        let i = registry.resolve("int16_t").unwrap();
        let v = Value::allocate(&i, None).unwrap();
        assert!(v.set(5i32).is_err());
        assert!(v.set(5u16).is_err());
        v.set(5i16).unwrap();
        assert_eq!(v.read().unwrap(), Scalar::I16(5));
        // Untyped write converts with a range check
        v.write(300i64).unwrap();
        assert_eq!(v.get::<i16>().unwrap(), 300);
        assert!(v.write(70_000i64).is_err());
    }

    #[test]
    fn test_enum_access() {
        let registry = Registry::with_builtins();
        let e = registry
            .register(
                EnumBuilder::new("INPUT_OUTPUT_MODE")
                    .symbol_value("INPUT", 1)
                    .symbol("OUTPUT")
                    .symbol("BOTH")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let v = Value::allocate(&e, None).unwrap();
        v.write("BOTH").unwrap();
        assert_eq!(v.get::<i32>().unwrap(), 3);
        assert_eq!(v.read().unwrap().enum_symbol(), Some("BOTH"));
    }

    #[test]
    fn test_zero() {
        let registry = Registry::with_builtins();
        let a = struct_a(&registry);
        let v = Value::allocate(&a, Some(&[0xff; 16][..])).unwrap();
        v.zero();
        assert_eq!(v.to_byte_array(), vec![0u8; 16]);
    }

    #[test]
    fn test_pointer_follow() {
        let registry = Registry::with_builtins();
        let a = struct_a(&registry);
        let ptr = registry.register(Type::pointer(&a)).unwrap();

        let target = Value::allocate(&a, None).unwrap();
        target.field("c").unwrap().set(30i32).unwrap();

        let p = Value::allocate(&ptr, Some(&(target.data() as usize).to_ne_bytes()[..])).unwrap();
        assert!(!p.is_null_pointer().unwrap());
        // SAFETY: `target` outlives the dereferenced value.
        let followed = unsafe { p.pointee() }.unwrap().unwrap();
        assert_eq!(followed.field("c").unwrap().get::<i32>().unwrap(), 30);

        let null = Value::allocate(&ptr, None).unwrap();
        assert!(null.is_null_pointer().unwrap());
        // SAFETY: null pointers are never dereferenced.
        assert!(unsafe { null.pointee() }.unwrap().is_none());
    }

    #[test]
    fn test_rebind_round_trip() {
        let registry = Registry::with_builtins();
        let a = struct_a(&registry);
        let bytes: Vec<u8> = (0u8..16).collect();
        let v = Value::allocate(&a, Some(bytes.as_slice())).unwrap();
        // SAFETY: `v` keeps the buffer alive.
        let again = unsafe { Value::bind(NonNull::new(v.data()).unwrap(), v.ty().clone()) };
        assert_eq!(again.to_byte_array(), bytes);
    }

    #[test]
    fn test_derived_values_keep_buffer_alive() {
        let registry = Registry::with_builtins();
        let a = struct_a(&registry);
        let bytes: Vec<u8> = (0u8..16).collect();
        let owned = Value::allocate(&a, Some(bytes.as_slice())).unwrap();
        let copy = owned.value().clone();
        let c = owned.field("c").unwrap();
        assert_eq!(Rc::strong_count(owned.buffer()), 4);
        drop(owned);

        assert_eq!(copy.to_byte_array(), bytes);
        c.set(-1i32).unwrap();
        assert_eq!(copy.field("c").unwrap().get::<i32>().unwrap(), -1);

        let (value, buffer) = Value::allocate(&a, None).unwrap().into_parts();
        drop(buffer);
        assert_eq!(value.to_byte_array(), vec![0; 16]);
    }
}

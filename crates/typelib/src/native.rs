// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversion of leaf values into a host representation.
//!
//! A host installs one [`ConversionHook`] in a [`Converter`] at startup.
//! [`Converter::to_native`] hands numeric, enum and `char[N]` values to the
//! hook; everything else (and anything the hook declines) comes back as the
//! original [`Value`].
//!
//! ```
//! use typelib::native::{Converter, Native, ScalarHook};
//! use typelib::{Registry, Scalar, Value};
//!
//! let registry = Registry::with_builtins();
//! let int = registry.resolve("int32_t").unwrap();
//! let v = Value::allocate(&int, Some(&42i32.to_ne_bytes()[..])).unwrap();
//!
//! let converter = Converter::new(ScalarHook);
//! assert!(matches!(converter.to_native(&v), Native::Host(Scalar::I32(42))));
//! ```

use crate::types::{Type, TypeKind};
use crate::value::{Scalar, Value};
use std::fmt;
use std::marker::PhantomData;

/// Result of a conversion: the host literal, or the value itself.
#[derive(Debug, Clone)]
pub enum Native<H> {
    Host(H),
    Value(Value),
}

impl<H> Native<H> {
    /// The host literal, if the value was converted.
    pub fn host(self) -> Option<H> {
        match self {
            Self::Host(h) => Some(h),
            Self::Value(_) => None,
        }
    }

    /// The untouched value, if it was not converted.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Host(_) => None,
            Self::Value(v) => Some(v),
        }
    }

    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host(_))
    }
}

/// Host-side literal conversion.
pub trait ConversionHook {
    /// Host literal type.
    type Host;

    /// Convert a leaf. Return `None` to keep the value as is.
    fn convert(&self, value: &Value) -> Option<Self::Host>;
}

/// [`ConversionHook`] backed by a closure.
pub struct FnHook<F, H> {
    f: F,
    _host: PhantomData<fn() -> H>,
}

impl<F, H> FnHook<F, H>
where
    F: Fn(&Value) -> Option<H>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _host: PhantomData,
        }
    }
}

impl<F, H> ConversionHook for FnHook<F, H>
where
    F: Fn(&Value) -> Option<H>,
{
    type Host = H;

    fn convert(&self, value: &Value) -> Option<H> {
        (self.f)(value)
    }
}

impl<F, H> fmt::Debug for FnHook<F, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHook").finish_non_exhaustive()
    }
}

/// Built-in hook producing [`Scalar`]s.
///
/// Numerics and enums decode to the matching variant; `char[N]` decodes to
/// [`Scalar::Str`] holding the bytes up to the first NUL (invalid UTF-8 is
/// replaced).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarHook;

impl ConversionHook for ScalarHook {
    type Host = Scalar;

    fn convert(&self, value: &Value) -> Option<Scalar> {
        match value.ty().kind() {
            TypeKind::Numeric(_) | TypeKind::Enum(_) => value.read().ok(),
            TypeKind::Array(_) => c_string(value).map(Scalar::Str),
            _ => None,
        }
    }
}

/// Converter with its hook installed once.
#[derive(Debug, Clone)]
pub struct Converter<K> {
    hook: K,
}

impl<K: ConversionHook> Converter<K> {
    pub fn new(hook: K) -> Self {
        Self { hook }
    }

    pub fn hook(&self) -> &K {
        &self.hook
    }

    /// Convert `value` when it is a leaf the hook accepts.
    pub fn to_native(&self, value: &Value) -> Native<K::Host> {
        if !is_convertible(value.ty()) {
            return Native::Value(value.clone());
        }
        match self.hook.convert(value) {
            Some(host) => Native::Host(host),
            None => Native::Value(value.clone()),
        }
    }
}

impl Default for Converter<ScalarHook> {
    fn default() -> Self {
        Self::new(ScalarHook)
    }
}

/// Numeric, enum and `char[N]` types go through the hook.
pub fn is_convertible(ty: &Type) -> bool {
    match ty.kind() {
        TypeKind::Numeric(_) | TypeKind::Enum(_) => true,
        TypeKind::Array(arr) => arr.element.is_char(),
        TypeKind::Compound(_) | TypeKind::Pointer(_) | TypeKind::Opaque | TypeKind::Null => false,
    }
}

/// Text of a `char[N]` value up to the first NUL.
pub fn c_string(value: &Value) -> Option<String> {
    let arr = value.ty().array_descriptor()?;
    if !arr.element.is_char() {
        return None;
    }
    let bytes = value.bytes();
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

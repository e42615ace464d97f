// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalar leaves: decoding and encoding numeric and enum memory.

use crate::error::{Error, Result};
use crate::types::{EnumDescriptor, NumericKind, Type, TypeKind};
use std::fmt;

/// A decoded leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Enum value with its symbol, when the descriptor declares one.
    Enum {
        value: i64,
        symbol: Option<String>,
    },
    /// String-like leaf (`char[N]` content up to the first NUL).
    Str(String),
}

impl Scalar {
    /// Integer view (integers and enums).
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Self::I8(v) => Some(v.into()),
            Self::I16(v) => Some(v.into()),
            Self::I32(v) => Some(v.into()),
            Self::I64(v) => Some(v.into()),
            Self::U8(v) => Some(v.into()),
            Self::U16(v) => Some(v.into()),
            Self::U32(v) => Some(v.into()),
            Self::U64(v) => Some(v.into()),
            Self::Enum { value, .. } => Some(value.into()),
            Self::F32(_) | Self::F64(_) | Self::Str(_) => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    /// Try to get as u64.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|v| u64::try_from(v).ok())
    }

    /// Floating point view (floats and integers).
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F32(v) => Some(v.into()),
            Self::F64(v) => Some(v),
            _ => self.as_i128().map(|v| v as f64),
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            Self::Enum {
                symbol: Some(s), ..
            } => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get enum symbol.
    pub fn enum_symbol(&self) -> Option<&str> {
        match self {
            Self::Enum { symbol, .. } => symbol.as_deref(),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::I8(_) | Self::I16(_) | Self::I32(_) | Self::I64(_) => "signed integer",
            Self::U8(_) | Self::U16(_) | Self::U32(_) | Self::U64(_) => "unsigned integer",
            Self::F32(_) | Self::F64(_) => "float",
            Self::Enum { .. } => "enum",
            Self::Str(_) => "string",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            // Debug keeps the fractional part: 0.0, 0.1, 9.9
            Self::F32(v) => write!(f, "{v:?}"),
            Self::F64(v) => write!(f, "{v:?}"),
            Self::Enum {
                symbol: Some(s), ..
            } => write!(f, "{s}"),
            Self::Enum { value, .. } => write!(f, "{value}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

fn decode_signed(bytes: &[u8]) -> i64 {
    match bytes.len() {
        1 => i8::from_ne_bytes(array(bytes)).into(),
        2 => i16::from_ne_bytes(array(bytes)).into(),
        4 => i32::from_ne_bytes(array(bytes)).into(),
        _ => i64::from_ne_bytes(array(bytes)),
    }
}

/// Decode the leaf at `bytes` (exactly `ty.size()` long).
pub(crate) fn decode(op: &'static str, ty: &Type, bytes: &[u8]) -> Result<Scalar> {
    match ty.kind() {
        TypeKind::Numeric(kind) => Ok(decode_numeric(*kind, bytes)),
        TypeKind::Enum(desc) => Ok(decode_enum(desc, bytes)),
        _ => Err(Error::category_mismatch(
            op,
            ty.name(),
            "numeric or enum",
            ty.category(),
        )),
    }
}

/// Decode a numeric leaf; the width is `bytes.len()`.
pub(crate) fn decode_numeric(kind: NumericKind, bytes: &[u8]) -> Scalar {
    match (kind, bytes.len()) {
        (NumericKind::Signed, 1) => Scalar::I8(i8::from_ne_bytes(array(bytes))),
        (NumericKind::Signed, 2) => Scalar::I16(i16::from_ne_bytes(array(bytes))),
        (NumericKind::Signed, 4) => Scalar::I32(i32::from_ne_bytes(array(bytes))),
        (NumericKind::Signed, _) => Scalar::I64(i64::from_ne_bytes(array(bytes))),
        (NumericKind::Unsigned, 1) => Scalar::U8(bytes[0]),
        (NumericKind::Unsigned, 2) => Scalar::U16(u16::from_ne_bytes(array(bytes))),
        (NumericKind::Unsigned, 4) => Scalar::U32(u32::from_ne_bytes(array(bytes))),
        (NumericKind::Unsigned, _) => Scalar::U64(u64::from_ne_bytes(array(bytes))),
        (NumericKind::Float, 4) => Scalar::F32(f32::from_ne_bytes(array(bytes))),
        (NumericKind::Float, _) => Scalar::F64(f64::from_ne_bytes(array(bytes))),
    }
}

/// Decode an enum leaf, attaching its symbol when one matches.
pub(crate) fn decode_enum(desc: &EnumDescriptor, bytes: &[u8]) -> Scalar {
    let value = decode_signed(bytes);
    Scalar::Enum {
        value,
        symbol: desc.symbol_of(value).map(str::to_string),
    }
}

/// Encode `scalar` into the native representation of `ty`.
///
/// Integers are range-checked against the target width, floats are
/// narrowed with `as`, enum symbols are looked up in the descriptor.
pub(crate) fn encode(op: &'static str, ty: &Type, scalar: &Scalar) -> Result<Vec<u8>> {
    let size = ty.size();
    let mismatch = |expected: &str| Error::TypeMismatch {
        op,
        type_name: ty.name().to_string(),
        expected: expected.to_string(),
        found: scalar.describe().to_string(),
    };

    match ty.kind() {
        TypeKind::Numeric(NumericKind::Float) => {
            let v = scalar.as_f64().ok_or_else(|| mismatch("number"))?;
            Ok(if size == 4 {
                (v as f32).to_ne_bytes().to_vec()
            } else {
                v.to_ne_bytes().to_vec()
            })
        }
        TypeKind::Numeric(kind) => {
            let v = scalar.as_i128().ok_or_else(|| mismatch("integer"))?;
            encode_integer(op, ty, *kind == NumericKind::Signed, v)
        }
        TypeKind::Enum(desc) => {
            let v = match scalar {
                Scalar::Str(symbol) => desc.value_of(symbol).ok_or_else(|| {
                    Error::invalid(op, format!("'{}' has no symbol '{symbol}'", ty.name()))
                })?,
                other => other.as_i64().ok_or_else(|| mismatch("enum value or symbol"))?,
            };
            encode_integer(op, ty, true, v.into())
        }
        _ => Err(Error::category_mismatch(
            op,
            ty.name(),
            "numeric or enum",
            ty.category(),
        )),
    }
}

fn encode_integer(op: &'static str, ty: &Type, signed: bool, v: i128) -> Result<Vec<u8>> {
    let bits = ty.size() * 8;
    let (min, max) = if signed {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    } else {
        (0, (1i128 << bits) - 1)
    };
    if v < min || v > max {
        return Err(Error::invalid(
            op,
            format!("{v} does not fit '{}' ({min}..={max})", ty.name()),
        ));
    }
    Ok(match (signed, ty.size()) {
        (true, 1) => (v as i8).to_ne_bytes().to_vec(),
        (true, 2) => (v as i16).to_ne_bytes().to_vec(),
        (true, 4) => (v as i32).to_ne_bytes().to_vec(),
        (true, _) => (v as i64).to_ne_bytes().to_vec(),
        (false, 1) => (v as u8).to_ne_bytes().to_vec(),
        (false, 2) => (v as u16).to_ne_bytes().to_vec(),
        (false, 4) => (v as u32).to_ne_bytes().to_vec(),
        (false, _) => (v as u64).to_ne_bytes().to_vec(),
    })
}

mod sealed {
    pub trait Sealed {}
}

/// Rust primitives readable and writable through a [`Value`](crate::Value).
pub trait Primitive: Copy + sealed::Sealed {
    /// Matching numeric encoding.
    const KIND: NumericKind;

    /// Convert from a decoded scalar.
    fn from_scalar(scalar: &Scalar) -> Option<Self>;

    /// Convert into a scalar.
    fn into_scalar(self) -> Scalar;
}

macro_rules! impl_primitive {
    ($ty:ty, $variant:ident, $kind:expr) => {
        impl sealed::Sealed for $ty {}

        impl Primitive for $ty {
            const KIND: NumericKind = $kind;

            fn from_scalar(scalar: &Scalar) -> Option<Self> {
                match scalar {
                    Scalar::$variant(v) => Some(*v),
                    Scalar::Enum { value, .. } => <$ty>::try_from(*value).ok(),
                    _ => None,
                }
            }

            fn into_scalar(self) -> Scalar {
                Scalar::$variant(self)
            }
        }

        impl From<$ty> for Scalar {
            fn from(v: $ty) -> Self {
                Scalar::$variant(v)
            }
        }
    };
}

impl_primitive!(i8, I8, NumericKind::Signed);
impl_primitive!(i16, I16, NumericKind::Signed);
impl_primitive!(i32, I32, NumericKind::Signed);
impl_primitive!(i64, I64, NumericKind::Signed);
impl_primitive!(u8, U8, NumericKind::Unsigned);
impl_primitive!(u16, U16, NumericKind::Unsigned);
impl_primitive!(u32, U32, NumericKind::Unsigned);
impl_primitive!(u64, U64, NumericKind::Unsigned);

macro_rules! impl_float_primitive {
    ($ty:ty, $variant:ident) => {
        impl sealed::Sealed for $ty {}

        impl Primitive for $ty {
            const KIND: NumericKind = NumericKind::Float;

            fn from_scalar(scalar: &Scalar) -> Option<Self> {
                match scalar {
                    Scalar::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn into_scalar(self) -> Scalar {
                Scalar::$variant(self)
            }
        }

        impl From<$ty> for Scalar {
            fn from(v: $ty) -> Self {
                Scalar::$variant(v)
            }
        }
    };
}

impl_float_primitive!(f32, F32);
impl_float_primitive!(f64, F64);

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

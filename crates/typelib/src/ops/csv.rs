// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CSV flattening.
//!
//! A type is walked depth-first and every leaf yields one token: fields in
//! declaration order, elements in index order. The header form names each
//! leaf by its path (`X.field`, `X[i]`, `X[0].field`); the value form
//! renders what the leaf holds. Both forms walk the same leaves, so their
//! tokens line up.
//!
//! Leaf rendering:
//!
//! | Category | Header | Value                                  |
//! |----------|--------|----------------------------------------|
//! | Numeric  | path   | decimal, floats always fractional      |
//! | Enum     | path   | symbol, or the integer when unnamed    |
//! | Pointer  | path   | `0x...` address or the null marker     |
//! | Opaque   | path   | placeholder                            |
//! | Null     | none   | none                                   |

use crate::config::CsvOptions;
use crate::error::{Error, Result};
use crate::types::{Type, TypeKind, POINTER_SIZE};
use crate::value::scalar::{self, Scalar};
use crate::value::Value;

/// Header line for `ty`. An empty `basename` drops the leading segment
/// (`.field`, `[0]`).
pub fn csv_header(ty: &Type, basename: &str, options: &CsvOptions) -> String {
    let mut tokens = Vec::new();
    header_tokens(ty, basename.to_string(), &mut tokens);
    tokens.join(&options.separator)
}

/// Value line for a bound value.
pub fn csv_values(value: &Value, options: &CsvOptions) -> String {
    let mut tokens = Vec::new();
    value_tokens(value.ty(), value.bytes(), options, &mut tokens);
    tokens.join(&options.separator)
}

/// Value line for an untyped buffer holding exactly `ty.size()` bytes.
pub fn csv_values_of(ty: &Type, bytes: &[u8], options: &CsvOptions) -> Result<String> {
    if bytes.len() != ty.size() {
        return Err(Error::SizeMismatch {
            op: "csv_values_of",
            type_name: ty.name().to_string(),
            expected: ty.size(),
            actual: bytes.len(),
        });
    }
    let mut tokens = Vec::new();
    value_tokens(ty, bytes, options, &mut tokens);
    Ok(tokens.join(&options.separator))
}

fn header_tokens(ty: &Type, path: String, out: &mut Vec<String>) {
    match ty.kind() {
        TypeKind::Compound(fields) => {
            for field in fields {
                header_tokens(&field.ty, format!("{path}.{}", field.name), out);
            }
        }
        TypeKind::Array(arr) => {
            for i in 0..arr.count {
                header_tokens(&arr.element, format!("{path}[{i}]"), out);
            }
        }
        TypeKind::Null => {}
        TypeKind::Numeric(_) | TypeKind::Enum(_) | TypeKind::Pointer(_) | TypeKind::Opaque => {
            out.push(path)
        }
    }
}

fn value_tokens(ty: &Type, bytes: &[u8], options: &CsvOptions, out: &mut Vec<String>) {
    match ty.kind() {
        TypeKind::Compound(fields) => {
            for field in fields {
                let end = field.offset + field.ty.size();
                value_tokens(&field.ty, &bytes[field.offset..end], options, out);
            }
        }
        TypeKind::Array(arr) => {
            let width = arr.element.size();
            if width == 0 {
                // Zero-sized elements still yield their (empty) leaves
                for _ in 0..arr.count {
                    value_tokens(&arr.element, &[], options, out);
                }
            } else {
                for chunk in bytes.chunks_exact(width).take(arr.count) {
                    value_tokens(&arr.element, chunk, options, out);
                }
            }
        }
        TypeKind::Numeric(kind) => out.push(scalar::decode_numeric(*kind, bytes).to_string()),
        TypeKind::Enum(desc) => out.push(match scalar::decode_enum(desc, bytes) {
            Scalar::Enum { value, .. } if !options.enum_symbols => value.to_string(),
            leaf => leaf.to_string(),
        }),
        TypeKind::Pointer(_) => {
            let mut raw = [0u8; POINTER_SIZE];
            raw.copy_from_slice(&bytes[..POINTER_SIZE]);
            match usize::from_ne_bytes(raw) {
                0 => out.push(options.null_marker.clone()),
                addr => out.push(format!("{addr:#x}")),
            }
        }
        TypeKind::Opaque => out.push(options.opaque_placeholder.clone()),
        TypeKind::Null => {}
    }
}

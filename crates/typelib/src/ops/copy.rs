// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked copies between typed values and untyped buffers.
//!
//! Endpoint capacities:
//!
//! - byte buffer: its length
//! - Array value: `count * element.size()`
//! - Pointer value: unbounded, the copy goes to the stored address (the
//!   caller vouches for the memory behind it); a null address is rejected
//! - anything else: rejected
//!
//! Both capacities are checked before the first byte moves.

use crate::error::{Error, Result};
use crate::types::TypeKind;
use crate::value::Value;
use std::ptr;

const OP: &str = "typed_copy";

/// Copy destination.
#[derive(Debug)]
pub enum CopyTarget<'a> {
    Bytes(&'a mut [u8]),
    Value(&'a Value),
}

/// Copy source.
#[derive(Debug, Clone, Copy)]
pub enum CopySource<'a> {
    Bytes(&'a [u8]),
    Value(&'a Value),
}

impl<'a> From<&'a mut [u8]> for CopyTarget<'a> {
    fn from(bytes: &'a mut [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a mut Vec<u8>> for CopyTarget<'a> {
    fn from(bytes: &'a mut Vec<u8>) -> Self {
        Self::Bytes(bytes.as_mut_slice())
    }
}

impl<'a> From<&'a Value> for CopyTarget<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Value(value)
    }
}

impl<'a> From<&'a [u8]> for CopySource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for CopySource<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Bytes(bytes.as_slice())
    }
}

impl<'a> From<&'a Value> for CopySource<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Value(value)
    }
}

/// Copy `count` bytes from `from` into `to` and hand the destination back.
///
/// Fails with `BufferTooSmall` when `count` exceeds either capacity and with
/// `InvalidArgument` for an unsupported or null endpoint; nothing is written
/// on failure. Overlapping regions are handled.
///
/// A `Pointer` endpoint addresses the memory the pointer refers to, not the
/// pointer slot inside its own value: copying into a `char*` value writes
/// through the stored address. Its capacity is unknown, so only the other
/// endpoint bounds `count`. Bind the pointer slot itself as an array of
/// bytes to overwrite the address.
pub fn typed_copy<'a, 'b>(
    to: impl Into<CopyTarget<'a>>,
    from: impl Into<CopySource<'b>>,
    count: usize,
) -> Result<CopyTarget<'a>> {
    let mut to = to.into();
    let from = from.into();

    let (dst, dst_capacity) = match &mut to {
        CopyTarget::Bytes(bytes) => (bytes.as_mut_ptr(), bytes.len()),
        CopyTarget::Value(value) => region("destination", value)?,
    };
    let (src, src_capacity) = match from {
        CopySource::Bytes(bytes) => (bytes.as_ptr(), bytes.len()),
        CopySource::Value(value) => {
            let (ptr, capacity) = region("source", value)?;
            (ptr.cast_const(), capacity)
        }
    };

    check_capacity("destination", count, dst_capacity)?;
    check_capacity("source", count, src_capacity)?;

    // SAFETY: both regions hold at least `count` bytes (checked above, or
    // vouched for by the caller for pointer endpoints); `copy` allows overlap.
    unsafe { ptr::copy(src, dst, count) };
    Ok(to)
}

fn region(endpoint: &'static str, value: &Value) -> Result<(*mut u8, usize)> {
    match value.ty().kind() {
        TypeKind::Array(arr) => Ok((value.data(), arr.byte_len())),
        TypeKind::Pointer(_) => match value.pointer_address()? {
            0 => {
                log::debug!("[copy] rejected: {endpoint} '{}' is null", value.ty().name());
                Err(Error::invalid(
                    OP,
                    format!("{endpoint} '{}' is a null pointer", value.ty().name()),
                ))
            }
            addr => Ok((addr as *mut u8, usize::MAX)),
        },
        _ => {
            log::debug!(
                "[copy] rejected: {endpoint} '{}' is {}",
                value.ty().name(),
                value.category()
            );
            Err(Error::invalid(
                OP,
                format!(
                    "{endpoint} must be a byte buffer, an array or a pointer, got {} '{}'",
                    value.category(),
                    value.ty().name()
                ),
            ))
        }
    }
}

fn check_capacity(endpoint: &'static str, requested: usize, capacity: usize) -> Result<()> {
    if requested > capacity {
        log::debug!("[copy] rejected: {requested} bytes exceed {endpoint} capacity {capacity}");
        return Err(Error::BufferTooSmall {
            op: OP,
            endpoint,
            requested,
            capacity,
        });
    }
    Ok(())
}

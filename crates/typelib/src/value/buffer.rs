// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Owned backing storage for allocated values.

use crate::error::{Error, Result};
use crate::value::Value;
use std::alloc::{self, Layout};
use std::ops::Deref;
use std::ptr::NonNull;
use std::rc::Rc;

/// Zero-initialized heap region aligned for the type it backs.
///
/// Freed on drop. Values produced by [`Value::allocate`] share its `Rc`, so
/// the region outlives every one of them.
pub struct Buffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Buffer {
    /// Allocate `size` zero bytes aligned to `align`.
    pub fn zeroed(size: usize, align: usize) -> Result<Self> {
        let layout = Layout::from_size_align(size, align).map_err(|e| {
            Error::invalid("allocate", format!("{size} bytes aligned to {align}: {e}"))
        })?;
        if size == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                layout,
            });
        }
        // SAFETY: layout has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        Ok(Self { ptr, layout })
    }

    /// Start of the region.
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// Returns `true` for a zero-sized buffer.
    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: allocated in `zeroed` with this exact layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("ptr", &self.ptr)
            .field("len", &self.layout.size())
            .field("align", &self.layout.align())
            .finish()
    }
}

/// A [`Value`] together with the buffer that backs it.
///
/// Dereferences to the bound `Value`. Cloning shares the buffer, and so
/// does every Value cloned or derived from it.
#[derive(Debug, Clone)]
pub struct OwnedValue {
    value: Value,
    buffer: Rc<Buffer>,
}

impl OwnedValue {
    pub(crate) fn new(value: Value, buffer: Rc<Buffer>) -> Self {
        Self { value, buffer }
    }

    /// The bound value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Ownership token for the backing memory.
    pub fn buffer(&self) -> &Rc<Buffer> {
        &self.buffer
    }

    /// Split into the value and its ownership token.
    pub fn into_parts(self) -> (Value, Rc<Buffer>) {
        (self.value, self.buffer)
    }
}

impl Deref for OwnedValue {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.value
    }
}

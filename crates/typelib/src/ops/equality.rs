// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-level value equality.

use crate::types::types_equal;
use crate::value::Value;

/// Compare the bound bytes of two values.
///
/// The caller has established that both values have the same type. Values
/// bound to the same address compare equal without reading memory; values
/// whose sizes differ never compare equal.
pub fn memory_equal(a: &Value, b: &Value) -> bool {
    if a.data() == b.data() && a.size() == b.size() {
        return true;
    }
    a.bytes() == b.bytes()
}

/// Type equality followed by [`memory_equal`].
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if !types_equal(a.ty(), b.ty()) {
        log::trace!(
            "[equality] '{}' and '{}' are not the same type",
            a.ty().name(),
            b.ty().name()
        );
        return false;
    }
    memory_equal(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn test_same_address_short_circuit() {
        let registry = Registry::with_builtins();
        let i = registry.resolve("int32_t").unwrap();
        let v = Value::allocate(&i, None).unwrap();
        let alias = v.value().clone();
        assert!(memory_equal(&v, &alias));
    }

    #[test]
    fn test_byte_comparison() {
        let registry = Registry::with_builtins();
        let i = registry.resolve("int32_t").unwrap();
        let a = Value::allocate(&i, None).unwrap();
        let b = Value::allocate(&i, None).unwrap();
        assert!(memory_equal(&a, &b));
        b.set(1i32).unwrap();
        assert!(!memory_equal(&a, &b));
        assert!(!memory_equal(&b, &a));
    }

    #[test]
    fn test_values_equal_checks_type() {
        let registry = Registry::with_builtins();
        let i = registry.resolve("int32_t").unwrap();
        let u = registry.resolve("uint32_t").unwrap();
        let a = Value::allocate(&i, None).unwrap();
        let b = Value::allocate(&u, None).unwrap();
        // Same bytes, different types
        assert!(memory_equal(&a, &b));
        assert!(!values_equal(&a, &b));
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structure-aware byte-order reversal.
//!
//! Walking a descriptor for every swap is wasteful when the same type is
//! swapped repeatedly (a stream of samples, say), so the walk is compiled
//! into a [`SwapPlan`]: a flat list of byte ranges to reverse. Adjacent
//! leaves of equal width collapse into a single run.

use crate::config::SwapPolicy;
use crate::error::{Error, Result};
use crate::types::{Type, TypeKind, POINTER_SIZE};
use crate::value::Value;

/// `count` consecutive leaves of `width` bytes starting at `offset`, each
/// reversed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRun {
    pub offset: usize,
    pub width: usize,
    pub count: usize,
}

impl SwapRun {
    fn end(&self) -> usize {
        self.offset + self.width * self.count
    }
}

/// Precompiled swap of one type under one policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    type_name: String,
    size: usize,
    runs: Vec<SwapRun>,
}

impl SwapPlan {
    /// Compile the swap for `ty`.
    pub fn compile(ty: &Type, policy: SwapPolicy) -> Self {
        let plan = Self::build(ty, policy);
        log::trace!(
            "[endian] compiled '{}': {} runs, pointers {}",
            plan.type_name,
            plan.runs.len(),
            if policy.swap_pointers { "swapped" } else { "kept" }
        );
        plan
    }

    fn collect(&mut self, ty: &Type, base: usize, policy: SwapPolicy) {
        match ty.kind() {
            TypeKind::Numeric(_) | TypeKind::Enum(_) => self.push(base, ty.size()),
            TypeKind::Pointer(_) => {
                if policy.swap_pointers {
                    self.push(base, POINTER_SIZE);
                }
            }
            TypeKind::Compound(fields) => {
                for field in fields {
                    self.collect(&field.ty, base + field.offset, policy);
                }
            }
            TypeKind::Array(arr) => {
                let width = arr.element.size();
                if arr.count == 0 || width == 0 {
                    return;
                }
                // Compile one element, then replicate it at each stride
                let element = Self::build(&arr.element, policy);
                for i in 0..arr.count {
                    for run in &element.runs {
                        for k in 0..run.count {
                            self.push(base + i * width + run.offset + k * run.width, run.width);
                        }
                    }
                }
            }
            TypeKind::Opaque | TypeKind::Null => {}
        }
    }

    fn build(ty: &Type, policy: SwapPolicy) -> Self {
        let mut plan = Self {
            type_name: ty.name().to_string(),
            size: ty.size(),
            runs: Vec::new(),
        };
        plan.collect(ty, 0, policy);
        plan
    }

    fn push(&mut self, offset: usize, width: usize) {
        if width < 2 {
            return;
        }
        if let Some(last) = self.runs.last_mut() {
            if last.width == width && last.end() == offset {
                last.count += 1;
                return;
            }
        }
        self.runs.push(SwapRun {
            offset,
            width,
            count: 1,
        });
    }

    /// Reversal runs in offset order.
    pub fn runs(&self) -> &[SwapRun] {
        &self.runs
    }

    /// Size of the type the plan was compiled for.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if applying the plan changes nothing.
    pub fn is_noop(&self) -> bool {
        self.runs.is_empty()
    }

    /// Swap an untyped buffer in place.
    pub fn apply(&self, bytes: &mut [u8]) -> Result<()> {
        if bytes.len() != self.size {
            return Err(Error::SizeMismatch {
                op: "SwapPlan::apply",
                type_name: self.type_name.clone(),
                expected: self.size,
                actual: bytes.len(),
            });
        }
        self.run(bytes);
        Ok(())
    }

    /// Swap a bound value in place.
    pub fn apply_to(&self, value: &Value) -> Result<()> {
        if value.size() != self.size {
            return Err(Error::SizeMismatch {
                op: "SwapPlan::apply_to",
                type_name: self.type_name.clone(),
                expected: self.size,
                actual: value.size(),
            });
        }
        // SAFETY: memory contract; the value covers `size` bytes.
        let bytes = unsafe { std::slice::from_raw_parts_mut(value.data(), self.size) };
        self.run(bytes);
        Ok(())
    }

    fn run(&self, bytes: &mut [u8]) {
        for run in &self.runs {
            bytes[run.offset..run.end()]
                .chunks_exact_mut(run.width)
                .for_each(<[u8]>::reverse);
        }
    }
}

/// Swap a value in place with a one-shot plan.
pub fn endian_swap(value: &Value, policy: SwapPolicy) {
    let plan = SwapPlan::compile(value.ty(), policy);
    // SAFETY: memory contract; the plan was compiled for this type.
    let bytes = unsafe { std::slice::from_raw_parts_mut(value.data(), value.size()) };
    plan.run(bytes);
}

/// Swapped copy of a value's bytes; the value is left untouched.
pub fn swapped_bytes(value: &Value, policy: SwapPolicy) -> Vec<u8> {
    let mut bytes = value.to_byte_array();
    SwapPlan::compile(value.ty(), policy).run(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::types::CompoundBuilder;

    #[test]
    fn test_leaf_swap() {
        let registry = Registry::with_builtins();
        let u = registry.resolve("uint32_t").unwrap();
        let v = Value::allocate(&u, None).unwrap();
        v.set(0x1122_3344u32).unwrap();
        endian_swap(&v, SwapPolicy::default());
        assert_eq!(v.get::<u32>().unwrap(), 0x4433_2211);
    }

    #[test]
    fn test_runs_merge() {
        let registry = Registry::with_builtins();
        let f = registry.resolve("float").unwrap();
        let arr = registry.register(Type::array(&f, 100).unwrap()).unwrap();
        let plan = SwapPlan::compile(&arr, SwapPolicy::default());
        assert_eq!(
            plan.runs(),
            &[SwapRun {
                offset: 0,
                width: 4,
                count: 100
            }]
        );
    }

    #[test]
    fn test_compound_skips_padding_and_bytes() {
        let registry = Registry::with_builtins();
        let c = registry.resolve("char").unwrap();
        let d = registry.resolve("double").unwrap();
        let s = registry
            .register(CompoundBuilder::new("S").field("tag", &c).field("x", &d).build().unwrap())
            .unwrap();
        let plan = SwapPlan::compile(&s, SwapPolicy::default());
        assert_eq!(
            plan.runs(),
            &[SwapRun {
                offset: 8,
                width: 8,
                count: 1
            }]
        );
    }

    #[test]
    fn test_pointer_policy() {
        let registry = Registry::with_builtins();
        let i = registry.resolve("int32_t").unwrap();
        let p = registry.register(Type::pointer(&i)).unwrap();
        assert!(SwapPlan::compile(&p, SwapPolicy::data_only()).is_noop());
        let plan = SwapPlan::compile(&p, SwapPolicy::with_pointers());
        assert_eq!(plan.runs()[0].width, POINTER_SIZE);
    }

    #[test]
    fn test_opaque_untouched() {
        let registry = Registry::with_builtins();
        let blob = registry.register(Type::opaque("Blob", 4)).unwrap();
        let v = Value::allocate(&blob, Some(&[1, 2, 3, 4][..])).unwrap();
        endian_swap(&v, SwapPolicy::with_pointers());
        assert_eq!(v.to_byte_array(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_apply_checks_length() {
        let registry = Registry::with_builtins();
        let i = registry.resolve("int16_t").unwrap();
        let plan = SwapPlan::compile(&i, SwapPolicy::default());
        let mut ok = [1u8, 2];
        plan.apply(&mut ok).unwrap();
        assert_eq!(ok, [2, 1]);
        let mut short = [1u8];
        assert!(matches!(
            plan.apply(&mut short),
            Err(Error::SizeMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_swapped_bytes_leaves_value() {
        let registry = Registry::with_builtins();
        let i = registry.resolve("int16_t").unwrap();
        let v = Value::allocate(&i, Some(&[1u8, 2][..])).unwrap();
        assert_eq!(swapped_bytes(&v, SwapPolicy::default()), vec![2, 1]);
        assert_eq!(v.to_byte_array(), vec![1, 2]);
    }
}

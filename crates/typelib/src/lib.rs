// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # typelib - runtime reflection over C-compatible memory layouts
//!
//! Describe a layout once at runtime, then read, write, compare, flatten,
//! byte-swap and copy raw memory through that description, without
//! compile-time knowledge of the layout.
//!
//! ## Quick Start
//!
//! ```rust
//! use typelib::{CompoundBuilder, CsvOptions, Registry, Value};
//!
//! # fn main() -> typelib::Result<()> {
//! let registry = Registry::with_builtins();
//! let int = registry.resolve("int32_t")?;
//! let point = registry.register(
//!     CompoundBuilder::new("Point").field("x", &int).field("y", &int).build()?,
//! )?;
//!
//! let p = Value::allocate(&point, None)?;
//! p.field("x")?.set(3i32)?;
//! p.field("y")?.set(-4i32)?;
//!
//! let opts = CsvOptions::default();
//! assert_eq!(typelib::ops::csv_header(&point, "p", &opts), "p.x p.y");
//! assert_eq!(p.to_csv(" "), "3 -4");
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Registry`] | Owns descriptors, resolves names, keeps one host wrapper per type |
//! | [`Type`] | Immutable layout descriptor (size, category, children) |
//! | [`Value`] | Address bound to a descriptor, non-owning |
//! | [`OwnedValue`] | Value plus the buffer backing it |
//! | [`Scalar`] | Decoded numeric or enum leaf |
//!
//! ## Memory contract
//!
//! Values never own or validate the memory they point at. See
//! [`value`] for the exact contract.
//!
//! ## Modules Overview
//!
//! - [`types`] - descriptors and builders
//! - [`registry`] - naming, identity, host wrappers
//! - [`value`] - binding, allocation, field access
//! - [`ops`] - equality, CSV, endian swap, typed copy
//! - [`native`] - host literal conversion
//! - [`config`] - rendering and swapping options

pub mod config;
pub mod error;
pub mod native;
pub mod ops;
pub mod registry;
pub mod types;
pub mod value;

pub use config::{CsvOptions, Options, SwapPolicy};
pub use error::{Error, Result};
pub use native::{ConversionHook, Converter, Native};
pub use ops::{typed_copy, SwapPlan};
pub use registry::{HostClass, Registry};
pub use types::{
    types_equal, Category, CompoundBuilder, EnumBuilder, NumericKind, Type, TypeKind, TypeRef,
};
pub use value::{OwnedValue, Primitive, Scalar, Value};

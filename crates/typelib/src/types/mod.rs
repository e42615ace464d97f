// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors: categories, layouts and builders.

mod builder;
mod descriptor;

pub use builder::{CompoundBuilder, EnumBuilder};
pub use descriptor::{
    types_equal, ArrayDescriptor, Category, EnumDescriptor, EnumValue, Field, NumericKind, Type,
    TypeKind, TypeRef, POINTER_SIZE,
};

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builders for compound and enum descriptors.

use crate::error::Result;
use crate::types::{EnumDescriptor, EnumValue, Field, Type, TypeRef};

/// Builder for compound types using natural C layout.
///
/// Each field is placed at the next offset aligned to the field's
/// alignment; the total size is padded to the compound's alignment.
#[derive(Debug)]
pub struct CompoundBuilder {
    name: String,
    fields: Vec<Field>,
    end: usize,
    align: usize,
}

impl CompoundBuilder {
    /// Create a new builder for a compound type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            end: 0,
            align: 1,
        }
    }

    /// Append a field after the previous one.
    pub fn field(mut self, name: impl Into<String>, ty: &TypeRef) -> Self {
        let align = ty.alignment();
        let offset = align_up(self.end, align);
        self.fields.push(Field::new(name, offset, ty.clone()));
        self.end = offset + ty.size();
        self.align = self.align.max(align);
        self
    }

    /// Build the descriptor.
    ///
    /// Runs the same checks as [`Type::compound`]; a field name used twice
    /// is rejected.
    pub fn build(self) -> Result<Type> {
        let size = align_up(self.end, self.align);
        Type::compound(self.name, self.fields, size)
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}

/// Builder for enum types.
#[derive(Debug)]
pub struct EnumBuilder {
    name: String,
    values: Vec<EnumValue>,
    next_value: i64,
    size: usize,
}

impl EnumBuilder {
    /// Create a new enum builder (4-byte storage).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            next_value: 0,
            size: 4,
        }
    }

    /// Add a symbol with auto-incrementing value.
    pub fn symbol(mut self, name: impl Into<String>) -> Self {
        self.values.push(EnumValue::new(name, self.next_value));
        self.next_value += 1;
        self
    }

    /// Add a symbol with explicit value.
    pub fn symbol_value(mut self, name: impl Into<String>, value: i64) -> Self {
        self.values.push(EnumValue::new(name, value));
        self.next_value = value + 1;
        self
    }

    /// Set storage width.
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Build the descriptor.
    pub fn build(self) -> Result<Type> {
        Type::enumeration(self.name, EnumDescriptor::new(self.values).with_size(self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NumericKind;
    use std::sync::Arc;

    #[test]
    fn test_natural_layout_with_padding() {
        let i8t = Arc::new(Type::numeric("int8_t", NumericKind::Signed, 1).unwrap());
        let f64t = Arc::new(Type::numeric("double", NumericKind::Float, 8).unwrap());
        let i16t = Arc::new(Type::numeric("int16_t", NumericKind::Signed, 2).unwrap());

        let t = CompoundBuilder::new("Padded")
            .field("a", &i8t)
            .field("b", &f64t)
            .field("c", &i16t)
            .build()
            .unwrap();

        let offsets: Vec<_> = t.fields().unwrap().iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16]);
        assert_eq!(t.size(), 24);
        assert_eq!(t.alignment(), 8);
    }

    #[test]
    fn test_empty_compound() {
        let t = CompoundBuilder::new("Empty").build().unwrap();
        assert_eq!(t.size(), 0);
        assert_eq!(t.fields().map(<[Field]>::len), Some(0));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let i = Arc::new(Type::numeric("int32_t", NumericKind::Signed, 4).unwrap());
        let err = CompoundBuilder::new("Dup")
            .field("x", &i)
            .field("x", &i)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::InvalidArgument {
                op: "Type::compound",
                ..
            }
        ));
    }

    #[test]
    fn test_enum_builder_values() {
        let t = EnumBuilder::new("Mode")
            .symbol("OFF")
            .symbol_value("ON", 10)
            .symbol("AUTO")
            .build()
            .unwrap();
        let desc = t.enum_descriptor().unwrap();
        assert_eq!(desc.value_of("OFF"), Some(0));
        assert_eq!(desc.value_of("AUTO"), Some(11));
    }

    #[test]
    fn test_enum_builder_rejects_bad_width() {
        assert!(EnumBuilder::new("Odd").symbol("X").size(3).build().is_err());
    }
}

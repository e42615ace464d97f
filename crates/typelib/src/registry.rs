// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type Registry: owner and identity authority for descriptors.
//!
//! # Identity
//!
//! The registry keeps at most one descriptor per structural identity.
//! Registration canonicalizes nested references (field, element and pointee
//! types) so every descriptor reachable from a registered type is itself
//! owned by the registry. Inside one registry, `Arc::ptr_eq` is therefore a
//! valid substitute for [`Type::is_same`].
//!
//! # Host wrappers
//!
//! A host binding usually builds one wrapper object (a class, a proxy) per
//! descriptor. [`Registry::wrapper`] stores them in a per-registry table keyed
//! by descriptor identity, created lazily on first request and reused after.
//!
//! # Thread Safety
//!
//! - types: `RwLock` (registration takes the writer lock, lookups share it)
//! - wrappers: `DashMap` (sharded, no global lock)

use crate::error::{Error, Result};
use crate::types::{Category, NumericKind, Type, TypeKind, TypeRef};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Wrapper selection bucket for host bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostClass {
    Compound,
    Pointer,
    Array,
    Enum,
    /// Numeric, opaque and null types.
    Generic,
}

impl HostClass {
    /// Select the wrapper class for a descriptor.
    pub fn of(ty: &Type) -> Self {
        match ty.category() {
            Category::Compound => Self::Compound,
            Category::Pointer => Self::Pointer,
            Category::Array => Self::Array,
            Category::Enum => Self::Enum,
            Category::Numeric | Category::Opaque | Category::NullType => Self::Generic,
        }
    }
}

type Wrapper = Arc<dyn Any + Send + Sync>;

/// Session-wide set of type descriptors.
#[derive(Default)]
pub struct Registry {
    types: RwLock<HashMap<String, TypeRef>>,
    wrappers: DashMap<usize, Wrapper>,
}

const BUILTINS: &[(&str, NumericKind, usize)] = &[
    ("char", NumericKind::Signed, 1),
    ("int8_t", NumericKind::Signed, 1),
    ("uint8_t", NumericKind::Unsigned, 1),
    ("int16_t", NumericKind::Signed, 2),
    ("uint16_t", NumericKind::Unsigned, 2),
    ("int32_t", NumericKind::Signed, 4),
    ("uint32_t", NumericKind::Unsigned, 4),
    ("int64_t", NumericKind::Signed, 8),
    ("uint64_t", NumericKind::Unsigned, 8),
    ("float", NumericKind::Float, 4),
    ("double", NumericKind::Float, 8),
];

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the C fixed-width numerics, `char`,
    /// `float` and `double`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        {
            let mut types = registry.types.write();
            for &(name, kind, size) in BUILTINS {
                let ty = Type::from_parts(name.to_string(), size, TypeKind::Numeric(kind));
                types.insert(name.to_string(), Arc::new(ty));
            }
        }
        registry
    }

    /// Register a descriptor, or return the existing identical one.
    ///
    /// Fails with [`Error::DuplicateConflict`] if a descriptor of the same
    /// name (at any nesting level) is registered with a different layout.
    pub fn register(&self, ty: Type) -> Result<TypeRef> {
        let mut types = self.types.write();
        let mut staging = Staging::new(&types);
        let stored = staging.intern(&ty)?;
        let added = staging.into_added();
        commit(&mut types, added);
        Ok(stored)
    }

    /// Register a descriptor held by reference (possibly from another
    /// registry). Returns this registry's instance.
    pub fn register_ref(&self, ty: &TypeRef) -> Result<TypeRef> {
        let mut types = self.types.write();
        let mut staging = Staging::new(&types);
        let stored = staging.intern_ref(ty)?;
        let added = staging.into_added();
        commit(&mut types, added);
        Ok(stored)
    }

    /// Look up a descriptor by name.
    pub fn resolve(&self, name: &str) -> Result<TypeRef> {
        self.get(name).ok_or_else(|| Error::NotFound {
            op: "resolve",
            name: name.to_string(),
        })
    }

    /// Look up a descriptor by name, `None` if unknown.
    pub fn get(&self, name: &str) -> Option<TypeRef> {
        self.types.read().get(name).cloned()
    }

    /// Make `alias` resolve to `target`.
    pub fn alias(&self, alias: impl Into<String>, target: &TypeRef) -> Result<()> {
        let alias = alias.into();
        let mut types = self.types.write();
        if !is_owned(&types, target) {
            return Err(Error::invalid(
                "alias",
                format!("'{}' is not owned by this registry", target.name()),
            ));
        }
        match types.get(&alias) {
            Some(existing) if Arc::ptr_eq(existing, target) => Ok(()),
            Some(existing) => Err(Error::DuplicateConflict {
                op: "alias",
                name: alias,
                reason: format!("already names '{}'", existing.name()),
            }),
            None => {
                log::debug!("[registry] alias {} -> {}", alias, target.name());
                types.insert(alias, target.clone());
                Ok(())
            }
        }
    }

    /// Wrapper class for a descriptor.
    pub fn class_of(&self, ty: &Type) -> HostClass {
        HostClass::of(ty)
    }

    /// Check that `ty` is the instance owned by this registry.
    pub fn owns(&self, ty: &TypeRef) -> bool {
        is_owned(&self.types.read(), ty)
    }

    /// Check whether a name (or alias) is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    /// Number of registered names, aliases included.
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Registered names and aliases, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.types.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Host wrapper for `ty`, created with `create` on first request.
    ///
    /// At most one wrapper exists per descriptor. Requesting a wrapper of
    /// another host type for the same descriptor is an error.
    ///
    /// `create` runs without any registry lock held, so it may itself ask
    /// for other wrappers. When two threads request the same missing
    /// wrapper at once, both may run `create`; the first stored result wins
    /// and is returned to every caller, the other is dropped.
    pub fn wrapper<W, F>(&self, ty: &TypeRef, create: F) -> Result<Arc<W>>
    where
        W: Any + Send + Sync,
        F: FnOnce(&TypeRef, HostClass) -> W,
    {
        if !self.owns(ty) {
            return Err(Error::invalid(
                "wrapper",
                format!("'{}' is not owned by this registry", ty.name()),
            ));
        }
        let key = Arc::as_ptr(ty) as usize;

        let existing = self.wrappers.get(&key).map(|w| w.value().clone());
        let wrapper = match existing {
            Some(w) => w,
            None => {
                // Built outside the shard lock: `create` may request other wrappers.
                let created: Wrapper = Arc::new(create(ty, HostClass::of(ty)));
                let stored = self.wrappers.entry(key).or_insert(created).value().clone();
                log::debug!("[registry] wrapper created for {}", ty.name());
                stored
            }
        };

        wrapper.downcast::<W>().map_err(|_| {
            Error::invalid(
                "wrapper",
                format!(
                    "wrapper for '{}' was created with another host type",
                    ty.name()
                ),
            )
        })
    }

    /// Number of host wrappers created so far.
    pub fn wrapper_count(&self) -> usize {
        self.wrappers.len()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.len())
            .field("wrappers", &self.wrapper_count())
            .finish()
    }
}

fn is_owned(types: &HashMap<String, TypeRef>, ty: &TypeRef) -> bool {
    types
        .get(ty.name())
        .is_some_and(|stored| Arc::ptr_eq(stored, ty))
}

/// Descriptors created by one registration call. They become visible in
/// the table only once the whole call succeeds, so a conflict deep in a
/// nested type leaves the registry untouched.
struct Staging<'t> {
    types: &'t HashMap<String, TypeRef>,
    added: HashMap<String, TypeRef>,
}

impl<'t> Staging<'t> {
    fn new(types: &'t HashMap<String, TypeRef>) -> Self {
        Self {
            types,
            added: HashMap::new(),
        }
    }

    fn get(&self, name: &str) -> Option<&TypeRef> {
        self.added.get(name).or_else(|| self.types.get(name))
    }

    fn intern_ref(&mut self, ty: &TypeRef) -> Result<TypeRef> {
        if self.get(ty.name()).is_some_and(|stored| Arc::ptr_eq(stored, ty)) {
            return Ok(ty.clone());
        }
        self.intern(ty)
    }

    fn intern(&mut self, ty: &Type) -> Result<TypeRef> {
        let canonical = ty.map_children(|child| self.intern_ref(child))?;

        match self.get(canonical.name()) {
            Some(existing) if existing.is_same(&canonical) => Ok(existing.clone()),
            Some(existing) => {
                let reason = existing
                    .difference(&canonical)
                    .unwrap_or_else(|| "layout differs".to_string());
                log::warn!(
                    "[registry] rejected redefinition of {}: {}",
                    canonical.name(),
                    reason
                );
                Err(Error::DuplicateConflict {
                    op: "register",
                    name: canonical.name().to_string(),
                    reason,
                })
            }
            None => {
                let stored = Arc::new(canonical);
                self.added.insert(stored.name().to_string(), stored.clone());
                Ok(stored)
            }
        }
    }

    fn into_added(self) -> HashMap<String, TypeRef> {
        self.added
    }
}

fn commit(types: &mut HashMap<String, TypeRef>, added: HashMap<String, TypeRef>) {
    for (name, ty) in added {
        log::debug!(
            "[registry] registered {} ({}, {} bytes)",
            name,
            ty.category(),
            ty.size()
        );
        types.insert(name, ty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompoundBuilder, EnumBuilder};

    fn point(registry: &Registry) -> Type {
        let f = registry.resolve("float").unwrap();
        CompoundBuilder::new("Point")
            .field("x", &f)
            .field("y", &f)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builtins() {
        let registry = Registry::with_builtins();
        assert!(registry.contains("int32_t"));
        assert_eq!(registry.resolve("double").unwrap().size(), 8);
        assert!(registry.resolve("char").unwrap().is_char());
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = Registry::new();
        let err = registry.resolve("Nope").unwrap_err();
        assert!(matches!(err, Error::NotFound { op: "resolve", .. }));
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn test_idempotent_registration() {
        let registry = Registry::with_builtins();
        let a = registry.register(point(&registry)).unwrap();
        let b = registry.register(point(&registry)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &registry.resolve("Point").unwrap()));
    }

    #[test]
    fn test_conflicting_registration() {
        let registry = Registry::with_builtins();
        registry.register(point(&registry)).unwrap();

        let d = registry.resolve("double").unwrap();
        let other = CompoundBuilder::new("Point").field("x", &d).build().unwrap();
        let err = registry.register(other).unwrap_err();
        match err {
            Error::DuplicateConflict { op, name, reason } => {
                assert_eq!(op, "register");
                assert_eq!(name, "Point");
                assert_eq!(reason, "field count 2 vs 1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nested_types_are_canonicalized() {
        let registry = Registry::with_builtins();

        // Built against a foreign float descriptor
        let foreign = Arc::new(Type::numeric("float", NumericKind::Float, 4).unwrap());
        let arr = Type::array(&foreign, 3).unwrap();
        let arr = registry.register(arr).unwrap();

        let element = &arr.array_descriptor().unwrap().element;
        assert!(Arc::ptr_eq(element, &registry.resolve("float").unwrap()));
        assert!(registry.owns(&registry.resolve("float[3]").unwrap()));
    }

    #[test]
    fn test_nested_conflict_is_reported() {
        let registry = Registry::with_builtins();
        let bogus_float = Arc::new(Type::numeric("float", NumericKind::Float, 8).unwrap());
        let arr = Type::array(&bogus_float, 2).unwrap();
        assert!(matches!(
            registry.register(arr),
            Err(Error::DuplicateConflict { .. })
        ));
        assert!(!registry.contains("float[2]"));
    }

    #[test]
    fn test_failed_registration_adds_nothing() {
        let registry = Registry::with_builtins();
        let i = registry.resolve("int32_t").unwrap();
        registry
            .register(CompoundBuilder::new("A").field("x", &i).build().unwrap())
            .unwrap();
        let before = registry.names();

        // `float[7]` is new, but the enclosing `A` conflicts
        let f = registry.resolve("float").unwrap();
        let arr = Arc::new(Type::array(&f, 7).unwrap());
        let other = CompoundBuilder::new("A").field("y", &arr).build().unwrap();
        assert!(matches!(
            registry.register(other),
            Err(Error::DuplicateConflict { .. })
        ));
        assert_eq!(registry.names(), before);
        assert!(!registry.contains("float[7]"));

        // The same nested type registers normally afterwards
        let b = CompoundBuilder::new("B").field("y", &arr).build().unwrap();
        registry.register(b).unwrap();
        assert!(registry.contains("float[7]"));
    }

    #[test]
    fn test_register_ref_across_registries() {
        let first = Registry::with_builtins();
        let second = Registry::with_builtins();
        let p1 = first.register(point(&first)).unwrap();
        let p2 = second.register_ref(&p1).unwrap();
        assert!(!Arc::ptr_eq(&p1, &p2));
        assert!(crate::types::types_equal(&p1, &p2));
        assert!(second.owns(&p2));
        assert!(!second.owns(&p1));
    }

    #[test]
    fn test_alias() {
        let registry = Registry::with_builtins();
        let i32t = registry.resolve("int32_t").unwrap();
        registry.alias("int", &i32t).unwrap();
        registry.alias("int", &i32t).unwrap();
        assert!(Arc::ptr_eq(&registry.resolve("int").unwrap(), &i32t));

        let f = registry.resolve("float").unwrap();
        assert!(matches!(
            registry.alias("int", &f),
            Err(Error::DuplicateConflict { op: "alias", .. })
        ));
    }

    #[test]
    fn test_class_of() {
        let registry = Registry::with_builtins();
        let f = registry.resolve("float").unwrap();
        assert_eq!(registry.class_of(&f), HostClass::Generic);
        let p = registry.register(Type::pointer(&f)).unwrap();
        assert_eq!(registry.class_of(&p), HostClass::Pointer);
        let e = registry
            .register(EnumBuilder::new("E").symbol("A").build().unwrap())
            .unwrap();
        assert_eq!(registry.class_of(&e), HostClass::Enum);
        assert_eq!(registry.class_of(&Type::opaque("h", 8)), HostClass::Generic);
    }

    #[derive(Debug)]
    struct HostClassObject {
        name: String,
        class: HostClass,
    }

    #[test]
    fn test_wrapper_created_once() {
        let registry = Registry::with_builtins();
        let p = registry.register(point(&registry)).unwrap();

        let mut calls = 0;
        let w1 = registry
            .wrapper(&p, |ty, class| {
                calls += 1;
                HostClassObject {
                    name: ty.name().to_string(),
                    class,
                }
            })
            .unwrap();
        let w2 = registry
            .wrapper(&p, |_, _| -> HostClassObject { unreachable!() })
            .unwrap();

        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&w1, &w2));
        assert_eq!(w1.name, "Point");
        assert_eq!(w1.class, HostClass::Compound);
        assert_eq!(registry.wrapper_count(), 1);
    }

    #[test]
    fn test_wrapper_shared_across_threads() {
        let registry = Registry::with_builtins();
        let p = registry.register(point(&registry)).unwrap();

        let wrappers: Vec<Arc<HostClassObject>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        registry
                            .wrapper(&p, |ty, class| HostClassObject {
                                name: ty.name().to_string(),
                                class,
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(wrappers.iter().all(|w| Arc::ptr_eq(w, &wrappers[0])));
        assert_eq!(registry.wrapper_count(), 1);
    }

    #[test]
    fn test_wrapper_rejects_foreign_and_mismatched() {
        let registry = Registry::with_builtins();
        let foreign = Arc::new(Type::opaque("handle", 8));
        assert!(registry.wrapper(&foreign, |_, _| 0u32).is_err());

        let f = registry.resolve("float").unwrap();
        registry.wrapper(&f, |_, _| 1u32).unwrap();
        assert!(matches!(
            registry.wrapper(&f, |_, _| String::new()),
            Err(Error::InvalidArgument { op: "wrapper", .. })
        ));
    }
}

//! Where declared-type metadata comes from.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;

use crate::base::TypeName;
use crate::error::MetadataError;

use super::types::TypeMetadata;

/// Produces metadata for declared types.
///
/// Two ways of obtaining a type exist, mirroring how a host platform can
/// either load a type for real or only read its declaration:
///
/// - [`read_metadata`](Self::read_metadata) reads the declaration statically.
///   Method order is the declaration order.
/// - [`load_type`](Self::load_type) loads the type at runtime. Method order
///   is whatever the runtime reports and may be arbitrary.
pub trait TypeSource: Send + Sync {
    /// Read a type's declaration without loading it.
    fn read_metadata(&self, name: &TypeName) -> Result<Arc<TypeMetadata>, MetadataError>;

    /// Load a type at runtime.
    fn load_type(&self, name: &TypeName) -> Result<Arc<TypeMetadata>, MetadataError>;

    /// Check whether a type can be loaded at runtime.
    fn is_loadable(&self, name: &TypeName) -> bool {
        self.load_type(name).is_ok()
    }
}

impl<T: TypeSource + ?Sized> TypeSource for Arc<T> {
    fn read_metadata(&self, name: &TypeName) -> Result<Arc<TypeMetadata>, MetadataError> {
        (**self).read_metadata(name)
    }

    fn load_type(&self, name: &TypeName) -> Result<Arc<TypeMetadata>, MetadataError> {
        (**self).load_type(name)
    }

    fn is_loadable(&self, name: &TypeName) -> bool {
        (**self).is_loadable(name)
    }
}

/// An in-memory [`TypeSource`].
///
/// Every defined type can be read statically. Unless marked unloadable it can
/// also be loaded at runtime, in which case a separately registered runtime
/// view (e.g. with a different method order) takes precedence.
#[derive(Debug, Default)]
pub struct InMemoryTypeSource {
    inner: RwLock<TypeSourceInner>,
}

#[derive(Debug, Default)]
struct TypeSourceInner {
    /// Name → statically read metadata
    declared: IndexMap<TypeName, Arc<TypeMetadata>>,
    /// Name → runtime view, where it differs from the declaration
    runtime: IndexMap<TypeName, Arc<TypeMetadata>>,
    /// Types that fail to load at runtime
    unloadable: IndexSet<TypeName>,
}

impl InMemoryTypeSource {
    /// Create a new empty type source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a type, returning its name.
    ///
    /// Redefining a name replaces the previous declaration.
    pub fn define(&self, metadata: TypeMetadata) -> TypeName {
        let name = metadata.name().clone();
        self.inner.write().declared.insert(name.clone(), Arc::new(metadata));
        name
    }

    /// Define several types at once.
    pub fn define_all(&self, types: impl IntoIterator<Item = TypeMetadata>) {
        let mut inner = self.inner.write();
        for metadata in types {
            inner.declared.insert(metadata.name().clone(), Arc::new(metadata));
        }
    }

    /// Register how the runtime reports a type, overriding the declaration
    /// for [`load_type`](TypeSource::load_type) only.
    pub fn define_runtime(&self, metadata: TypeMetadata) {
        let name = metadata.name().clone();
        self.inner.write().runtime.insert(name, Arc::new(metadata));
    }

    /// Make a type fail to load at runtime while staying readable.
    pub fn mark_unloadable(&self, name: impl Into<TypeName>) {
        self.inner.write().unloadable.insert(name.into());
    }

    /// Check if a type is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().declared.contains_key(name)
    }

    /// Get the number of defined types.
    pub fn len(&self) -> usize {
        self.inner.read().declared.len()
    }

    /// Check if no types are defined.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All defined type names, in definition order.
    pub fn names(&self) -> Vec<TypeName> {
        self.inner.read().declared.keys().cloned().collect()
    }
}

impl TypeSource for InMemoryTypeSource {
    fn read_metadata(&self, name: &TypeName) -> Result<Arc<TypeMetadata>, MetadataError> {
        self.inner
            .read()
            .declared
            .get(name)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(name.clone()))
    }

    fn load_type(&self, name: &TypeName) -> Result<Arc<TypeMetadata>, MetadataError> {
        let inner = self.inner.read();
        if inner.unloadable.contains(name) {
            return Err(MetadataError::NotLoadable(name.clone()));
        }
        inner
            .runtime
            .get(name)
            .or_else(|| inner.declared.get(name))
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MethodMetadata;

    #[test]
    fn test_define_and_read() {
        let types = InMemoryTypeSource::new();
        let name = types.define(TypeMetadata::class("app.Config"));

        assert!(types.contains("app.Config"));
        assert_eq!(types.read_metadata(&name).unwrap().name(), &name);
        assert!(types.read_metadata(&TypeName::new("app.Missing")).is_err());
    }

    #[test]
    fn test_runtime_view_only_affects_loading() {
        let types = InMemoryTypeSource::new();
        types.define(
            TypeMetadata::class("app.Config")
                .with_method(MethodMetadata::new("app.Config", "a"))
                .with_method(MethodMetadata::new("app.Config", "b")),
        );
        types.define_runtime(
            TypeMetadata::class("app.Config")
                .with_method(MethodMetadata::new("app.Config", "b"))
                .with_method(MethodMetadata::new("app.Config", "a")),
        );

        let name = TypeName::new("app.Config");
        let read = types.read_metadata(&name).unwrap();
        let loaded = types.load_type(&name).unwrap();
        assert_eq!(read.methods()[0].name(), "a");
        assert_eq!(loaded.methods()[0].name(), "b");
    }

    #[test]
    fn test_unloadable_still_readable() {
        let types = InMemoryTypeSource::new();
        let name = types.define(TypeMetadata::class("app.Broken"));
        types.mark_unloadable("app.Broken");

        assert!(!types.is_loadable(&name));
        assert!(matches!(types.load_type(&name), Err(MetadataError::NotLoadable(_))));
        assert!(types.read_metadata(&name).is_ok());
    }
}

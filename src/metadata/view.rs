//! Source views over declared types.
//!
//! A [`SourceView`] hides whether a type was obtained by runtime loading or
//! by static metadata reading. Views compare equal when their type names are
//! equal, so sets of views deduplicate by identity.
//!
//! Operations that reach other types (annotations, members, supertypes) go
//! through a [`ViewContext`], which knows the [`TypeSource`] and which
//! namespaces belong to the platform.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::base::{LOWEST_PRECEDENCE, TypeName};
use crate::config::ResolverConfig;
use crate::error::MetadataError;

use super::source::TypeSource;
use super::types::{AnnotationAttributes, MethodMetadata, TypeMetadata};
use super::well_known::{self, attr};

/// How a view's metadata was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Loaded at runtime; method order may be arbitrary.
    Loaded,
    /// Read statically; method order is declaration order.
    Static,
}

/// A read-only view over one declared type.
#[derive(Clone)]
pub struct SourceView {
    metadata: Arc<TypeMetadata>,
    origin: Origin,
}

impl SourceView {
    /// Wrap statically read metadata.
    pub fn from_static(metadata: Arc<TypeMetadata>) -> Self {
        Self {
            metadata,
            origin: Origin::Static,
        }
    }

    /// Wrap runtime-loaded metadata.
    pub fn from_loaded(metadata: Arc<TypeMetadata>) -> Self {
        Self {
            metadata,
            origin: Origin::Loaded,
        }
    }

    pub fn name(&self) -> &TypeName {
        self.metadata.name()
    }

    pub fn metadata(&self) -> &Arc<TypeMetadata> {
        &self.metadata
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Precedence declared through the `Order` annotation.
    pub fn order(&self) -> i32 {
        self.metadata
            .annotation(well_known::ORDER)
            .and_then(|attrs| attrs.int(attr::VALUE).ok().flatten())
            .map(|order| order.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
            .unwrap_or(LOWEST_PRECEDENCE)
    }

    /// Views of the directly declared annotation types.
    ///
    /// Annotation types that cannot be resolved are skipped, the same way a
    /// runtime ignores annotations whose type is absent.
    pub fn annotations(&self, cx: &ViewContext<'_>) -> Vec<SourceView> {
        self.metadata
            .annotation_types()
            .filter_map(|name| cx.related(self, name).ok())
            .collect()
    }

    /// Views of the classes named by `annotation.attribute`, deduplicated,
    /// in declaration order.
    pub fn annotation_class_values(
        &self,
        cx: &ViewContext<'_>,
        annotation: &str,
        attribute: &str,
    ) -> Result<Vec<SourceView>, MetadataError> {
        let Some(attrs) = self.metadata.annotation(annotation) else {
            return Ok(Vec::new());
        };
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for name in attrs.classes(attribute)? {
            if seen.insert(name.clone()) {
                out.push(cx.related(self, &name)?);
            }
        }
        Ok(out)
    }

    /// Views of the nested member types. Unresolvable members are skipped.
    pub fn member_types(&self, cx: &ViewContext<'_>) -> Vec<SourceView> {
        let mut members = Vec::with_capacity(self.metadata.member_types().len());
        for name in self.metadata.member_types() {
            match cx.related(self, name) {
                Ok(view) => members.push(view),
                Err(err) => {
                    debug!(member = %name, error = %err, "skipping unresolvable member type");
                }
            }
        }
        members
    }

    /// Views of the directly implemented interfaces.
    pub fn interfaces(&self, cx: &ViewContext<'_>) -> Result<Vec<SourceView>, MetadataError> {
        self.metadata
            .interfaces()
            .iter()
            .map(|name| cx.related(self, name))
            .collect()
    }

    /// View of the superclass, if one is declared.
    pub fn superclass(&self, cx: &ViewContext<'_>) -> Result<Option<SourceView>, MetadataError> {
        self.metadata
            .superclass()
            .map(|name| cx.related(self, name))
            .transpose()
    }

    /// Producer methods declared on this type.
    ///
    /// Runtime loading reports methods in arbitrary order. When more than one
    /// producer exists on a loaded view, the statically read declaration order
    /// is used instead, provided it covers every runtime-reported method.
    pub fn producer_methods(&self, cx: &ViewContext<'_>) -> Vec<MethodMetadata> {
        let methods: Vec<MethodMetadata> = self
            .metadata
            .annotated_methods(well_known::PRODUCER)
            .into_iter()
            .cloned()
            .collect();
        if methods.len() <= 1 || self.origin != Origin::Loaded || !cx.config.reconcile_method_order {
            return methods;
        }

        let declared = match cx.types.read_metadata(self.name()) {
            Ok(declared) => declared,
            Err(err) => {
                debug!(
                    ty = %self.name(),
                    error = %err,
                    "failed to read declaration for producer method order"
                );
                return methods;
            }
        };
        let declared_methods = declared.annotated_methods(well_known::PRODUCER);
        if declared_methods.len() < methods.len() {
            return methods;
        }

        let mut taken = vec![false; methods.len()];
        let mut selected = Vec::with_capacity(methods.len());
        for declared_method in declared_methods {
            if let Some(idx) = methods.iter().position(|m| m.name() == declared_method.name()) {
                if !taken[idx] {
                    taken[idx] = true;
                    selected.push(methods[idx].clone());
                }
            }
        }
        if selected.len() == methods.len() { selected } else { methods }
    }

    /// Check whether this type is, extends or implements `capability`.
    pub fn is_assignable(&self, cx: &ViewContext<'_>, capability: &str) -> bool {
        let mut visited = FxHashSet::default();
        let mut pending = vec![self.metadata.clone()];
        while let Some(metadata) = pending.pop() {
            if metadata.name() == capability {
                return true;
            }
            if !visited.insert(metadata.name().clone()) {
                continue;
            }
            let supertypes = metadata.superclass().into_iter().chain(metadata.interfaces());
            for name in supertypes {
                if name == capability || well_known::refines_capability(name, capability) {
                    return true;
                }
                if let Ok(view) = cx.related(self, name) {
                    pending.push(view.metadata);
                }
            }
        }
        false
    }

    /// Check for `annotation`, declared directly or through meta-annotations.
    pub fn has_annotation(&self, cx: &ViewContext<'_>, annotation: &str) -> bool {
        let mut visited = FxHashSet::default();
        self.has_annotation_inner(cx, annotation, &mut visited)
    }

    fn has_annotation_inner(
        &self,
        cx: &ViewContext<'_>,
        annotation: &str,
        visited: &mut FxHashSet<TypeName>,
    ) -> bool {
        if self.metadata.has_annotation(annotation) {
            return true;
        }
        if !visited.insert(self.name().clone()) {
            return false;
        }
        self.annotations(cx).iter().any(|ann| {
            !cx.config.is_platform(ann.name().as_str()) && ann.has_annotation_inner(cx, annotation, visited)
        })
    }

    /// Attributes of `annotation`, declared directly or on a meta-annotation.
    ///
    /// A direct declaration wins; otherwise the first declaration reached
    /// depth-first through the annotation types is returned.
    pub fn find_annotation(&self, cx: &ViewContext<'_>, annotation: &str) -> Option<AnnotationAttributes> {
        let mut visited = FxHashSet::default();
        self.find_annotation_inner(cx, annotation, &mut visited)
    }

    fn find_annotation_inner(
        &self,
        cx: &ViewContext<'_>,
        annotation: &str,
        visited: &mut FxHashSet<TypeName>,
    ) -> Option<AnnotationAttributes> {
        if let Some(attrs) = self.metadata.annotation(annotation) {
            return Some(attrs.clone());
        }
        if !visited.insert(self.name().clone()) {
            return None;
        }
        self.annotations(cx)
            .iter()
            .filter(|ann| !cx.config.is_platform(ann.name().as_str()))
            .find_map(|ann| ann.find_annotation_inner(cx, annotation, visited))
    }
}

impl PartialEq for SourceView {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for SourceView {}

impl Hash for SourceView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for SourceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceView({}, {:?})", self.name(), self.origin)
    }
}

impl fmt::Display for SourceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.name(), f)
    }
}

// ============================================================================
// VIEW CONTEXT
// ============================================================================

/// Produces [`SourceView`]s and resolves the types they reference.
#[derive(Clone, Copy)]
pub struct ViewContext<'a> {
    pub(crate) types: &'a dyn TypeSource,
    pub(crate) config: &'a ResolverConfig,
}

impl<'a> ViewContext<'a> {
    /// Create a new view context.
    pub fn new(types: &'a dyn TypeSource, config: &'a ResolverConfig) -> Self {
        Self { types, config }
    }

    /// View of a type identified by name.
    ///
    /// Platform types are always loaded; everything else is read statically.
    pub fn view_for_name(&self, name: &TypeName) -> Result<SourceView, MetadataError> {
        if self.config.is_platform(name.as_str()) {
            return self.types.load_type(name).map(SourceView::from_loaded);
        }
        self.types.read_metadata(name).map(SourceView::from_static)
    }

    /// View of a type identified by a loaded handle.
    ///
    /// If the type cannot be loaded, or any class referenced by its
    /// annotation attributes cannot be loaded, the view is obtained by static
    /// reading instead. Platform types have no such fallback.
    pub fn view_for_loaded(&self, name: &TypeName) -> Result<SourceView, MetadataError> {
        match self.types.load_type(name) {
            Ok(metadata) => match self.unloadable_attribute_class(&metadata) {
                None => Ok(SourceView::from_loaded(metadata)),
                Some(class) => {
                    debug!(ty = %name, attribute_class = %class, "annotation attribute class not loadable, reading metadata instead");
                    self.types.read_metadata(name).map(SourceView::from_static)
                }
            },
            Err(err) if self.config.is_platform(name.as_str()) => Err(err),
            Err(err) => {
                debug!(ty = %name, error = %err, "type not loadable, reading metadata instead");
                self.types.read_metadata(name).map(SourceView::from_static)
            }
        }
    }

    /// Resolve a type referenced from `from`, keeping `from`'s origin where possible.
    pub fn related(&self, from: &SourceView, name: &TypeName) -> Result<SourceView, MetadataError> {
        match from.origin {
            Origin::Loaded => self.view_for_loaded(name),
            Origin::Static => self.view_for_name(name),
        }
    }

    fn unloadable_attribute_class(&self, metadata: &TypeMetadata) -> Option<TypeName> {
        metadata
            .annotation_types()
            .filter_map(|ann| metadata.annotation(ann.as_str()))
            .flat_map(|attrs| attrs.referenced_classes())
            .find(|class| !self.types.is_loadable(class))
            .cloned()
    }
}

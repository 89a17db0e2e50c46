//! Declared-type metadata: annotations, methods and hierarchy.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use smol_str::SmolStr;

use crate::base::TypeName;
use crate::error::MetadataError;

// ============================================================================
// ANNOTATION ATTRIBUTES
// ============================================================================

/// A single annotation attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Str(String),
    Strs(Vec<String>),
    Bool(bool),
    Int(i64),
    Class(TypeName),
    Classes(Vec<TypeName>),
    Nested(Vec<AnnotationAttributes>),
}

/// The attributes of one annotation declaration, in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationAttributes {
    annotation: TypeName,
    values: IndexMap<SmolStr, AttributeValue>,
}

impl AnnotationAttributes {
    /// Create an empty attribute set for `annotation`.
    pub fn new(annotation: impl Into<TypeName>) -> Self {
        Self {
            annotation: annotation.into(),
            values: IndexMap::new(),
        }
    }

    /// Add an attribute.
    pub fn with(mut self, key: &str, value: AttributeValue) -> Self {
        self.values.insert(SmolStr::new(key), value);
        self
    }

    /// The annotation type these attributes belong to.
    pub fn annotation(&self) -> &TypeName {
        &self.annotation
    }

    /// Get a raw attribute value.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.values.get(key)
    }

    /// Check if an attribute is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn mismatch(&self, key: &str, reason: &'static str) -> MetadataError {
        MetadataError::Attribute {
            annotation: self.annotation.clone(),
            attribute: key.to_string(),
            reason,
        }
    }

    /// A string attribute; `None` when absent or empty.
    pub fn string(&self, key: &str) -> Result<Option<&str>, MetadataError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(AttributeValue::Str(s)) if s.is_empty() => Ok(None),
            Some(AttributeValue::Str(s)) => Ok(Some(s)),
            Some(_) => Err(self.mismatch(key, "is not a string")),
        }
    }

    /// A string-array attribute; a single string counts as one element.
    pub fn strings(&self, key: &str) -> Result<Vec<String>, MetadataError> {
        match self.values.get(key) {
            None => Ok(Vec::new()),
            Some(AttributeValue::Str(s)) => Ok(vec![s.clone()]),
            Some(AttributeValue::Strs(v)) => Ok(v.clone()),
            Some(_) => Err(self.mismatch(key, "is not a string array")),
        }
    }

    /// A boolean attribute; `false` when absent.
    pub fn boolean(&self, key: &str) -> Result<bool, MetadataError> {
        match self.values.get(key) {
            None => Ok(false),
            Some(AttributeValue::Bool(b)) => Ok(*b),
            Some(_) => Err(self.mismatch(key, "is not a boolean")),
        }
    }

    /// An integer attribute.
    pub fn int(&self, key: &str) -> Result<Option<i64>, MetadataError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(AttributeValue::Int(i)) => Ok(Some(*i)),
            Some(_) => Err(self.mismatch(key, "is not an integer")),
        }
    }

    /// A class-valued attribute.
    pub fn class(&self, key: &str) -> Result<Option<&TypeName>, MetadataError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(AttributeValue::Class(c)) => Ok(Some(c)),
            Some(_) => Err(self.mismatch(key, "is not a class")),
        }
    }

    /// A class-array attribute; a single class counts as one element.
    pub fn classes(&self, key: &str) -> Result<Vec<TypeName>, MetadataError> {
        match self.values.get(key) {
            None => Ok(Vec::new()),
            Some(AttributeValue::Class(c)) => Ok(vec![c.clone()]),
            Some(AttributeValue::Classes(v)) => Ok(v.clone()),
            Some(_) => Err(self.mismatch(key, "is not a class array")),
        }
    }

    /// Nested annotation declarations (e.g. the content of a container annotation).
    pub fn nested(&self, key: &str) -> Result<&[AnnotationAttributes], MetadataError> {
        match self.values.get(key) {
            None => Ok(&[]),
            Some(AttributeValue::Nested(v)) => Ok(v),
            Some(_) => Err(self.mismatch(key, "is not a nested annotation array")),
        }
    }

    /// Every class name referenced by this declaration, nested ones included.
    pub fn referenced_classes(&self) -> Vec<&TypeName> {
        let mut out = Vec::new();
        for value in self.values.values() {
            match value {
                AttributeValue::Class(c) => out.push(c),
                AttributeValue::Classes(v) => out.extend(v.iter()),
                AttributeValue::Nested(v) => {
                    for nested in v {
                        out.extend(nested.referenced_classes());
                    }
                }
                _ => {}
            }
        }
        out
    }
}

// ============================================================================
// METHOD METADATA
// ============================================================================

/// Metadata of a declared method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodMetadata {
    name: SmolStr,
    declaring_type: TypeName,
    annotations: IndexSet<TypeName>,
    is_abstract: bool,
    is_static: bool,
    is_final: bool,
    is_private: bool,
}

impl MethodMetadata {
    /// Create a concrete, non-static method.
    pub fn new(declaring_type: impl Into<TypeName>, name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            declaring_type: declaring_type.into(),
            annotations: IndexSet::new(),
            is_abstract: false,
            is_static: false,
            is_final: false,
            is_private: false,
        }
    }

    /// Add an annotation.
    pub fn annotated(mut self, annotation: &str) -> Self {
        self.annotations.insert(TypeName::new(annotation));
        self
    }

    pub fn with_abstract(mut self, value: bool) -> Self {
        self.is_abstract = value;
        self
    }

    pub fn with_static(mut self, value: bool) -> Self {
        self.is_static = value;
        self
    }

    pub fn with_final(mut self, value: bool) -> Self {
        self.is_final = value;
        self
    }

    pub fn with_private(mut self, value: bool) -> Self {
        self.is_private = value;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_type(&self) -> &TypeName {
        &self.declaring_type
    }

    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.contains(annotation)
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    /// A proxy can override this method.
    pub fn is_overridable(&self) -> bool {
        !self.is_static && !self.is_final && !self.is_private
    }
}

// ============================================================================
// TYPE METADATA
// ============================================================================

/// What kind of declared type this is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Annotation,
}

/// Everything the resolver reads from a declared type.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeMetadata {
    name: TypeName,
    kind: TypeKind,
    is_abstract: bool,
    is_final: bool,
    superclass: Option<TypeName>,
    interfaces: Vec<TypeName>,
    member_types: Vec<TypeName>,
    annotations: IndexMap<TypeName, AnnotationAttributes>,
    methods: Vec<MethodMetadata>,
    resource: Option<Arc<str>>,
}

impl TypeMetadata {
    fn with_kind(name: impl Into<TypeName>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_abstract: matches!(kind, TypeKind::Interface | TypeKind::Annotation),
            is_final: false,
            superclass: None,
            interfaces: Vec::new(),
            member_types: Vec::new(),
            annotations: IndexMap::new(),
            methods: Vec::new(),
            resource: None,
        }
    }

    /// Metadata for a class.
    pub fn class(name: impl Into<TypeName>) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    /// Metadata for an interface.
    pub fn interface(name: impl Into<TypeName>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    /// Metadata for an annotation type.
    pub fn annotation_type(name: impl Into<TypeName>) -> Self {
        Self::with_kind(name, TypeKind::Annotation)
    }

    pub fn with_superclass(mut self, superclass: impl Into<TypeName>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<TypeName>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_member(mut self, member: impl Into<TypeName>) -> Self {
        self.member_types.push(member.into());
        self
    }

    /// Add an annotation declaration with attributes.
    pub fn with_annotation(mut self, attributes: AnnotationAttributes) -> Self {
        self.annotations.insert(attributes.annotation().clone(), attributes);
        self
    }

    /// Add a marker annotation (no attributes).
    pub fn annotated(self, annotation: &str) -> Self {
        self.with_annotation(AnnotationAttributes::new(annotation))
    }

    pub fn with_method(mut self, method: MethodMetadata) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_abstract(mut self, value: bool) -> Self {
        self.is_abstract = value;
        self
    }

    pub fn with_final(mut self, value: bool) -> Self {
        self.is_final = value;
        self
    }

    pub fn with_resource(mut self, resource: impl Into<Arc<str>>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Annotation)
    }

    pub fn is_annotation(&self) -> bool {
        self.kind == TypeKind::Annotation
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn superclass(&self) -> Option<&TypeName> {
        self.superclass.as_ref()
    }

    pub fn interfaces(&self) -> &[TypeName] {
        &self.interfaces
    }

    pub fn member_types(&self) -> &[TypeName] {
        &self.member_types
    }

    /// Directly declared annotation types, in declaration order.
    pub fn annotation_types(&self) -> impl Iterator<Item = &TypeName> {
        self.annotations.keys()
    }

    /// Attributes of a directly declared annotation.
    pub fn annotation(&self, annotation: &str) -> Option<&AnnotationAttributes> {
        self.annotations.get(annotation)
    }

    /// Check for a directly declared annotation.
    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.contains_key(annotation)
    }

    pub fn methods(&self) -> &[MethodMetadata] {
        &self.methods
    }

    /// Methods carrying `annotation`, in the order this metadata lists them.
    pub fn annotated_methods(&self, annotation: &str) -> Vec<&MethodMetadata> {
        self.methods.iter().filter(|m| m.has_annotation(annotation)).collect()
    }

    pub fn resource(&self) -> Option<&Arc<str>> {
        self.resource.as_ref()
    }

    /// All declarations of a repeatable annotation: the direct one first,
    /// then every declaration nested in the container's `value`.
    pub fn repeatable_attributes(
        &self,
        container: &str,
        single: &str,
    ) -> Result<Vec<AnnotationAttributes>, MetadataError> {
        let mut out = Vec::new();
        if let Some(attrs) = self.annotation(single) {
            out.push(attrs.clone());
        }
        if let Some(container) = self.annotation(container) {
            out.extend(container.nested(crate::metadata::well_known::attr::VALUE)?.iter().cloned());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::well_known::{self, attr};

    #[test]
    fn test_attribute_accessors() {
        let attrs = AnnotationAttributes::new(well_known::PROPERTY_SOURCE)
            .with(attr::VALUE, AttributeValue::Str("a.properties".into()))
            .with(attr::NAME, AttributeValue::Str(String::new()))
            .with(attr::IGNORE_RESOURCE_NOT_FOUND, AttributeValue::Bool(true));

        assert_eq!(attrs.strings(attr::VALUE).unwrap(), vec!["a.properties".to_string()]);
        assert_eq!(attrs.string(attr::NAME).unwrap(), None);
        assert!(attrs.boolean(attr::IGNORE_RESOURCE_NOT_FOUND).unwrap());
        assert!(attrs.classes("missing").unwrap().is_empty());
    }

    #[test]
    fn test_attribute_type_mismatch() {
        let attrs = AnnotationAttributes::new(well_known::IMPORT)
            .with(attr::VALUE, AttributeValue::Bool(true));

        let err = attrs.classes(attr::VALUE).unwrap_err();
        assert!(err.to_string().contains("is not a class array"));
    }

    #[test]
    fn test_repeatable_attributes_direct_first() {
        let single = AnnotationAttributes::new(well_known::PROPERTY_SOURCE)
            .with(attr::VALUE, AttributeValue::Str("one".into()));
        let nested = AnnotationAttributes::new(well_known::PROPERTY_SOURCE)
            .with(attr::VALUE, AttributeValue::Str("two".into()));
        let container = AnnotationAttributes::new(well_known::PROPERTY_SOURCES)
            .with(attr::VALUE, AttributeValue::Nested(vec![nested]));

        let meta = TypeMetadata::class("app.Config")
            .with_annotation(container)
            .with_annotation(single);

        let all = meta
            .repeatable_attributes(well_known::PROPERTY_SOURCES, well_known::PROPERTY_SOURCE)
            .unwrap();
        let values: Vec<_> = all.iter().map(|a| a.strings(attr::VALUE).unwrap()).collect();
        assert_eq!(values, vec![vec!["one".to_string()], vec!["two".to_string()]]);
    }

    #[test]
    fn test_referenced_classes_includes_nested() {
        let inner = AnnotationAttributes::new("app.Inner")
            .with("type", AttributeValue::Class(TypeName::new("app.Target")));
        let outer = AnnotationAttributes::new("app.Outer")
            .with("types", AttributeValue::Classes(vec![TypeName::new("app.A")]))
            .with("inner", AttributeValue::Nested(vec![inner]));

        let names: Vec<_> = outer.referenced_classes().into_iter().map(TypeName::as_str).collect();
        assert_eq!(names, vec!["app.A", "app.Target"]);
    }

    #[test]
    fn test_method_overridable() {
        let method = MethodMetadata::new("app.Config", "dataSource");
        assert!(method.is_overridable());
        assert!(!method.clone().with_final(true).is_overridable());
        assert!(!method.clone().with_private(true).is_overridable());
        assert!(!method.with_static(true).is_overridable());
    }

    #[test]
    fn test_annotated_methods_keep_order() {
        let meta = TypeMetadata::class("app.Config")
            .with_method(MethodMetadata::new("app.Config", "b").annotated(well_known::PRODUCER))
            .with_method(MethodMetadata::new("app.Config", "helper"))
            .with_method(MethodMetadata::new("app.Config", "a").annotated(well_known::PRODUCER));

        let names: Vec<_> = meta
            .annotated_methods(well_known::PRODUCER)
            .into_iter()
            .map(MethodMetadata::name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}

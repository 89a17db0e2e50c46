//! Configuration entities, one per resolved configuration source.

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use smol_str::SmolStr;

use crate::base::TypeName;
use crate::error::BoxError;
use crate::metadata::{MethodMetadata, TypeMetadata};

use super::candidate::ConfigurationMode;
use super::collaborators::RegistrySink;
use super::strategy::ImportRegistrar;

/// A producer method contributed to an entity, possibly inherited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProducerMethod {
    pub method: MethodMetadata,
    /// The entity the method is registered on.
    pub entity: TypeName,
}

/// A nested import-resource directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedResource {
    /// The location, placeholders already resolved.
    pub location: String,
    /// The reader type declared for it; `None` selects the default reader.
    pub reader: Option<TypeName>,
}

/// A registrar attached to an entity, with the metadata that triggered it.
#[derive(Clone)]
pub struct RegistrarAttachment {
    registrar_type: TypeName,
    registrar: Arc<dyn ImportRegistrar>,
    importing: Arc<TypeMetadata>,
}

impl RegistrarAttachment {
    pub fn new(
        registrar_type: TypeName,
        registrar: Arc<dyn ImportRegistrar>,
        importing: Arc<TypeMetadata>,
    ) -> Self {
        Self {
            registrar_type,
            registrar,
            importing,
        }
    }

    pub fn registrar_type(&self) -> &TypeName {
        &self.registrar_type
    }

    /// Metadata of the type whose imports attached this registrar.
    pub fn importing(&self) -> &Arc<TypeMetadata> {
        &self.importing
    }

    /// Run the registrar against `registry`.
    pub fn invoke(&self, registry: &dyn RegistrySink) -> Result<(), BoxError> {
        self.registrar.register(&self.importing, registry)
    }
}

impl fmt::Debug for RegistrarAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrarAttachment")
            .field("registrar_type", &self.registrar_type)
            .field("importing", self.importing.name())
            .finish()
    }
}

// ============================================================================
// CONFIGURATION ENTITY
// ============================================================================

/// One resolved configuration source.
///
/// Identity is the type name. An entity is *imported* when it was discovered
/// only through imports; it then records every entity that imported it.
#[derive(Clone, Debug)]
pub struct ConfigurationEntity {
    metadata: Arc<TypeMetadata>,
    bean_name: Option<SmolStr>,
    mode: ConfigurationMode,
    imported_by: IndexSet<TypeName>,
    producer_methods: Vec<ProducerMethod>,
    imported_resources: IndexMap<String, ImportedResource>,
    registrars: Vec<RegistrarAttachment>,
}

impl ConfigurationEntity {
    /// An explicitly declared entity.
    pub fn new(metadata: Arc<TypeMetadata>, bean_name: Option<SmolStr>, mode: ConfigurationMode) -> Self {
        Self {
            metadata,
            bean_name,
            mode,
            imported_by: IndexSet::new(),
            producer_methods: Vec::new(),
            imported_resources: IndexMap::new(),
            registrars: Vec::new(),
        }
    }

    /// An entity discovered through an import (or as a member) of `importer`.
    pub fn imported(metadata: Arc<TypeMetadata>, importer: TypeName, mode: ConfigurationMode) -> Self {
        let mut entity = Self::new(metadata, None, mode);
        entity.imported_by.insert(importer);
        entity
    }

    pub fn name(&self) -> &TypeName {
        self.metadata.name()
    }

    pub fn metadata(&self) -> &Arc<TypeMetadata> {
        &self.metadata
    }

    pub fn bean_name(&self) -> Option<&str> {
        self.bean_name.as_deref()
    }

    pub fn mode(&self) -> ConfigurationMode {
        self.mode
    }

    /// The resource the entity's type was declared in.
    pub fn resource(&self) -> Option<&Arc<str>> {
        self.metadata.resource()
    }

    /// Whether the entity was discovered only through imports.
    pub fn is_imported(&self) -> bool {
        !self.imported_by.is_empty()
    }

    pub fn imported_by(&self) -> &IndexSet<TypeName> {
        &self.imported_by
    }

    /// Accumulate the importers of another discovery of the same entity.
    pub fn merge_imported_by(&mut self, other: &ConfigurationEntity) {
        self.imported_by.extend(other.imported_by.iter().cloned());
    }

    pub fn producer_methods(&self) -> &[ProducerMethod] {
        &self.producer_methods
    }

    pub fn imported_resources(&self) -> impl Iterator<Item = &ImportedResource> {
        self.imported_resources.values()
    }

    pub fn registrars(&self) -> &[RegistrarAttachment] {
        &self.registrars
    }

    pub(crate) fn add_producer_method(&mut self, method: MethodMetadata) {
        let method = ProducerMethod {
            method,
            entity: self.name().clone(),
        };
        if !self.producer_methods.contains(&method) {
            self.producer_methods.push(method);
        }
    }

    /// A repeated location replaces its reader, keeping its position.
    pub(crate) fn add_imported_resource(&mut self, location: String, reader: Option<TypeName>) {
        self.imported_resources
            .insert(location.clone(), ImportedResource { location, reader });
    }

    pub(crate) fn registrars_mut(&mut self) -> &mut Vec<RegistrarAttachment> {
        &mut self.registrars
    }
}

impl PartialEq for ConfigurationEntity {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for ConfigurationEntity {}

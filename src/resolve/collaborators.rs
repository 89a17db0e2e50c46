//! Collaborators consumed at the edges of resolution: conditions, scanning,
//! and the registry that receives the resolved model.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use smol_str::SmolStr;

use crate::base::TypeName;
use crate::error::BoxError;
use crate::metadata::{AnnotationAttributes, TypeMetadata};

use super::entity::{ConfigurationEntity, ImportedResource, RegistrarAttachment};

// ============================================================================
// CONDITIONS
// ============================================================================

/// The phase a condition is evaluated in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigurationPhase {
    /// Deciding whether to parse a configuration entity at all.
    ParseConfiguration,
    /// Deciding whether to register what an entity declares.
    RegisterBean,
}

/// Decides whether a type is skipped.
pub trait ConditionEvaluator: Send + Sync {
    fn should_skip(&self, metadata: &TypeMetadata, phase: ConfigurationPhase) -> bool;
}

impl<F> ConditionEvaluator for F
where
    F: Fn(&TypeMetadata, ConfigurationPhase) -> bool + Send + Sync,
{
    fn should_skip(&self, metadata: &TypeMetadata, phase: ConfigurationPhase) -> bool {
        self(metadata, phase)
    }
}

/// Never skips anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoConditions;

impl ConditionEvaluator for NoConditions {
    fn should_skip(&self, _metadata: &TypeMetadata, _phase: ConfigurationPhase) -> bool {
        false
    }
}

// ============================================================================
// COMPONENT SCANNING
// ============================================================================

/// A type found by a component scan.
#[derive(Clone, Debug, PartialEq)]
pub struct ScannedCandidate {
    pub bean_name: SmolStr,
    pub metadata: Arc<TypeMetadata>,
}

impl ScannedCandidate {
    pub fn new(bean_name: impl Into<SmolStr>, metadata: Arc<TypeMetadata>) -> Self {
        Self {
            bean_name: bean_name.into(),
            metadata,
        }
    }
}

/// Executes a component-scan declaration.
pub trait ComponentScanner: Send + Sync {
    /// Scan per `declaration`, which was found on `owner`.
    fn scan(
        &self,
        declaration: &AnnotationAttributes,
        owner: &TypeName,
    ) -> Result<Vec<ScannedCandidate>, BoxError>;
}

/// Finds nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoScanning;

impl ComponentScanner for NoScanning {
    fn scan(&self, _: &AnnotationAttributes, _: &TypeName) -> Result<Vec<ScannedCandidate>, BoxError> {
        Ok(Vec::new())
    }
}

// ============================================================================
// REGISTRY SINK
// ============================================================================

/// Receives the resolved model for materialization.
///
/// Also handed to strategies that ask for it, and to registrars when they run.
pub trait RegistrySink: Send + Sync {
    fn accept_entity(&self, entity: &ConfigurationEntity);
    fn accept_imported_resource(&self, owner: &TypeName, resource: &ImportedResource);
    fn accept_registrar(&self, owner: &TypeName, attachment: &RegistrarAttachment);
    /// Record a definition produced outside the model (e.g. by a registrar).
    fn register_definition(&self, name: &str, type_name: &TypeName);
}

/// A [`RegistrySink`] that records everything it receives.
#[derive(Debug, Default)]
pub struct RecordingRegistry {
    inner: RwLock<RecordingInner>,
}

#[derive(Debug, Default)]
struct RecordingInner {
    entities: Vec<TypeName>,
    imported_resources: Vec<(TypeName, ImportedResource)>,
    registrars: Vec<(TypeName, TypeName)>,
    definitions: IndexMap<String, TypeName>,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities received, in publication order.
    pub fn entities(&self) -> Vec<TypeName> {
        self.inner.read().entities.clone()
    }

    /// `(owner, resource)` pairs received.
    pub fn imported_resources(&self) -> Vec<(TypeName, ImportedResource)> {
        self.inner.read().imported_resources.clone()
    }

    /// `(owner, registrar type)` pairs received.
    pub fn registrars(&self) -> Vec<(TypeName, TypeName)> {
        self.inner.read().registrars.clone()
    }

    /// Definitions registered by name.
    pub fn definitions(&self) -> IndexMap<String, TypeName> {
        self.inner.read().definitions.clone()
    }

    pub fn contains_definition(&self, name: &str) -> bool {
        self.inner.read().definitions.contains_key(name)
    }
}

impl RegistrySink for RecordingRegistry {
    fn accept_entity(&self, entity: &ConfigurationEntity) {
        self.inner.write().entities.push(entity.name().clone());
    }

    fn accept_imported_resource(&self, owner: &TypeName, resource: &ImportedResource) {
        self.inner
            .write()
            .imported_resources
            .push((owner.clone(), resource.clone()));
    }

    fn accept_registrar(&self, owner: &TypeName, attachment: &RegistrarAttachment) {
        self.inner
            .write()
            .registrars
            .push((owner.clone(), attachment.registrar_type().clone()));
    }

    fn register_definition(&self, name: &str, type_name: &TypeName) {
        self.inner.write().definitions.insert(name.to_string(), type_name.clone());
    }
}

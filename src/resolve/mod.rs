//! Resolution — turning top-level configuration candidates into a model.
//!
//! A [`Resolver`] owns the configuration and every collaborator the traversal
//! consults. Each [`Resolver::parse`] call runs a fresh session:
//!
//! 1. every top-level [`Candidate`] is processed depth-first: member types,
//!    property sources, component scans, imports, import resources, producer
//!    methods, interfaces, then the superclass chain;
//! 2. deferred import selectors recorded on the way are grouped and resolved
//!    once, after the immediate traversal;
//! 3. the session is consumed into a [`Resolution`].
//!
//! ## Usage
//!
//! ```
//! use confgraph::{Candidate, Resolver};
//! use confgraph::metadata::{AnnotationAttributes, AttributeValue, InMemoryTypeSource, TypeMetadata};
//! use confgraph::metadata::well_known;
//!
//! let types = InMemoryTypeSource::new();
//! types.define(
//!     TypeMetadata::class("app.Root")
//!         .annotated(well_known::CONFIGURATION)
//!         .with_annotation(
//!             AnnotationAttributes::new(well_known::IMPORT)
//!                 .with("value", AttributeValue::Classes(vec!["app.Helper".into()])),
//!         ),
//! );
//! types.define(TypeMetadata::class("app.Helper"));
//!
//! let resolution = Resolver::new(types).parse([Candidate::named("app.Root")]).unwrap();
//! let names: Vec<_> = resolution.entities().map(|e| e.name().as_str()).collect();
//! assert_eq!(names, ["app.Helper", "app.Root"]);
//! ```

mod candidate;
mod collaborators;
mod collect;
mod deferred;
mod driver;
mod entity;
mod imports;
mod model;
mod property_source;
mod stack;
mod strategy;
mod validate;

pub use candidate::{ConfigurationMode, classify};
pub use collaborators::{
    ComponentScanner, ConditionEvaluator, ConfigurationPhase, NoConditions, NoScanning, RecordingRegistry,
    RegistrySink, ScannedCandidate,
};
pub use collect::collect_imports;
pub use deferred::GroupKey;
pub use entity::{ConfigurationEntity, ImportedResource, ProducerMethod, RegistrarAttachment};
pub use model::ConfigurationModel;
pub use property_source::PropertySourceMerger;
pub use stack::ImportRegistry;
pub use strategy::{
    Aware, Awareness, CandidateKind, DefaultImportGroup, DeferredImportSelector, GroupEntry, ImportGroup,
    ImportRegistrar, ImportSelector, SelectorInstance, StrategyFactory, StrategyRegistry,
};

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::base::TypeName;
use crate::config::ResolverConfig;
use crate::diagnostics::{Problem, ProblemCollector};
use crate::env::{
    FileSystemResourceLoader, PlaceholderResolver, PropertiesLayerFactory, PropertyLayerFactory, PropertyLayers,
    ResourceLoader, StandardPlaceholderResolver,
};
use crate::error::{ResolveError, StrategyError};
use crate::metadata::{SourceView, TypeMetadata, TypeSource};

use driver::Session;

// ============================================================================
// CANDIDATES
// ============================================================================

/// How a top-level candidate is identified.
#[derive(Clone, Debug)]
pub enum CandidateSource {
    /// By name; metadata is read statically (platform types are loaded).
    Named(TypeName),
    /// By loaded type handle; falls back to static reading when unloadable.
    Loaded(TypeName),
    /// By metadata already read by the caller.
    Metadata(Arc<TypeMetadata>),
}

/// A top-level configuration candidate handed to [`Resolver::parse`].
#[derive(Clone, Debug)]
pub struct Candidate {
    source: CandidateSource,
    bean_name: Option<SmolStr>,
}

impl Candidate {
    pub fn named(name: impl Into<TypeName>) -> Self {
        Self::from_source(CandidateSource::Named(name.into()))
    }

    pub fn loaded(name: impl Into<TypeName>) -> Self {
        Self::from_source(CandidateSource::Loaded(name.into()))
    }

    pub fn metadata(metadata: impl Into<Arc<TypeMetadata>>) -> Self {
        Self::from_source(CandidateSource::Metadata(metadata.into()))
    }

    fn from_source(source: CandidateSource) -> Self {
        Self {
            source,
            bean_name: None,
        }
    }

    /// Set the definition name the candidate is registered under.
    pub fn with_bean_name(mut self, bean_name: impl Into<SmolStr>) -> Self {
        self.bean_name = Some(bean_name.into());
        self
    }

    pub fn name(&self) -> &TypeName {
        match &self.source {
            CandidateSource::Named(name) | CandidateSource::Loaded(name) => name,
            CandidateSource::Metadata(metadata) => metadata.name(),
        }
    }

    pub fn source(&self) -> &CandidateSource {
        &self.source
    }

    pub fn bean_name(&self) -> Option<&str> {
        self.bean_name.as_deref()
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolves configuration candidates against a type source.
///
/// Collaborators default to: no strategies, no conditions, no scanning,
/// file-system resources relative to the working directory, the standard
/// placeholder syntax, `.properties` layers and a [`RecordingRegistry`].
pub struct Resolver {
    pub(crate) config: ResolverConfig,
    pub(crate) types: Arc<dyn TypeSource>,
    pub(crate) strategies: Arc<dyn StrategyFactory>,
    pub(crate) conditions: Arc<dyn ConditionEvaluator>,
    pub(crate) scanner: Arc<dyn ComponentScanner>,
    pub(crate) resources: Arc<dyn ResourceLoader>,
    pub(crate) placeholders: Arc<dyn PlaceholderResolver>,
    pub(crate) layer_factory: Arc<dyn PropertyLayerFactory>,
    pub(crate) layer_factories: IndexMap<TypeName, Arc<dyn PropertyLayerFactory>>,
    pub(crate) registry: Arc<dyn RegistrySink>,
    pub(crate) environment: PropertyLayers,
}

impl Resolver {
    pub fn new(types: impl TypeSource + 'static) -> Self {
        Self::with_type_source(Arc::new(types))
    }

    /// Create a resolver over a shared type source.
    pub fn with_type_source(types: Arc<dyn TypeSource>) -> Self {
        Self {
            config: ResolverConfig::default(),
            types,
            strategies: Arc::new(StrategyRegistry::new()),
            conditions: Arc::new(NoConditions),
            scanner: Arc::new(NoScanning),
            resources: Arc::new(FileSystemResourceLoader::default()),
            placeholders: Arc::new(StandardPlaceholderResolver::new()),
            layer_factory: Arc::new(PropertiesLayerFactory),
            layer_factories: IndexMap::new(),
            registry: Arc::new(RecordingRegistry::new()),
            environment: PropertyLayers::new(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_strategies(mut self, strategies: impl StrategyFactory + 'static) -> Self {
        self.strategies = Arc::new(strategies);
        self
    }

    pub fn with_conditions(mut self, conditions: impl ConditionEvaluator + 'static) -> Self {
        self.conditions = Arc::new(conditions);
        self
    }

    pub fn with_scanner(mut self, scanner: impl ComponentScanner + 'static) -> Self {
        self.scanner = Arc::new(scanner);
        self
    }

    pub fn with_resource_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.resources = Arc::new(loader);
        self
    }

    pub fn with_placeholder_resolver(mut self, resolver: impl PlaceholderResolver + 'static) -> Self {
        self.placeholders = Arc::new(resolver);
        self
    }

    /// Factory used by declarations that name none.
    pub fn with_default_layer_factory(mut self, factory: impl PropertyLayerFactory + 'static) -> Self {
        self.layer_factory = Arc::new(factory);
        self
    }

    /// Factory used by declarations naming `name` as their factory type.
    pub fn with_layer_factory(
        mut self,
        name: impl Into<TypeName>,
        factory: impl PropertyLayerFactory + 'static,
    ) -> Self {
        self.layer_factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Sink handed to aware strategies during resolution.
    pub fn with_registry(mut self, registry: Arc<dyn RegistrySink>) -> Self {
        self.registry = registry;
        self
    }

    /// Layers present before any declared property source is merged.
    pub fn with_environment(mut self, layers: PropertyLayers) -> Self {
        self.environment = layers;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `candidates` in order.
    ///
    /// The first hard failure aborts the whole parse, attributed to the
    /// top-level candidate it occurred under.
    pub fn parse(&self, candidates: impl IntoIterator<Item = Candidate>) -> Result<Resolution, ResolveError> {
        let mut session = Session::new(self);
        for candidate in candidates {
            let name = candidate.name().clone();
            debug!(candidate = %name, "parsing top-level candidate");
            self.parse_candidate(&mut session, candidate)
                .map_err(|err| err.in_parse_of(&name))?;
        }
        session.process_deferred_imports()?;
        Ok(Resolution::from_session(session))
    }

    fn parse_candidate(&self, session: &mut Session<'_>, candidate: Candidate) -> Result<(), ResolveError> {
        let view = match candidate.source {
            CandidateSource::Named(name) => session.cx.view_for_name(&name)?,
            CandidateSource::Loaded(name) => session.cx.view_for_loaded(&name)?,
            CandidateSource::Metadata(metadata) => SourceView::from_static(metadata),
        };
        session.process_explicit(view, candidate.bean_name)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("layer_factories", &self.layer_factories.keys().collect::<Vec<_>>())
            .field("environment", &self.environment.names())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// The outcome of one [`Resolver::parse`] call.
#[derive(Debug)]
pub struct Resolution {
    model: ConfigurationModel,
    imports: ImportRegistry,
    layers: PropertyLayers,
    problems: ProblemCollector,
}

impl Resolution {
    fn from_session(session: Session<'_>) -> Self {
        Self {
            model: session.model,
            imports: session.stack.into_registry(),
            layers: session.merger.into_layers(),
            problems: session.problems,
        }
    }

    /// Finalized entities in registry order.
    pub fn entities(&self) -> impl Iterator<Item = &ConfigurationEntity> {
        self.model.iter()
    }

    pub fn entity(&self, name: &str) -> Option<&ConfigurationEntity> {
        self.model.get(name)
    }

    pub fn model(&self) -> &ConfigurationModel {
        &self.model
    }

    pub fn len(&self) -> usize {
        self.model.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }

    pub fn import_registry(&self) -> &ImportRegistry {
        &self.imports
    }

    /// Metadata of the entity that most recently imported `imported`.
    pub fn importing_metadata_for(&self, imported: &str) -> Option<&Arc<TypeMetadata>> {
        self.imports.importing_metadata_for(imported)
    }

    pub fn remove_importing_entity(&mut self, importing: &str) {
        self.imports.remove_importing_entity(importing);
    }

    /// Property layers after every declared source was merged.
    pub fn layers(&self) -> &PropertyLayers {
        &self.layers
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.layers.property(key)
    }

    pub fn problems(&self) -> &[Problem] {
        self.problems.problems()
    }

    pub fn problem_collector(&self) -> &ProblemCollector {
        &self.problems
    }

    pub fn has_errors(&self) -> bool {
        self.problems.has_errors()
    }

    /// Check finalized entities for proxying constraints, appending problems.
    /// Returns the number of problems added.
    pub fn validate(&mut self) -> usize {
        let before = self.problems.len();
        for entity in self.model.iter() {
            for problem in validate::validate_entity(entity) {
                self.problems.add(problem);
            }
        }
        self.problems.len() - before
    }

    /// Hand every entity, in registry order, to `sink`, followed by its
    /// imported resources and registrars. Registrars are then invoked against
    /// the sink.
    pub fn publish(&self, sink: &dyn RegistrySink) -> Result<(), ResolveError> {
        for entity in self.model.iter() {
            sink.accept_entity(entity);
            for resource in entity.imported_resources() {
                sink.accept_imported_resource(entity.name(), resource);
            }
            for attachment in entity.registrars() {
                sink.accept_registrar(entity.name(), attachment);
            }
            for attachment in entity.registrars() {
                attachment.invoke(sink).map_err(|source| StrategyError::Registration {
                    name: attachment.registrar_type().clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

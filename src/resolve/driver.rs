//! Traversal driver: processing one configuration entity.
//!
//! A [`Session`] holds everything one `parse` call accumulates: the model,
//! the import stack, pending deferred imports, merged property layers and
//! problems. It is created per call and consumed into a
//! [`Resolution`](super::Resolution).

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::base::{TypeName, sort_by_order};
use crate::diagnostics::{Problem, ProblemCollector, Severity};
use crate::error::ResolveError;
use crate::metadata::{SourceView, ViewContext, well_known};

use super::Resolver;
use super::candidate;
use super::collaborators::ConfigurationPhase;
use super::collect::collect_imports;
use super::deferred::DeferredImport;
use super::entity::ConfigurationEntity;
use super::imports::ImportOwner;
use super::model::ConfigurationModel;
use super::property_source::PropertySourceMerger;
use super::stack::ImportStack;
use super::strategy::Awareness;

/// Per-parse resolution state.
pub(crate) struct Session<'r> {
    pub(crate) resolver: &'r Resolver,
    pub(crate) cx: ViewContext<'r>,
    pub(crate) model: ConfigurationModel,
    pub(crate) stack: ImportStack,
    /// `None` once the deferred phase has started, or when it is disabled.
    pub(crate) deferred: Option<Vec<DeferredImport>>,
    pub(crate) next_group_key: usize,
    pub(crate) merger: PropertySourceMerger,
    /// Superclass name → entity that claimed it.
    pub(crate) known_superclasses: IndexMap<TypeName, TypeName>,
    pub(crate) problems: ProblemCollector,
}

impl<'r> Session<'r> {
    pub(crate) fn new(resolver: &'r Resolver) -> Self {
        Self {
            resolver,
            cx: ViewContext::new(resolver.types.as_ref(), &resolver.config),
            model: ConfigurationModel::new(),
            stack: ImportStack::default(),
            deferred: resolver.config.deferred_imports.then(Vec::new),
            next_group_key: 0,
            merger: PropertySourceMerger::new(resolver.environment.clone()),
            known_superclasses: IndexMap::new(),
            problems: ProblemCollector::new(),
        }
    }

    pub(crate) fn awareness(&self) -> Awareness<'_> {
        Awareness::new(self.merger.layers(), &self.resolver.resources, &self.resolver.registry)
    }

    /// Record a problem, or raise it when failing fast.
    pub(crate) fn report(&mut self, problem: Problem) -> Result<(), ResolveError> {
        warn!(code = problem.code.as_deref().unwrap_or(""), "{}", problem.message);
        if self.resolver.config.fail_fast && problem.severity == Severity::Error {
            return Err(problem.into());
        }
        self.problems.add(problem);
        Ok(())
    }

    /// Process an explicitly declared entity.
    pub(crate) fn process_explicit(
        &mut self,
        view: SourceView,
        bean_name: Option<SmolStr>,
    ) -> Result<(), ResolveError> {
        let mode = candidate::mode_of(&view, &self.cx);
        let entity = ConfigurationEntity::new(view.metadata().clone(), bean_name, mode);
        self.process_entity(entity, view)
    }

    /// Process an entity discovered through `importer`.
    pub(crate) fn process_imported(&mut self, view: SourceView, importer: &TypeName) -> Result<(), ResolveError> {
        let mode = candidate::mode_of(&view, &self.cx);
        let entity = ConfigurationEntity::imported(view.metadata().clone(), importer.clone(), mode);
        self.process_entity(entity, view)
    }

    pub(crate) fn process_entity(
        &mut self,
        mut entity: ConfigurationEntity,
        view: SourceView,
    ) -> Result<(), ResolveError> {
        if self
            .resolver
            .conditions
            .should_skip(entity.metadata(), ConfigurationPhase::ParseConfiguration)
        {
            debug!(entity = %entity.name(), "skipped by condition");
            return Ok(());
        }

        if let Some(existing_imported) = self.model.get(entity.name()).map(ConfigurationEntity::is_imported) {
            if entity.is_imported() {
                if existing_imported {
                    if let Some(existing) = self.model.get_mut(entity.name()) {
                        existing.merge_imported_by(&entity);
                    }
                }
                return Ok(());
            }
            debug!(entity = %entity.name(), "explicit declaration supersedes imported entity");
            self.model.remove(entity.name());
            let name = entity.name().clone();
            self.known_superclasses.retain(|_, claimant| *claimant != name);
        }

        debug!(entity = %entity.name(), imported = entity.is_imported(), "processing configuration entity");
        let mut current = Some(view);
        while let Some(source) = current {
            current = self.process_source(&mut entity, source)?;
        }
        self.model.finalize(entity);
        Ok(())
    }

    /// Process one level of the entity's hierarchy, returning the superclass
    /// to continue with.
    fn process_source(
        &mut self,
        entity: &mut ConfigurationEntity,
        source: SourceView,
    ) -> Result<Option<SourceView>, ResolveError> {
        let cx = self.cx;
        self.process_member_types(entity, &source)?;

        let metadata = source.metadata().clone();
        for declaration in metadata.repeatable_attributes(well_known::PROPERTY_SOURCES, well_known::PROPERTY_SOURCE)? {
            self.process_property_source(entity.name(), &declaration)?;
        }

        let scans = metadata.repeatable_attributes(well_known::COMPONENT_SCANS, well_known::COMPONENT_SCAN)?;
        if !scans.is_empty()
            && !self
                .resolver
                .conditions
                .should_skip(&metadata, ConfigurationPhase::RegisterBean)
        {
            for declaration in &scans {
                let scanned = self
                    .resolver
                    .scanner
                    .scan(declaration, source.name())
                    .map_err(|source_err| ResolveError::Scan {
                        owner: source.name().clone(),
                        source: source_err,
                    })?;
                for found in scanned {
                    let view = SourceView::from_static(found.metadata);
                    if candidate::classify(&view, &cx).is_some() {
                        self.process_explicit(view, Some(found.bean_name))?;
                    }
                }
            }
        }

        let owner = ImportOwner::new(entity, source.clone());
        let imports = collect_imports(&source, &cx)?;
        self.process_imports(&owner, entity.registrars_mut(), imports, true)?;

        if let Some(attrs) = source.find_annotation(&cx, well_known::IMPORT_RESOURCE) {
            let mut locations = attrs.strings(well_known::attr::LOCATIONS)?;
            if locations.is_empty() {
                locations = attrs.strings(well_known::attr::VALUE)?;
            }
            let reader = attrs.class(well_known::attr::READER)?.cloned();
            for location in locations {
                let resolved = self
                    .resolver
                    .placeholders
                    .resolve_required(&location, self.merger.layers())?;
                entity.add_imported_resource(resolved, reader.clone());
            }
        }

        for method in source.producer_methods(&cx) {
            entity.add_producer_method(method);
        }
        self.process_interfaces(entity, &source)?;

        if let Some(superclass) = metadata.superclass() {
            if !self.resolver.config.is_platform(superclass)
                && !self.known_superclasses.contains_key(superclass)
            {
                self.known_superclasses
                    .insert(superclass.clone(), entity.name().clone());
                return Ok(source.superclass(&cx)?);
            }
        }
        Ok(None)
    }

    /// Process nested member types that qualify as candidates, in precedence order.
    fn process_member_types(
        &mut self,
        entity: &ConfigurationEntity,
        source: &SourceView,
    ) -> Result<(), ResolveError> {
        let cx = self.cx;
        let mut members: Vec<SourceView> = source
            .member_types(&cx)
            .into_iter()
            .filter(|member| member.name() != entity.name() && candidate::classify(member, &cx).is_some())
            .collect();
        sort_by_order(&mut members, SourceView::order);

        for member in members {
            if self.stack.contains(entity.name()) {
                let problem = self.circular_import(entity.name());
                self.report(problem)?;
                continue;
            }
            self.stack.push(entity.name().clone(), entity.resource().cloned());
            let result = self.process_imported(member, entity.name());
            self.stack.pop();
            result?;
        }
        Ok(())
    }

    /// Register producer methods declared as concrete defaults on interfaces,
    /// recursively.
    fn process_interfaces(
        &mut self,
        entity: &mut ConfigurationEntity,
        source: &SourceView,
    ) -> Result<(), ResolveError> {
        let cx = self.cx;
        for interface in source.interfaces(&cx)? {
            for method in interface.producer_methods(&cx) {
                if !method.is_abstract() {
                    entity.add_producer_method(method);
                }
            }
            self.process_interfaces(entity, &interface)?;
        }
        Ok(())
    }

    /// Build the problem for an attempt to re-enter `attempted`.
    pub(crate) fn circular_import(&self, attempted: &TypeName) -> Problem {
        let (importer, resource) = match self.stack.top() {
            Some(top) => (top.name.clone(), top.resource.clone()),
            None => (attempted.clone(), None),
        };
        ProblemCollector::circular_import(&importer, resource, attempted, &self.stack.render())
    }
}

//! Import processing.

use std::sync::Arc;

use tracing::debug;

use crate::base::TypeName;
use crate::error::{ResolveError, StrategyError};
use crate::metadata::{SourceView, TypeMetadata};

use super::deferred::{DeferredImport, GroupKey};
use super::driver::Session;
use super::entity::{ConfigurationEntity, RegistrarAttachment};
use super::strategy::{CandidateKind, ImportSelector, SelectorInstance};

/// The entity whose imports are being processed, and the level of its
/// hierarchy that declared them.
#[derive(Clone, Debug)]
pub(crate) struct ImportOwner {
    pub(crate) name: TypeName,
    pub(crate) metadata: Arc<TypeMetadata>,
    pub(crate) resource: Option<Arc<str>>,
    /// Selectors see this view's metadata; it differs from `metadata` while
    /// walking superclasses.
    pub(crate) view: SourceView,
}

impl ImportOwner {
    pub(crate) fn new(entity: &ConfigurationEntity, view: SourceView) -> Self {
        Self {
            name: entity.name().clone(),
            metadata: entity.metadata().clone(),
            resource: entity.resource().cloned(),
            view,
        }
    }

    /// An owner taken from its entity's metadata alone.
    pub(crate) fn from_metadata(metadata: Arc<TypeMetadata>, resource: Option<Arc<str>>) -> Self {
        Self {
            name: metadata.name().clone(),
            view: SourceView::from_static(metadata.clone()),
            metadata,
            resource,
        }
    }
}

impl Session<'_> {
    /// Process `candidates` imported by `owner`.
    ///
    /// Registrars found are attached to `registrars`. With `check_cycles`, an
    /// owner whose importer chain leads back to itself is reported as a
    /// circular import and nothing is processed.
    pub(crate) fn process_imports(
        &mut self,
        owner: &ImportOwner,
        registrars: &mut Vec<RegistrarAttachment>,
        candidates: Vec<SourceView>,
        check_cycles: bool,
    ) -> Result<(), ResolveError> {
        if candidates.is_empty() {
            return Ok(());
        }
        if check_cycles && self.stack.is_chained_import_on_stack(&owner.name) {
            let problem = self.circular_import(&owner.name);
            return self.report(problem);
        }

        self.stack.push(owner.name.clone(), owner.resource.clone());
        let result = self.process_candidates(owner, registrars, candidates);
        self.stack.pop();
        result.map_err(|err| err.in_imports_of(&owner.name))
    }

    fn process_candidates(
        &mut self,
        owner: &ImportOwner,
        registrars: &mut Vec<RegistrarAttachment>,
        candidates: Vec<SourceView>,
    ) -> Result<(), ResolveError> {
        let cx = self.cx;
        for candidate in candidates {
            match CandidateKind::classify(&candidate, &cx) {
                CandidateKind::Selector => match self.resolver.strategies.selector(candidate.name())? {
                    SelectorInstance::Immediate(mut selector) => {
                        self.awareness().apply(selector.as_mut());
                        self.run_selector(owner, registrars, candidate.name(), selector.as_ref())?;
                    }
                    SelectorInstance::Deferred(mut selector) => {
                        self.awareness().apply(selector.as_mut());
                        if let Some(deferred) = self.deferred.as_mut() {
                            let order = selector.order().unwrap_or_else(|| candidate.order());
                            let group = match selector.import_group() {
                                Some(name) => GroupKey::Declared(name),
                                None => {
                                    self.next_group_key += 1;
                                    GroupKey::Private(self.next_group_key)
                                }
                            };
                            debug!(owner = %owner.name, selector = %candidate.name(), "deferring import selector");
                            deferred.push(DeferredImport {
                                owner: owner.name.clone(),
                                owner_metadata: owner.metadata.clone(),
                                selector_type: candidate.name().clone(),
                                selector,
                                order,
                                group,
                            });
                        } else {
                            self.run_selector(owner, registrars, candidate.name(), selector.as_ref())?;
                        }
                    }
                },
                CandidateKind::Registrar => {
                    let mut registrar = self.resolver.strategies.registrar(candidate.name())?;
                    self.awareness().apply(registrar.as_mut());
                    registrars.push(RegistrarAttachment::new(
                        candidate.name().clone(),
                        Arc::from(registrar),
                        owner.view.metadata().clone(),
                    ));
                }
                CandidateKind::Plain => {
                    self.stack
                        .registry_mut()
                        .register_import(owner.view.metadata().clone(), candidate.name().clone());
                    self.process_imported(candidate, &owner.name)?;
                }
            }
        }
        Ok(())
    }

    fn run_selector<S: ImportSelector + ?Sized>(
        &mut self,
        owner: &ImportOwner,
        registrars: &mut Vec<RegistrarAttachment>,
        selector_type: &TypeName,
        selector: &S,
    ) -> Result<(), ResolveError> {
        let names = selector
            .select_imports(owner.view.metadata())
            .map_err(|source| StrategyError::Selection {
                name: selector_type.clone(),
                source,
            })?;
        let cx = self.cx;
        let views = names
            .iter()
            .map(|name| cx.view_for_name(name))
            .collect::<Result<Vec<_>, _>>()?;
        self.process_imports(owner, registrars, views, false)
    }
}

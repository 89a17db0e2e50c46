//! Import strategies — selectors, registrars and import groups.
//!
//! An imported type is classified once, by capability, into a
//! [`CandidateKind`]. Selector and registrar types are then instantiated
//! through a [`StrategyFactory`] and handed their collaborators by
//! [`Awareness`] before they run.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::base::TypeName;
use crate::env::{PropertyLayers, ResourceLoader};
use crate::error::{BoxError, StrategyError};
use crate::metadata::{SourceView, TypeMetadata, ViewContext, well_known};

use super::collaborators::RegistrySink;

// ============================================================================
// CAPABILITIES
// ============================================================================

/// Opt-in hooks for receiving collaborators after instantiation.
///
/// Every method defaults to ignoring the collaborator.
pub trait Aware {
    fn set_environment(&mut self, _layers: &PropertyLayers) {}
    fn set_resource_loader(&mut self, _loader: Arc<dyn ResourceLoader>) {}
    fn set_registry(&mut self, _registry: Arc<dyn RegistrySink>) {}
}

/// Computes further imports from the importing entity's metadata.
pub trait ImportSelector: Aware + Send {
    fn select_imports(&self, importing: &TypeMetadata) -> Result<Vec<TypeName>, BoxError>;
}

/// A selector resolved after every top-level candidate has been processed.
pub trait DeferredImportSelector: ImportSelector {
    /// The import group this selector contributes to; `None` for a private group.
    fn import_group(&self) -> Option<TypeName> {
        None
    }

    /// Precedence among deferred selectors. `None` falls back to the
    /// selector type's `Order` annotation.
    fn order(&self) -> Option<i32> {
        None
    }
}

/// Registers downstream effects instead of naming further imports.
pub trait ImportRegistrar: Aware + Send + Sync {
    fn register(&self, importing: &TypeMetadata, registry: &dyn RegistrySink) -> Result<(), BoxError>;
}

/// One import chosen by an [`ImportGroup`], tagged with the metadata of the
/// entity whose selector produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupEntry {
    pub importing: Arc<TypeMetadata>,
    pub import: TypeName,
}

impl GroupEntry {
    pub fn new(importing: Arc<TypeMetadata>, import: impl Into<TypeName>) -> Self {
        Self {
            importing,
            import: import.into(),
        }
    }
}

/// Combines the output of several deferred selectors.
///
/// [`process`](Self::process) is called once per member selector, then
/// [`select_imports`](Self::select_imports) once for the final list.
pub trait ImportGroup: Aware + Send {
    fn process(
        &mut self,
        importing: &Arc<TypeMetadata>,
        selector: &dyn DeferredImportSelector,
    ) -> Result<(), BoxError>;

    fn select_imports(&mut self) -> Result<Vec<GroupEntry>, BoxError>;
}

/// The group used by deferred selectors that declare none: every selected
/// import, in selection order.
#[derive(Debug, Default)]
pub struct DefaultImportGroup {
    entries: Vec<GroupEntry>,
}

impl Aware for DefaultImportGroup {}

impl ImportGroup for DefaultImportGroup {
    fn process(
        &mut self,
        importing: &Arc<TypeMetadata>,
        selector: &dyn DeferredImportSelector,
    ) -> Result<(), BoxError> {
        for import in selector.select_imports(importing)? {
            self.entries.push(GroupEntry::new(importing.clone(), import));
        }
        Ok(())
    }

    fn select_imports(&mut self) -> Result<Vec<GroupEntry>, BoxError> {
        Ok(std::mem::take(&mut self.entries))
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// How an import candidate is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    /// Names further imports, now or in the deferred phase.
    Selector,
    /// Attached to the importing entity for later registration.
    Registrar,
    /// Processed as a configuration entity in its own right.
    Plain,
}

impl CandidateKind {
    pub fn classify(view: &SourceView, cx: &ViewContext<'_>) -> Self {
        if view.is_assignable(cx, well_known::IMPORT_SELECTOR) {
            CandidateKind::Selector
        } else if view.is_assignable(cx, well_known::IMPORT_REGISTRAR) {
            CandidateKind::Registrar
        } else {
            CandidateKind::Plain
        }
    }
}

/// An instantiated selector.
pub enum SelectorInstance {
    Immediate(Box<dyn ImportSelector>),
    Deferred(Box<dyn DeferredImportSelector>),
}

impl fmt::Debug for SelectorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorInstance::Immediate(_) => f.write_str("SelectorInstance::Immediate"),
            SelectorInstance::Deferred(_) => f.write_str("SelectorInstance::Deferred"),
        }
    }
}

// ============================================================================
// AWARENESS
// ============================================================================

/// Supplies collaborators to freshly instantiated strategies.
pub struct Awareness<'a> {
    pub(crate) layers: &'a PropertyLayers,
    pub(crate) resources: &'a Arc<dyn ResourceLoader>,
    pub(crate) registry: &'a Arc<dyn RegistrySink>,
}

impl<'a> Awareness<'a> {
    pub fn new(
        layers: &'a PropertyLayers,
        resources: &'a Arc<dyn ResourceLoader>,
        registry: &'a Arc<dyn RegistrySink>,
    ) -> Self {
        Self {
            layers,
            resources,
            registry,
        }
    }

    pub fn apply<A: Aware + ?Sized>(&self, target: &mut A) {
        target.set_environment(self.layers);
        target.set_resource_loader(self.resources.clone());
        target.set_registry(self.registry.clone());
    }
}

// ============================================================================
// STRATEGY FACTORY
// ============================================================================

/// Instantiates strategy types by name.
pub trait StrategyFactory: Send + Sync {
    fn selector(&self, name: &TypeName) -> Result<SelectorInstance, StrategyError>;
    fn registrar(&self, name: &TypeName) -> Result<Box<dyn ImportRegistrar>, StrategyError>;
    fn group(&self, name: &TypeName) -> Result<Box<dyn ImportGroup>, StrategyError>;
}

type Ctor<T> = Arc<dyn Fn() -> Result<Box<T>, BoxError> + Send + Sync>;

#[derive(Clone)]
enum Registration {
    Selector(Ctor<dyn ImportSelector>),
    Deferred(Ctor<dyn DeferredImportSelector>),
    Registrar(Ctor<dyn ImportRegistrar>),
    Group(Ctor<dyn ImportGroup>),
}

impl Registration {
    fn kind(&self) -> &'static str {
        match self {
            Registration::Selector(_) => "an import selector",
            Registration::Deferred(_) => "a deferred import selector",
            Registration::Registrar(_) => "an import registrar",
            Registration::Group(_) => "an import group",
        }
    }
}

/// A [`StrategyFactory`] backed by registered constructors.
///
/// ```
/// use confgraph::base::TypeName;
/// use confgraph::error::BoxError;
/// use confgraph::metadata::TypeMetadata;
/// use confgraph::resolve::{Aware, ImportSelector, StrategyFactory, StrategyRegistry};
///
/// struct Extras;
/// impl Aware for Extras {}
/// impl ImportSelector for Extras {
///     fn select_imports(&self, _: &TypeMetadata) -> Result<Vec<TypeName>, BoxError> {
///         Ok(vec![TypeName::new("app.Extra")])
///     }
/// }
///
/// let strategies = StrategyRegistry::new().with_selector("app.ExtrasSelector", || Extras);
/// assert!(strategies.selector(&TypeName::new("app.ExtrasSelector")).is_ok());
/// ```
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    registrations: IndexMap<TypeName, Registration>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selector<S, F>(self, name: impl Into<TypeName>, ctor: F) -> Self
    where
        S: ImportSelector + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.with_fallible_selector(name, move || Ok(ctor()))
    }

    /// Register a selector whose construction can fail.
    pub fn with_fallible_selector<S, F>(mut self, name: impl Into<TypeName>, ctor: F) -> Self
    where
        S: ImportSelector + 'static,
        F: Fn() -> Result<S, BoxError> + Send + Sync + 'static,
    {
        let ctor: Ctor<dyn ImportSelector> = Arc::new(move || {
            ctor().map(|s| Box::new(s) as Box<dyn ImportSelector>)
        });
        self.registrations.insert(name.into(), Registration::Selector(ctor));
        self
    }

    pub fn with_deferred_selector<S, F>(mut self, name: impl Into<TypeName>, ctor: F) -> Self
    where
        S: DeferredImportSelector + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        let ctor: Ctor<dyn DeferredImportSelector> = Arc::new(move || {
            Ok(Box::new(ctor()) as Box<dyn DeferredImportSelector>)
        });
        self.registrations.insert(name.into(), Registration::Deferred(ctor));
        self
    }

    pub fn with_registrar<R, F>(mut self, name: impl Into<TypeName>, ctor: F) -> Self
    where
        R: ImportRegistrar + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        let ctor: Ctor<dyn ImportRegistrar> = Arc::new(move || {
            Ok(Box::new(ctor()) as Box<dyn ImportRegistrar>)
        });
        self.registrations.insert(name.into(), Registration::Registrar(ctor));
        self
    }

    pub fn with_group<G, F>(mut self, name: impl Into<TypeName>, ctor: F) -> Self
    where
        G: ImportGroup + 'static,
        F: Fn() -> G + Send + Sync + 'static,
    {
        let ctor: Ctor<dyn ImportGroup> = Arc::new(move || Ok(Box::new(ctor()) as Box<dyn ImportGroup>));
        self.registrations.insert(name.into(), Registration::Group(ctor));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registrations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    fn lookup(&self, name: &TypeName) -> Result<&Registration, StrategyError> {
        self.registrations
            .get(name)
            .ok_or_else(|| StrategyError::Unknown(name.clone()))
    }
}

fn instantiate<T: ?Sized>(name: &TypeName, ctor: &Ctor<T>) -> Result<Box<T>, StrategyError> {
    ctor().map_err(|source| StrategyError::Instantiation {
        name: name.clone(),
        source,
    })
}

fn wrong_kind(name: &TypeName, expected: &'static str) -> StrategyError {
    StrategyError::WrongKind {
        name: name.clone(),
        expected,
    }
}

impl StrategyFactory for StrategyRegistry {
    fn selector(&self, name: &TypeName) -> Result<SelectorInstance, StrategyError> {
        match self.lookup(name)? {
            Registration::Selector(ctor) => instantiate(name, ctor).map(SelectorInstance::Immediate),
            Registration::Deferred(ctor) => instantiate(name, ctor).map(SelectorInstance::Deferred),
            _ => Err(wrong_kind(name, "an import selector")),
        }
    }

    fn registrar(&self, name: &TypeName) -> Result<Box<dyn ImportRegistrar>, StrategyError> {
        match self.lookup(name)? {
            Registration::Registrar(ctor) => instantiate(name, ctor),
            _ => Err(wrong_kind(name, "an import registrar")),
        }
    }

    fn group(&self, name: &TypeName) -> Result<Box<dyn ImportGroup>, StrategyError> {
        match self.lookup(name)? {
            Registration::Group(ctor) => instantiate(name, ctor),
            _ => Err(wrong_kind(name, "an import group")),
        }
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.registrations.iter().map(|(name, reg)| (name, reg.kind())))
            .finish()
    }
}

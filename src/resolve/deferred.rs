//! Deferred import grouping.
//!
//! Deferred selectors are recorded while the immediate traversal runs and
//! resolved once, afterwards. Records are ordered by precedence, partitioned
//! by group key, and each group sees every member before it selects.

use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::base::{TypeName, sort_by_order};
use crate::error::{ResolveError, StrategyError};
use crate::metadata::TypeMetadata;

use super::driver::Session;
use super::imports::ImportOwner;
use super::strategy::{DefaultImportGroup, DeferredImportSelector, GroupEntry, ImportGroup};

/// Identity of an import group.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// A group type shared by every selector declaring it.
    Declared(TypeName),
    /// The private group of one selector that declares none.
    Private(usize),
}

/// A deferred selector recorded against the entity that imported it.
pub(crate) struct DeferredImport {
    pub(crate) owner: TypeName,
    pub(crate) owner_metadata: Arc<TypeMetadata>,
    pub(crate) selector_type: TypeName,
    pub(crate) selector: Box<dyn DeferredImportSelector>,
    pub(crate) order: i32,
    pub(crate) group: GroupKey,
}

/// One group instance and its member records.
struct Grouping {
    label: TypeName,
    group: Box<dyn ImportGroup>,
    members: Vec<DeferredImport>,
}

impl Grouping {
    /// Feed every member through the group, then take its final selection.
    fn imports(&mut self) -> Result<Vec<GroupEntry>, StrategyError> {
        for member in &self.members {
            self.group
                .process(&member.owner_metadata, member.selector.as_ref())
                .map_err(|source| StrategyError::Group {
                    name: self.label.clone(),
                    source,
                })?;
        }
        self.group.select_imports().map_err(|source| StrategyError::Group {
            name: self.label.clone(),
            source,
        })
    }
}

impl Session<'_> {
    /// Resolve every recorded deferred import. Runs at most once; selectors
    /// encountered afterwards run immediately.
    pub(crate) fn process_deferred_imports(&mut self) -> Result<(), ResolveError> {
        let Some(mut records) = self.deferred.take() else {
            return Ok(());
        };
        if records.is_empty() {
            return Ok(());
        }
        debug!(count = records.len(), "processing deferred imports");
        sort_by_order(&mut records, |record| record.order);

        let mut groupings: IndexMap<GroupKey, Grouping> = IndexMap::new();
        let mut owners: FxHashMap<TypeName, Arc<TypeMetadata>> = FxHashMap::default();
        for record in records {
            owners.insert(record.owner.clone(), record.owner_metadata.clone());
            let grouping = match groupings.entry(record.group.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let grouping = self.create_grouping(&record)?;
                    entry.insert(grouping)
                }
            };
            grouping.members.push(record);
        }

        for (_, mut grouping) in groupings {
            for entry in grouping.imports()? {
                let owner_name = entry.importing.name();
                let metadata = owners
                    .get(owner_name)
                    .cloned()
                    .ok_or_else(|| ResolveError::UnknownGroupOwner(owner_name.clone()))?;
                self.process_group_entry(metadata, &entry.import)
                    .map_err(|err| err.in_imports_of(owner_name))?;
            }
        }
        Ok(())
    }

    fn create_grouping(&self, record: &DeferredImport) -> Result<Grouping, StrategyError> {
        match &record.group {
            GroupKey::Declared(name) => {
                let mut group = self.resolver.strategies.group(name)?;
                self.awareness().apply(group.as_mut());
                Ok(Grouping {
                    label: name.clone(),
                    group,
                    members: Vec::new(),
                })
            }
            GroupKey::Private(_) => Ok(Grouping {
                label: record.selector_type.clone(),
                group: Box::new(DefaultImportGroup::default()),
                members: Vec::new(),
            }),
        }
    }

    /// Process one grouped import on behalf of its recorded owner.
    fn process_group_entry(&mut self, metadata: Arc<TypeMetadata>, import: &TypeName) -> Result<(), ResolveError> {
        let resource = self
            .model
            .get(metadata.name())
            .and_then(|entity| entity.resource().cloned());
        let owner = ImportOwner::from_metadata(metadata, resource);
        let candidate = self.cx.view_for_name(import)?;

        let mut registrars = Vec::new();
        self.process_imports(&owner, &mut registrars, vec![candidate], false)?;
        if !registrars.is_empty() {
            match self.model.get_mut(&owner.name) {
                Some(entity) => entity.registrars_mut().extend(registrars),
                None => warn!(owner = %owner.name, "deferred import owner missing from model, registrars dropped"),
            }
        }
        Ok(())
    }
}

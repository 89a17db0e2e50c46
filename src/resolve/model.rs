//! The configuration model: finalized entities keyed by identity.

use indexmap::IndexMap;

use crate::base::TypeName;

use super::entity::ConfigurationEntity;

/// Finalized configuration entities, in finalization order.
///
/// Entities are arena-allocated by name; back-references between entities
/// (`imported_by`) are names, never links.
#[derive(Clone, Debug, Default)]
pub struct ConfigurationModel {
    entities: IndexMap<TypeName, ConfigurationEntity>,
}

impl ConfigurationModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ConfigurationEntity> {
        self.entities.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut ConfigurationEntity> {
        self.entities.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Insert a finalized entity.
    ///
    /// An entity already present under the same name is replaced in place.
    pub(crate) fn finalize(&mut self, entity: ConfigurationEntity) {
        self.entities.insert(entity.name().clone(), entity);
    }

    /// Remove a superseded entity; a later [`finalize`](Self::finalize) appends it anew.
    pub(crate) fn remove(&mut self, name: &str) -> Option<ConfigurationEntity> {
        self.entities.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigurationEntity> {
        self.entities.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &TypeName> {
        self.entities.keys()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

//! The import stack and the provenance registry it maintains.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::base::TypeName;
use crate::metadata::TypeMetadata;

/// Records, per imported name, the metadata of every entity that imported it.
#[derive(Clone, Debug, Default)]
pub struct ImportRegistry {
    imports: IndexMap<TypeName, Vec<Arc<TypeMetadata>>>,
}

impl ImportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register_import(&mut self, importing: Arc<TypeMetadata>, imported: TypeName) {
        self.imports.entry(imported).or_default().push(importing);
    }

    /// Metadata of the most recent importer of `imported`.
    pub fn importing_metadata_for(&self, imported: &str) -> Option<&Arc<TypeMetadata>> {
        self.imports.get(imported).and_then(|importers| importers.last())
    }

    /// Forget one import made by `importing` from each imported name.
    pub fn remove_importing_entity(&mut self, importing: &str) {
        for importers in self.imports.values_mut() {
            if let Some(idx) = importers.iter().position(|m| m.name() == importing) {
                importers.remove(idx);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.imports.values().all(Vec::is_empty)
    }
}

/// One entity on the import stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StackFrame {
    pub(crate) name: TypeName,
    pub(crate) resource: Option<Arc<str>>,
}

/// Entities currently being resolved, bottom first.
#[derive(Debug, Default)]
pub(crate) struct ImportStack {
    frames: Vec<StackFrame>,
    registry: ImportRegistry,
}

impl ImportStack {
    pub(crate) fn push(&mut self, name: TypeName, resource: Option<Arc<str>>) {
        trace!(entity = %name, depth = self.frames.len(), "push import stack");
        self.frames.push(StackFrame { name, resource });
    }

    pub(crate) fn pop(&mut self) {
        if let Some(frame) = self.frames.pop() {
            trace!(entity = %frame.name, depth = self.frames.len(), "pop import stack");
        }
    }

    pub(crate) fn top(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.name == name)
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ImportRegistry {
        &mut self.registry
    }

    pub(crate) fn into_registry(self) -> ImportRegistry {
        self.registry
    }

    /// Whether `name` is on the stack and its importer chain leads back to it.
    pub(crate) fn is_chained_import_on_stack(&self, name: &str) -> bool {
        if !self.contains(name) {
            return false;
        }
        let mut visited = FxHashSet::default();
        let mut importing = self.registry.importing_metadata_for(name);
        while let Some(metadata) = importing {
            if metadata.name() == name {
                return true;
            }
            if !visited.insert(metadata.name().clone()) {
                return false;
            }
            importing = self.registry.importing_metadata_for(metadata.name());
        }
        false
    }

    /// The stack by simple name, bottom to top: `[A->B->C]`.
    pub(crate) fn render(&self) -> String {
        let chain: Vec<&str> = self.frames.iter().map(|frame| frame.name.simple_name()).collect();
        format!("[{}]", chain.join("->"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str) -> Arc<TypeMetadata> {
        Arc::new(TypeMetadata::class(name))
    }

    #[test]
    fn test_render() {
        let mut stack = ImportStack::default();
        stack.push(TypeName::new("com.acme.Foo"), None);
        stack.push(TypeName::new("com.acme.Bar"), None);
        stack.push(TypeName::new("com.acme.Outer$Baz"), None);
        assert_eq!(stack.render(), "[Foo->Bar->Baz]");

        stack.pop();
        assert_eq!(stack.top().map(|f| f.name.as_str()), Some("com.acme.Bar"));
    }

    #[test]
    fn test_chained_import_detected() {
        let mut stack = ImportStack::default();
        stack.push(TypeName::new("app.A"), None);
        stack.registry_mut().register_import(meta("app.A"), TypeName::new("app.B"));
        stack.registry_mut().register_import(meta("app.B"), TypeName::new("app.A"));

        assert!(stack.is_chained_import_on_stack("app.A"));
        assert!(!stack.is_chained_import_on_stack("app.B"));
    }

    #[test]
    fn test_chain_walk_terminates_on_foreign_loop() {
        let mut stack = ImportStack::default();
        stack.push(TypeName::new("app.A"), None);
        stack.registry_mut().register_import(meta("app.B"), TypeName::new("app.A"));
        stack.registry_mut().register_import(meta("app.C"), TypeName::new("app.B"));
        stack.registry_mut().register_import(meta("app.B"), TypeName::new("app.C"));

        assert!(!stack.is_chained_import_on_stack("app.A"));
    }

    #[test]
    fn test_most_recent_importer_wins() {
        let mut registry = ImportRegistry::new();
        registry.register_import(meta("app.First"), TypeName::new("app.Helper"));
        registry.register_import(meta("app.Second"), TypeName::new("app.Helper"));
        assert_eq!(
            registry.importing_metadata_for("app.Helper").map(|m| m.name().as_str()),
            Some("app.Second")
        );

        registry.remove_importing_entity("app.Second");
        assert_eq!(
            registry.importing_metadata_for("app.Helper").map(|m| m.name().as_str()),
            Some("app.First")
        );
    }
}

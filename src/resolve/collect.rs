//! Import collection across annotations and meta-annotations.

use indexmap::IndexSet;
use rustc_hash::FxHashSet;

use crate::base::TypeName;
use crate::error::MetadataError;
use crate::metadata::{SourceView, ViewContext, well_known};

/// Gather every import declared on `source`, directly or through any depth
/// of meta-annotations, deduplicated in first-discovery order.
///
/// Each annotation type is visited once. Platform annotations and the import
/// annotation itself are not descended into.
pub fn collect_imports(source: &SourceView, cx: &ViewContext<'_>) -> Result<Vec<SourceView>, MetadataError> {
    let mut imports = IndexSet::new();
    let mut visited = FxHashSet::default();
    collect(source, cx, &mut imports, &mut visited)?;
    Ok(imports.into_iter().collect())
}

fn collect(
    source: &SourceView,
    cx: &ViewContext<'_>,
    imports: &mut IndexSet<SourceView>,
    visited: &mut FxHashSet<TypeName>,
) -> Result<(), MetadataError> {
    if !visited.insert(source.name().clone()) {
        return Ok(());
    }
    for annotation in source.annotations(cx) {
        let name = annotation.name();
        if !cx.config.is_platform(name) && name != well_known::IMPORT {
            collect(&annotation, cx, imports, visited)?;
        }
    }
    imports.extend(source.annotation_class_values(cx, well_known::IMPORT, well_known::attr::VALUE)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResolverConfig;
    use crate::metadata::{AnnotationAttributes, AttributeValue, InMemoryTypeSource, TypeMetadata};

    fn import(names: &[&str]) -> AnnotationAttributes {
        AnnotationAttributes::new(well_known::IMPORT).with(
            well_known::attr::VALUE,
            AttributeValue::Classes(names.iter().map(|n| TypeName::new(*n)).collect()),
        )
    }

    fn collected(types: &InMemoryTypeSource, root: &str) -> Vec<String> {
        let config = ResolverConfig::default();
        let cx = ViewContext::new(types, &config);
        let view = cx.view_for_name(&TypeName::new(root)).unwrap();
        collect_imports(&view, &cx)
            .unwrap()
            .iter()
            .map(|v| v.name().to_string())
            .collect()
    }

    #[test]
    fn test_meta_annotation_imports_first() {
        let types = InMemoryTypeSource::new();
        types.define_all([
            TypeMetadata::class("app.A"),
            TypeMetadata::class("app.B"),
            TypeMetadata::class("app.C"),
            TypeMetadata::annotation_type("app.EnableB").with_annotation(import(&["app.B"])),
            TypeMetadata::annotation_type("app.EnableAll")
                .annotated("app.EnableB")
                .with_annotation(import(&["app.C", "app.B"])),
            TypeMetadata::class("app.Root")
                .annotated("app.EnableAll")
                .with_annotation(import(&["app.A", "app.C"])),
        ]);

        assert_eq!(collected(&types, "app.Root"), vec!["app.B", "app.C", "app.A"]);
    }

    #[test]
    fn test_self_referencing_meta_annotation() {
        let types = InMemoryTypeSource::new();
        types.define_all([
            TypeMetadata::class("app.A"),
            TypeMetadata::annotation_type("app.Loop")
                .annotated("app.Loop")
                .with_annotation(import(&["app.A"])),
            TypeMetadata::class("app.Root").annotated("app.Loop"),
        ]);

        assert_eq!(collected(&types, "app.Root"), vec!["app.A"]);
    }

    #[test]
    fn test_platform_annotations_not_walked() {
        let types = InMemoryTypeSource::new();
        types.define_all([
            TypeMetadata::class("app.A"),
            TypeMetadata::annotation_type("platform.lang.Documented").with_annotation(import(&["app.A"])),
            TypeMetadata::class("app.Root").annotated("platform.lang.Documented"),
        ]);

        assert!(collected(&types, "app.Root").is_empty());
    }
}

//! End-to-end resolution scenarios.
//!
//! Each test builds a small type universe in memory, resolves a set of
//! top-level candidates and checks the resulting model, import registry and
//! problems.

use std::sync::Arc;

use confgraph::diagnostics::codes;
use confgraph::error::BoxError;
use confgraph::metadata::{
    AnnotationAttributes, AttributeValue, InMemoryTypeSource, MethodMetadata, TypeMetadata, well_known,
};
use confgraph::resolve::{
    Aware, ComponentScanner, ConfigurationMode, ConfigurationPhase, ImportRegistrar, RecordingRegistry,
    RegistrySink, ScannedCandidate, StrategyRegistry,
};
use confgraph::{Candidate, ResolveError, Resolver, ResolverConfig, TypeName};

fn import(names: &[&str]) -> AnnotationAttributes {
    AnnotationAttributes::new(well_known::IMPORT).with(
        "value",
        AttributeValue::Classes(names.iter().map(|n| TypeName::new(*n)).collect()),
    )
}

fn config(name: &str) -> TypeMetadata {
    TypeMetadata::class(name).annotated(well_known::CONFIGURATION)
}

fn producer(owner: &str, name: &str) -> MethodMetadata {
    MethodMetadata::new(owner, name).annotated(well_known::PRODUCER)
}

fn entity_names(resolution: &confgraph::Resolution) -> Vec<String> {
    resolution.entities().map(|e| e.name().to_string()).collect()
}

#[test]
fn test_plain_import_registered_before_importer() {
    let types = InMemoryTypeSource::new();
    types.define_all([config("app.Root").with_annotation(import(&["app.Helper"])), TypeMetadata::class("app.Helper")]);

    let resolution = Resolver::new(types).parse([Candidate::named("app.Root")]).unwrap();

    assert_eq!(entity_names(&resolution), vec!["app.Helper", "app.Root"]);
    let helper = resolution.entity("app.Helper").unwrap();
    assert!(helper.is_imported());
    assert!(helper.imported_by().contains("app.Root"));
    assert_eq!(helper.mode(), ConfigurationMode::Lite);
    assert_eq!(
        resolution.importing_metadata_for("app.Helper").map(|m| m.name().as_str()),
        Some("app.Root")
    );
}

#[test]
fn test_mutual_imports_report_one_cycle() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.A").with_annotation(import(&["app.B"])),
        config("app.B").with_annotation(import(&["app.A"])),
    ]);

    let resolution = Resolver::new(types)
        .parse([Candidate::named("app.A"), Candidate::named("app.B")])
        .unwrap();

    let cycles = resolution.problem_collector().problems_with_code(codes::CIRCULAR_IMPORT);
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].message.contains("[A->B]"));
    assert!(cycles[0].message.contains("'B' to import 'A'"));
    assert_eq!(entity_names(&resolution), vec!["app.A", "app.B"]);
    assert!(!resolution.entity("app.A").unwrap().is_imported());
    assert!(!resolution.entity("app.B").unwrap().is_imported());
}

#[test]
fn test_cycle_through_intermediate_entities() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.A").with_annotation(import(&["app.B"])),
        config("app.B").with_annotation(import(&["app.C"])),
        config("app.C").with_annotation(import(&["app.A"])),
    ]);

    let resolution = Resolver::new(types).parse([Candidate::named("app.A")]).unwrap();

    let cycles = resolution.problem_collector().problems_with_code(codes::CIRCULAR_IMPORT);
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].message.contains("[A->B->C]"));
    assert!(cycles[0].message.contains("'C' to import 'A'"));
    assert_eq!(entity_names(&resolution), vec!["app.A", "app.C", "app.B"]);
    assert!(!resolution.entity("app.A").unwrap().is_imported());
}

#[test]
fn test_self_import_reports_cycle() {
    let types = InMemoryTypeSource::new();
    types.define(config("app.A").with_annotation(import(&["app.A"])));

    let resolution = Resolver::new(types).parse([Candidate::named("app.A")]).unwrap();

    let cycles = resolution.problem_collector().problems_with_code(codes::CIRCULAR_IMPORT);
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].message.contains("[A]"));
    assert_eq!(entity_names(&resolution), vec!["app.A"]);
    assert!(!resolution.entity("app.A").unwrap().is_imported());
}

#[test]
fn test_fail_fast_raises_cycle() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.A").with_annotation(import(&["app.B"])),
        config("app.B").with_annotation(import(&["app.A"])),
    ]);

    let err = Resolver::new(types)
        .with_config(ResolverConfig::default().with_fail_fast(true))
        .parse([Candidate::named("app.A")])
        .unwrap_err();

    match err {
        ResolveError::Problem(problem) => assert_eq!(problem.code.as_deref(), Some(codes::CIRCULAR_IMPORT)),
        other => panic!("expected a raised problem, got {other:?}"),
    }
}

#[test]
fn test_member_type_processed_before_enclosing() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.Outer").with_member("app.Outer$Inner").with_member("app.Outer$NotConfig"),
        config("app.Outer$Inner"),
        TypeMetadata::class("app.Outer$NotConfig"),
    ]);

    let resolution = Resolver::new(types).parse([Candidate::named("app.Outer")]).unwrap();

    assert_eq!(entity_names(&resolution), vec!["app.Outer$Inner", "app.Outer"]);
    assert!(resolution.entity("app.Outer$Inner").unwrap().imported_by().contains("app.Outer"));
}

#[test]
fn test_member_importing_enclosing_type_reports_cycle() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.Outer").with_member("app.Outer$Inner"),
        config("app.Outer$Inner").with_annotation(import(&["app.Outer"])),
    ]);

    let resolution = Resolver::new(types).parse([Candidate::named("app.Outer")]).unwrap();

    let cycles = resolution.problem_collector().problems_with_code(codes::CIRCULAR_IMPORT);
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].message.contains("[Outer->Inner]"));
    assert!(cycles[0].message.contains("'Inner' to import 'Outer'"));
    assert!(!resolution.entity("app.Outer").unwrap().is_imported());
    assert!(resolution.entity("app.Outer$Inner").unwrap().imported_by().contains("app.Outer"));
}

#[test]
fn test_member_types_follow_precedence() {
    let order = |value: i64| AnnotationAttributes::new(well_known::ORDER).with("value", AttributeValue::Int(value));
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.Outer").with_member("app.Outer$Late").with_member("app.Outer$Early"),
        config("app.Outer$Late").with_annotation(order(20)),
        config("app.Outer$Early").with_annotation(order(-5)),
    ]);

    let resolution = Resolver::new(types).parse([Candidate::named("app.Outer")]).unwrap();

    assert_eq!(entity_names(&resolution), vec!["app.Outer$Early", "app.Outer$Late", "app.Outer"]);
}

#[test]
fn test_shared_import_merges_importers() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.A").with_annotation(import(&["app.Shared"])),
        config("app.B").with_annotation(import(&["app.Shared"])),
        config("app.Shared"),
    ]);

    let resolution = Resolver::new(types)
        .parse([Candidate::named("app.A"), Candidate::named("app.B")])
        .unwrap();

    assert_eq!(entity_names(&resolution), vec!["app.Shared", "app.A", "app.B"]);
    let importers: Vec<_> = resolution
        .entity("app.Shared")
        .unwrap()
        .imported_by()
        .iter()
        .map(TypeName::as_str)
        .collect();
    assert_eq!(importers, vec!["app.A", "app.B"]);
}

#[test]
fn test_explicit_declaration_supersedes_import() {
    let types = InMemoryTypeSource::new();
    types.define_all([config("app.A").with_annotation(import(&["app.C"])), config("app.C")]);

    let resolution = Resolver::new(types)
        .parse([Candidate::named("app.A"), Candidate::named("app.C").with_bean_name("c")])
        .unwrap();

    assert_eq!(entity_names(&resolution), vec!["app.A", "app.C"]);
    let c = resolution.entity("app.C").unwrap();
    assert!(!c.is_imported());
    assert_eq!(c.bean_name(), Some("c"));
}

#[test]
fn test_import_does_not_replace_explicit_declaration() {
    let types = InMemoryTypeSource::new();
    types.define_all([config("app.A").with_annotation(import(&["app.C"])), config("app.C")]);

    let resolution = Resolver::new(types)
        .parse([Candidate::named("app.C"), Candidate::named("app.A")])
        .unwrap();

    assert_eq!(entity_names(&resolution), vec!["app.C", "app.A"]);
    assert!(!resolution.entity("app.C").unwrap().is_imported());
}

#[test]
fn test_superseding_declaration_walks_superclass_again() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.A").with_annotation(import(&["app.C"])),
        config("app.C").with_superclass("app.Base"),
        TypeMetadata::class("app.Base").with_method(producer("app.Base", "dataSource")),
    ]);

    let resolution = Resolver::new(types)
        .parse([Candidate::named("app.A"), Candidate::named("app.C")])
        .unwrap();

    assert_eq!(entity_names(&resolution), vec!["app.A", "app.C"]);
    let c = resolution.entity("app.C").unwrap();
    assert!(!c.is_imported());
    assert_eq!(c.producer_methods().len(), 1);
    assert_eq!(c.producer_methods()[0].method.declaring_type(), "app.Base");
}

#[test]
fn test_superclass_chain_contributes_once() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.First").with_superclass("app.Base"),
        config("app.Second").with_superclass("app.Base"),
        TypeMetadata::class("app.Base")
            .with_superclass("platform.lang.Object")
            .with_annotation(import(&["app.Extra"]))
            .with_method(producer("app.Base", "dataSource")),
        TypeMetadata::class("app.Extra"),
    ]);

    let resolution = Resolver::new(types)
        .parse([Candidate::named("app.First"), Candidate::named("app.Second")])
        .unwrap();

    assert_eq!(entity_names(&resolution), vec!["app.Extra", "app.First", "app.Second"]);
    let first = resolution.entity("app.First").unwrap();
    assert_eq!(first.producer_methods().len(), 1);
    assert_eq!(first.producer_methods()[0].method.declaring_type(), "app.Base");
    assert!(resolution.entity("app.Second").unwrap().producer_methods().is_empty());
    assert!(resolution.entity("app.Base").is_none());
}

#[test]
fn test_interface_default_producers() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.Config")
            .with_interface("app.Defaults")
            .with_method(producer("app.Config", "own")),
        TypeMetadata::interface("app.Defaults")
            .with_interface("app.MoreDefaults")
            .with_method(producer("app.Defaults", "concrete"))
            .with_method(producer("app.Defaults", "declaredOnly").with_abstract(true)),
        TypeMetadata::interface("app.MoreDefaults").with_method(producer("app.MoreDefaults", "inherited")),
    ]);

    let resolution = Resolver::new(types).parse([Candidate::named("app.Config")]).unwrap();

    let names: Vec<_> = resolution
        .entity("app.Config")
        .unwrap()
        .producer_methods()
        .iter()
        .map(|p| p.method.name().to_string())
        .collect();
    assert_eq!(names, vec!["own", "concrete", "inherited"]);
}

#[test]
fn test_import_resources_resolve_placeholders() {
    let types = InMemoryTypeSource::new();
    types.define(
        config("app.Legacy").with_annotation(
            AnnotationAttributes::new(well_known::IMPORT_RESOURCE)
                .with("locations", AttributeValue::Strs(vec!["${legacy.dir:conf}/beans.xml".into()]))
                .with("reader", AttributeValue::Class(TypeName::new("app.XmlReader"))),
        ),
    );
    let registry = Arc::new(RecordingRegistry::new());

    let resolution = Resolver::new(types).parse([Candidate::named("app.Legacy")]).unwrap();
    resolution.publish(registry.as_ref()).unwrap();

    let published = registry.imported_resources();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "app.Legacy");
    assert_eq!(published[0].1.location, "conf/beans.xml");
    assert_eq!(published[0].1.reader.as_ref().map(TypeName::as_str), Some("app.XmlReader"));
}

#[test]
fn test_import_resources_found_on_composed_annotation() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        TypeMetadata::annotation_type("app.LegacyBeans").with_annotation(
            AnnotationAttributes::new(well_known::IMPORT_RESOURCE)
                .with("value", AttributeValue::Strs(vec!["legacy/beans.xml".into()])),
        ),
        config("app.Legacy").annotated("app.LegacyBeans"),
    ]);

    let resolution = Resolver::new(types).parse([Candidate::named("app.Legacy")]).unwrap();

    let locations: Vec<_> = resolution
        .entity("app.Legacy")
        .unwrap()
        .imported_resources()
        .map(|resource| resource.location.as_str())
        .collect();
    assert_eq!(locations, vec!["legacy/beans.xml"]);
}

struct DataSourceRegistrar;

impl Aware for DataSourceRegistrar {}

impl ImportRegistrar for DataSourceRegistrar {
    fn register(&self, importing: &TypeMetadata, registry: &dyn RegistrySink) -> Result<(), BoxError> {
        let name = format!("{}.dataSource", importing.name().simple_name());
        registry.register_definition(&name, &TypeName::new("app.DataSource"));
        Ok(())
    }
}

#[test]
fn test_registrar_attached_and_published() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.Root").with_annotation(import(&["app.DataSourceRegistrar"])),
        TypeMetadata::class("app.DataSourceRegistrar").with_interface(well_known::IMPORT_REGISTRAR),
    ]);
    let strategies = StrategyRegistry::new().with_registrar("app.DataSourceRegistrar", || DataSourceRegistrar);
    let registry = RecordingRegistry::new();

    let resolution = Resolver::new(types)
        .with_strategies(strategies)
        .parse([Candidate::named("app.Root")])
        .unwrap();
    assert_eq!(entity_names(&resolution), vec!["app.Root"]);
    assert_eq!(resolution.entity("app.Root").unwrap().registrars().len(), 1);

    resolution.publish(&registry).unwrap();
    assert_eq!(
        registry.registrars(),
        vec![(TypeName::new("app.Root"), TypeName::new("app.DataSourceRegistrar"))]
    );
    assert!(registry.contains_definition("Root.dataSource"));
    assert_eq!(registry.entities(), vec![TypeName::new("app.Root")]);
}

#[test]
fn test_unknown_selector_fails_parse() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.Root").with_annotation(import(&["app.Mystery"])),
        TypeMetadata::class("app.Mystery").with_interface(well_known::IMPORT_SELECTOR),
    ]);

    let err = Resolver::new(types).parse([Candidate::named("app.Root")]).unwrap_err();

    match err {
        ResolveError::Parse { candidate, source } => {
            assert_eq!(candidate, "app.Root");
            assert!(matches!(*source, ResolveError::ImportProcessing { ref owner, .. } if owner == "app.Root"));
        }
        other => panic!("expected a parse failure, got {other:?}"),
    }
}

#[test]
fn test_conditions_skip_entities() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.Root").with_annotation(import(&["app.Disabled", "app.Enabled"])),
        config("app.Disabled"),
        config("app.Enabled"),
    ]);
    let skip_disabled = |metadata: &TypeMetadata, phase: ConfigurationPhase| {
        phase == ConfigurationPhase::ParseConfiguration && metadata.name() == "app.Disabled"
    };

    let resolution = Resolver::new(types)
        .with_conditions(skip_disabled)
        .parse([Candidate::named("app.Root")])
        .unwrap();

    assert_eq!(entity_names(&resolution), vec!["app.Enabled", "app.Root"]);
}

struct FixedScanner {
    found: Vec<Arc<TypeMetadata>>,
}

impl ComponentScanner for FixedScanner {
    fn scan(&self, _declaration: &AnnotationAttributes, _owner: &TypeName) -> Result<Vec<ScannedCandidate>, BoxError> {
        Ok(self
            .found
            .iter()
            .map(|metadata| ScannedCandidate::new(metadata.name().simple_name().to_lowercase(), metadata.clone()))
            .collect())
    }
}

#[test]
fn test_component_scan_results_processed_explicitly() {
    let types = InMemoryTypeSource::new();
    types.define(config("app.Root").annotated(well_known::COMPONENT_SCAN));
    let scanner = FixedScanner {
        found: vec![
            Arc::new(TypeMetadata::class("app.scan.Service").annotated(well_known::COMPONENT)),
            Arc::new(TypeMetadata::class("app.scan.Plain")),
        ],
    };

    let resolution = Resolver::new(types)
        .with_scanner(scanner)
        .parse([Candidate::named("app.Root")])
        .unwrap();

    assert_eq!(entity_names(&resolution), vec!["app.scan.Service", "app.Root"]);
    let service = resolution.entity("app.scan.Service").unwrap();
    assert_eq!(service.bean_name(), Some("service"));
    assert!(!service.is_imported());
}

#[test]
fn test_validate_reports_proxying_constraints() {
    let types = InMemoryTypeSource::new();
    types.define_all([
        config("app.Sealed").with_final(true),
        config("app.Hidden").with_method(producer("app.Hidden", "secret").with_private(true)),
        TypeMetadata::class("app.LiteFinal")
            .annotated(well_known::COMPONENT)
            .with_final(true),
    ]);

    let mut resolution = Resolver::new(types)
        .parse([
            Candidate::named("app.Sealed"),
            Candidate::named("app.Hidden"),
            Candidate::named("app.LiteFinal"),
        ])
        .unwrap();
    assert!(resolution.problems().is_empty());

    assert_eq!(resolution.validate(), 2);
    let problems = resolution.problem_collector();
    assert_eq!(problems.problems_with_code(codes::FINAL_CONFIGURATION).len(), 1);
    assert_eq!(problems.problems_for_entity("app.Hidden").len(), 1);
    assert!(resolution.has_errors());
    assert_eq!(resolution.len(), 3);
}

#[test]
fn test_loaded_and_metadata_candidates() {
    let types = InMemoryTypeSource::new();
    types.define(config("app.Loaded"));

    let resolution = Resolver::new(types)
        .parse([
            Candidate::loaded("app.Loaded"),
            Candidate::metadata(config("app.Prebuilt")),
        ])
        .unwrap();

    assert_eq!(entity_names(&resolution), vec!["app.Loaded", "app.Prebuilt"]);
    assert_eq!(resolution.entity("app.Prebuilt").unwrap().mode(), ConfigurationMode::Full);
}

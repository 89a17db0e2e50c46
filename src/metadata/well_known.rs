//! Names of the annotations and capabilities the resolver understands.

use crate::base::TypeName;

/// Marks a full configuration source.
pub const CONFIGURATION: &str = "confgraph.annotation.Configuration";
/// Marks a component; qualifies a type as a lite configuration source.
pub const COMPONENT: &str = "confgraph.annotation.Component";
/// Requests a component scan.
pub const COMPONENT_SCAN: &str = "confgraph.annotation.ComponentScan";
/// Container for repeated [`COMPONENT_SCAN`] declarations.
pub const COMPONENT_SCANS: &str = "confgraph.annotation.ComponentScans";
/// Declares imports through its `value` attribute.
pub const IMPORT: &str = "confgraph.annotation.Import";
/// Declares nested import-resource directives.
pub const IMPORT_RESOURCE: &str = "confgraph.annotation.ImportResource";
/// Declares a resource-backed property layer.
pub const PROPERTY_SOURCE: &str = "confgraph.annotation.PropertySource";
/// Container for repeated [`PROPERTY_SOURCE`] declarations.
pub const PROPERTY_SOURCES: &str = "confgraph.annotation.PropertySources";
/// Marks a producer method.
pub const PRODUCER: &str = "confgraph.annotation.Produces";
/// Declares a precedence order through its `value` attribute.
pub const ORDER: &str = "confgraph.annotation.Order";

/// Capability: computes further imports from the importing entity's metadata.
pub const IMPORT_SELECTOR: &str = "confgraph.strategy.ImportSelector";
/// Capability: an import selector resolved in the deferred, grouped phase.
pub const DEFERRED_IMPORT_SELECTOR: &str = "confgraph.strategy.DeferredImportSelector";
/// Capability: registers downstream effects instead of naming imports.
pub const IMPORT_REGISTRAR: &str = "confgraph.strategy.ImportRegistrar";

/// Check whether capability `name` refines `capability`.
pub fn refines_capability(name: &str, capability: &str) -> bool {
    name == DEFERRED_IMPORT_SELECTOR && capability == IMPORT_SELECTOR
}

/// Attribute keys used by the well-known annotations.
pub mod attr {
    pub const VALUE: &str = "value";
    pub const NAME: &str = "name";
    pub const ENCODING: &str = "encoding";
    pub const IGNORE_RESOURCE_NOT_FOUND: &str = "ignoreResourceNotFound";
    pub const FACTORY: &str = "factory";
    pub const LOCATIONS: &str = "locations";
    pub const READER: &str = "reader";
}

/// Build the [`TypeName`] of a well-known constant.
#[inline]
pub fn name(constant: &str) -> TypeName {
    TypeName::new(constant)
}

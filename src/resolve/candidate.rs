//! Configuration candidate classification.

use crate::metadata::{SourceView, ViewContext, well_known};

/// Annotations that make a type a lite configuration candidate.
const LITE_INDICATORS: [&str; 4] = [
    well_known::COMPONENT,
    well_known::COMPONENT_SCAN,
    well_known::IMPORT,
    well_known::IMPORT_RESOURCE,
];

/// How strongly a type declares itself a configuration source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigurationMode {
    /// Annotated `Configuration`; producer methods are proxied.
    Full,
    /// Any other qualifying type; producer methods are plain factories.
    Lite,
}

/// Classify a type as a configuration candidate.
///
/// Interfaces and annotation types never qualify.
pub fn classify(view: &SourceView, cx: &ViewContext<'_>) -> Option<ConfigurationMode> {
    if view.metadata().is_interface() {
        return None;
    }
    if view.has_annotation(cx, well_known::CONFIGURATION) {
        return Some(ConfigurationMode::Full);
    }
    let lite = LITE_INDICATORS.iter().any(|ann| view.has_annotation(cx, ann))
        || !view.metadata().annotated_methods(well_known::PRODUCER).is_empty();
    lite.then_some(ConfigurationMode::Lite)
}

/// The mode an entity is processed in, whether or not it qualifies on its own.
pub(crate) fn mode_of(view: &SourceView, cx: &ViewContext<'_>) -> ConfigurationMode {
    classify(view, cx).unwrap_or(ConfigurationMode::Lite)
}

//! Property source merging.
//!
//! Declared property sources become named layers in the session's
//! [`PropertyLayers`]. Names are tracked in discovery order: a new name goes
//! to the end when it is the first one, and otherwise immediately before the
//! most recently added name, so one batch of declarations stays contiguous.
//! A repeated name folds the new layer into a composite of that name, the new
//! contribution first.

use std::sync::Arc;

use tracing::info;

use crate::base::TypeName;
use crate::diagnostics::ProblemCollector;
use crate::env::{EncodedResource, PropertyLayer, PropertyLayerFactory, PropertyLayers};
use crate::error::{PlaceholderError, ResolveError, StrategyError};
use crate::metadata::{AnnotationAttributes, well_known};
use crate::metadata::well_known::attr;

use super::driver::Session;

/// Merges property layers into an ordered layer set.
#[derive(Clone, Debug, Default)]
pub struct PropertySourceMerger {
    layers: PropertyLayers,
    names: Vec<String>,
}

impl PropertySourceMerger {
    /// Create a merger on top of existing layers, which keep their positions.
    pub fn new(layers: PropertyLayers) -> Self {
        Self {
            layers,
            names: Vec::new(),
        }
    }

    /// Merge one layer.
    pub fn add(&mut self, layer: PropertyLayer) {
        let name = layer.name().to_string();
        if self.names.contains(&name) {
            if let Some(existing) = self.layers.get_mut(&name) {
                let incoming = layer.with_resource_name();
                if existing.is_composite() {
                    existing.add_first_member(incoming);
                } else {
                    let previous = std::mem::replace(existing, PropertyLayer::composite(name.as_str()));
                    existing.add_member(incoming);
                    existing.add_member(previous.with_resource_name());
                }
                return;
            }
        }

        match self.names.last() {
            None => self.layers.add_last(layer),
            Some(last) => self.layers.add_before(last, layer),
        }
        self.names.push(name);
    }

    pub fn layers(&self) -> &PropertyLayers {
        &self.layers
    }

    /// Names merged so far, in discovery order.
    pub fn merged_names(&self) -> &[String] {
        &self.names
    }

    pub fn into_layers(self) -> PropertyLayers {
        self.layers
    }
}

impl Session<'_> {
    /// Merge the layers declared by one property-source declaration on `owner`.
    pub(crate) fn process_property_source(
        &mut self,
        owner: &TypeName,
        declaration: &AnnotationAttributes,
    ) -> Result<(), ResolveError> {
        let name = declaration.string(attr::NAME)?.map(str::to_string);
        let encoding = declaration
            .string(attr::ENCODING)?
            .unwrap_or(self.resolver.config.default_encoding.as_str())
            .to_string();
        let locations = declaration.strings(attr::VALUE)?;
        if locations.is_empty() {
            return Err(ResolveError::InvalidDeclaration {
                owner: owner.clone(),
                annotation: well_known::name(well_known::PROPERTY_SOURCE),
                reason: "at least one location is required".to_string(),
            });
        }
        let ignore_not_found = declaration.boolean(attr::IGNORE_RESOURCE_NOT_FOUND)?;
        let factory: Arc<dyn PropertyLayerFactory> = match declaration.class(attr::FACTORY)? {
            Some(factory) => self
                .resolver
                .layer_factories
                .get(factory)
                .cloned()
                .ok_or_else(|| StrategyError::Unknown(factory.clone()))?,
            None => self.resolver.layer_factory.clone(),
        };

        for location in &locations {
            match self.load_layer(location, name.as_deref(), &encoding, factory.as_ref()) {
                Ok(layer) => self.merger.add(layer),
                Err(err) if ignore_not_found && is_not_resolvable(&err) => {
                    info!(location = %location, "properties location not resolvable: {err}");
                    self.report(ProblemCollector::ignored_resource(owner, location, &err.to_string()))?;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn load_layer(
        &self,
        location: &str,
        name: Option<&str>,
        encoding: &str,
        factory: &dyn PropertyLayerFactory,
    ) -> Result<PropertyLayer, ResolveError> {
        let resolved = self
            .resolver
            .placeholders
            .resolve_required(location, self.merger.layers())?;
        let resource = self.resolver.resources.load(&resolved)?;
        Ok(factory.create_layer(name, &EncodedResource::new(resource, encoding))?)
    }
}

/// Failures tolerated by a declaration that ignores missing resources.
fn is_not_resolvable(err: &ResolveError) -> bool {
    match err {
        ResolveError::Resource(err) => err.is_not_found(),
        ResolveError::Placeholder(PlaceholderError::Unresolvable { .. }) => true,
        _ => false,
    }
}

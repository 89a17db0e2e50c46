//! Environment layer — property layers and the collaborators that fill them.
//!
//! - [`PropertyLayers`] - Ordered, named layers; earlier layers win
//! - [`ResourceLoader`] - Loads the bytes behind a location
//! - [`PropertyLayerFactory`] - Turns a resource into a [`PropertyLayer`]
//! - [`PlaceholderResolver`] - Expands `${...}` in declared locations

mod factory;
mod layers;
mod placeholder;
mod resource;

pub use factory::{EncodedResource, PropertiesLayerFactory, PropertyLayerFactory, parse_properties};
pub use layers::{CompositeLayer, MapLayer, PropertyLayer, PropertyLayers};
pub use placeholder::{PlaceholderResolver, StandardPlaceholderResolver};
pub use resource::{FileSystemResourceLoader, InMemoryResourceLoader, Resource, ResourceLoader};

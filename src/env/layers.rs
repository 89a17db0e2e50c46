//! Named property layers and the ordered layer set.

use std::sync::Arc;

use indexmap::IndexMap;

// ============================================================================
// PROPERTY LAYER
// ============================================================================

/// A named set of properties.
///
/// Layers are identified by name: two layers with the same name are the same
/// layer as far as [`PropertyLayers`] and composites are concerned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyLayer {
    /// Properties held directly, optionally read from a resource.
    Map(MapLayer),
    /// Several layers under one name; the first member holding a key wins.
    Composite(CompositeLayer),
}

/// A flat property layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapLayer {
    name: Arc<str>,
    resource_name: Option<Arc<str>>,
    properties: IndexMap<String, String>,
}

/// A layer combining several layers under a single name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeLayer {
    name: Arc<str>,
    members: Vec<PropertyLayer>,
}

impl PropertyLayer {
    /// Create a map layer.
    pub fn map(name: impl Into<Arc<str>>, properties: IndexMap<String, String>) -> Self {
        PropertyLayer::Map(MapLayer {
            name: name.into(),
            resource_name: None,
            properties,
        })
    }

    /// Create a map layer read from a resource.
    pub fn from_resource(
        name: impl Into<Arc<str>>,
        resource_name: impl Into<Arc<str>>,
        properties: IndexMap<String, String>,
    ) -> Self {
        PropertyLayer::Map(MapLayer {
            name: name.into(),
            resource_name: Some(resource_name.into()),
            properties,
        })
    }

    /// Create an empty composite layer.
    pub fn composite(name: impl Into<Arc<str>>) -> Self {
        PropertyLayer::Composite(CompositeLayer {
            name: name.into(),
            members: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            PropertyLayer::Map(layer) => &layer.name,
            PropertyLayer::Composite(layer) => &layer.name,
        }
    }

    /// Description of the backing resource, for resource-backed map layers.
    pub fn resource_name(&self) -> Option<&str> {
        match self {
            PropertyLayer::Map(layer) => layer.resource_name.as_deref(),
            PropertyLayer::Composite(_) => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, PropertyLayer::Composite(_))
    }

    /// Members of a composite layer; empty for map layers.
    pub fn members(&self) -> &[PropertyLayer] {
        match self {
            PropertyLayer::Map(_) => &[],
            PropertyLayer::Composite(layer) => &layer.members,
        }
    }

    /// Look up a property.
    pub fn property(&self, key: &str) -> Option<&str> {
        match self {
            PropertyLayer::Map(layer) => layer.properties.get(key).map(String::as_str),
            PropertyLayer::Composite(layer) => layer.members.iter().find_map(|m| m.property(key)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    /// All property keys, first occurrence wins for composites.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            PropertyLayer::Map(layer) => layer.properties.keys().map(String::as_str).collect(),
            PropertyLayer::Composite(layer) => {
                let mut keys: indexmap::IndexSet<&str> = indexmap::IndexSet::new();
                for member in &layer.members {
                    keys.extend(member.keys());
                }
                keys.into_iter().collect()
            }
        }
    }

    /// The same layer renamed to its resource description.
    ///
    /// Layers folded into a composite keep their resource description as
    /// their name so that the members stay distinguishable.
    pub fn with_resource_name(self) -> Self {
        match self {
            PropertyLayer::Map(mut layer) => {
                if let Some(resource) = &layer.resource_name {
                    layer.name = resource.clone();
                }
                PropertyLayer::Map(layer)
            }
            composite => composite,
        }
    }

    /// Add a member with the highest precedence. Ignored on map layers.
    pub fn add_first_member(&mut self, member: PropertyLayer) {
        if let PropertyLayer::Composite(layer) = self {
            layer.members.retain(|m| m.name() != member.name());
            layer.members.insert(0, member);
        }
    }

    /// Add a member with the lowest precedence, unless a member of that name exists.
    pub fn add_member(&mut self, member: PropertyLayer) {
        if let PropertyLayer::Composite(layer) = self {
            if !layer.members.iter().any(|m| m.name() == member.name()) {
                layer.members.push(member);
            }
        }
    }
}

// ============================================================================
// LAYER SET
// ============================================================================

/// An ordered set of named layers; earlier layers take precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyLayers {
    layers: Vec<PropertyLayer>,
}

impl PropertyLayers {
    /// Create a new empty layer set.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name() == name)
    }

    fn remove_named(&mut self, name: &str) {
        if let Some(idx) = self.position(name) {
            self.layers.remove(idx);
        }
    }

    /// Add a layer with the highest precedence, replacing any of the same name.
    pub fn add_first(&mut self, layer: PropertyLayer) {
        self.remove_named(layer.name());
        self.layers.insert(0, layer);
    }

    /// Add a layer with the lowest precedence, replacing any of the same name.
    pub fn add_last(&mut self, layer: PropertyLayer) {
        self.remove_named(layer.name());
        self.layers.push(layer);
    }

    /// Add a layer immediately before `relative`.
    ///
    /// Falls back to [`add_last`](Self::add_last) when `relative` is unknown.
    pub fn add_before(&mut self, relative: &str, layer: PropertyLayer) {
        if relative == layer.name() {
            self.replace(layer);
            return;
        }
        self.remove_named(layer.name());
        match self.position(relative) {
            Some(idx) => self.layers.insert(idx, layer),
            None => self.layers.push(layer),
        }
    }

    /// Substitute the layer of the same name in place. Returns `false` if absent.
    pub fn replace(&mut self, layer: PropertyLayer) -> bool {
        match self.position(layer.name()) {
            Some(idx) => {
                self.layers[idx] = layer;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyLayer> {
        self.layers.iter().find(|layer| layer.name() == name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut PropertyLayer> {
        self.layers.iter_mut().find(|layer| layer.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Layer names in precedence order.
    pub fn names(&self) -> Vec<&str> {
        self.layers.iter().map(PropertyLayer::name).collect()
    }

    /// Look up a property; the first layer holding the key wins.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.layers.iter().find_map(|layer| layer.property(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyLayer> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(name: &str, pairs: &[(&str, &str)]) -> PropertyLayer {
        PropertyLayer::map(
            name,
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        )
    }

    #[test]
    fn test_first_layer_wins() {
        let mut layers = PropertyLayers::new();
        layers.add_last(layer("a", &[("k", "1")]));
        layers.add_last(layer("b", &[("k", "2"), ("only", "b")]));

        assert_eq!(layers.property("k"), Some("1"));
        assert_eq!(layers.property("only"), Some("b"));
        assert_eq!(layers.property("missing"), None);
    }

    #[test]
    fn test_add_before() {
        let mut layers = PropertyLayers::new();
        layers.add_last(layer("a", &[]));
        layers.add_last(layer("c", &[]));
        layers.add_before("c", layer("b", &[]));
        layers.add_before("nowhere", layer("d", &[]));

        assert_eq!(layers.names(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_add_replaces_same_name() {
        let mut layers = PropertyLayers::new();
        layers.add_last(layer("a", &[("k", "old")]));
        layers.add_last(layer("b", &[]));
        layers.add_first(layer("a", &[("k", "new")]));

        assert_eq!(layers.names(), vec!["a", "b"]);
        assert_eq!(layers.property("k"), Some("new"));
    }

    #[test]
    fn test_composite_first_member_wins() {
        let mut composite = PropertyLayer::composite("p");
        composite.add_member(layer("old", &[("k", "old"), ("x", "1")]));
        composite.add_first_member(layer("new", &[("k", "new")]));

        assert_eq!(composite.property("k"), Some("new"));
        assert_eq!(composite.property("x"), Some("1"));
        assert_eq!(composite.keys(), vec!["k", "x"]);
    }

    #[test]
    fn test_with_resource_name() {
        let backed = PropertyLayer::from_resource("p", "file [a.properties]", IndexMap::new());
        assert_eq!(backed.with_resource_name().name(), "file [a.properties]");

        let plain = layer("p", &[]);
        assert_eq!(plain.with_resource_name().name(), "p");
    }
}

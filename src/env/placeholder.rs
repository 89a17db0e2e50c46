//! `${...}` placeholder resolution.

use indexmap::IndexMap;

use crate::error::PlaceholderError;

use super::layers::PropertyLayers;

const PREFIX: &str = "${";
const SUFFIX: char = '}';
const VALUE_SEPARATOR: char = ':';

/// Resolves placeholders in declaration strings.
pub trait PlaceholderResolver: Send + Sync {
    /// Resolve every placeholder in `text`, failing if any cannot be resolved.
    fn resolve_required(&self, text: &str, layers: &PropertyLayers) -> Result<String, PlaceholderError>;
}

/// Resolves `${key}` and `${key:default}` against the current property layers,
/// then against a fallback map.
///
/// Placeholders nest: `${${env}.url}` resolves `env` first. Resolved values are
/// themselves resolved, and a key that resolves back to itself is reported as
/// [`PlaceholderError::Circular`].
#[derive(Clone, Debug, Default)]
pub struct StandardPlaceholderResolver {
    fallback: IndexMap<String, String>,
}

impl StandardPlaceholderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fallback property consulted after the layers.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fallback.insert(key.into(), value.into());
        self
    }

    fn lookup(&self, key: &str, layers: &PropertyLayers) -> Option<String> {
        layers
            .property(key)
            .or_else(|| self.fallback.get(key).map(String::as_str))
            .map(str::to_string)
    }

    fn parse(
        &self,
        text: &str,
        layers: &PropertyLayers,
        visiting: &mut Vec<String>,
    ) -> Result<String, PlaceholderError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find(PREFIX) {
            out.push_str(&rest[..start]);
            let body = &rest[start + PREFIX.len()..];
            let end = placeholder_end(body).ok_or_else(|| PlaceholderError::Unterminated {
                text: text.to_string(),
            })?;

            let placeholder = self.parse(&body[..end], layers, visiting)?;
            if visiting.contains(&placeholder) {
                return Err(PlaceholderError::Circular { key: placeholder });
            }

            let value = self.lookup(&placeholder, layers).or_else(|| {
                let (key, default) = placeholder.split_once(VALUE_SEPARATOR)?;
                Some(self.lookup(key, layers).unwrap_or_else(|| default.to_string()))
            });
            let Some(value) = value else {
                return Err(PlaceholderError::Unresolvable {
                    key: placeholder,
                    text: text.to_string(),
                });
            };

            visiting.push(placeholder);
            let resolved = self.parse(&value, layers, visiting)?;
            visiting.pop();

            out.push_str(&resolved);
            rest = &body[end + SUFFIX.len_utf8()..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl PlaceholderResolver for StandardPlaceholderResolver {
    fn resolve_required(&self, text: &str, layers: &PropertyLayers) -> Result<String, PlaceholderError> {
        self.parse(text, layers, &mut Vec::new())
    }
}

/// Index of the suffix closing a placeholder body, skipping nested placeholders.
fn placeholder_end(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut idx = 0;
    while idx < body.len() {
        let tail = &body[idx..];
        if tail.starts_with(PREFIX) {
            depth += 1;
            idx += PREFIX.len();
        } else if tail.starts_with(SUFFIX) {
            if depth == 0 {
                return Some(idx);
            }
            depth -= 1;
            idx += SUFFIX.len_utf8();
        } else {
            idx += tail.chars().next().map_or(1, char::len_utf8);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::PropertyLayer;
    use rstest::rstest;

    fn layers(pairs: &[(&str, &str)]) -> PropertyLayers {
        let mut layers = PropertyLayers::new();
        layers.add_last(PropertyLayer::map(
            "test",
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        ));
        layers
    }

    #[rstest]
    #[case("plain.properties", "plain.properties")]
    #[case("${env}.properties", "dev.properties")]
    #[case("${missing:fallback}.properties", "fallback.properties")]
    #[case("${env:prod}", "dev")]
    #[case("${${selector}}", "dev")]
    #[case("${alias}", "dev")]
    #[case("${from.fallback}", "map")]
    #[case("a-${env}-${env}", "a-dev-dev")]
    fn test_resolve(#[case] text: &str, #[case] expected: &str) {
        let resolver = StandardPlaceholderResolver::new().with_property("from.fallback", "map");
        let layers = layers(&[("env", "dev"), ("selector", "env"), ("alias", "${env}")]);
        assert_eq!(resolver.resolve_required(text, &layers).unwrap(), expected);
    }

    #[test]
    fn test_layers_take_precedence_over_fallback() {
        let resolver = StandardPlaceholderResolver::new().with_property("env", "fallback");
        let layers = layers(&[("env", "layer")]);
        assert_eq!(resolver.resolve_required("${env}", &layers).unwrap(), "layer");
    }

    #[test]
    fn test_unresolvable() {
        let resolver = StandardPlaceholderResolver::new();
        let err = resolver.resolve_required("x-${nope}", &PropertyLayers::new()).unwrap_err();
        assert_eq!(
            err,
            PlaceholderError::Unresolvable {
                key: "nope".into(),
                text: "x-${nope}".into()
            }
        );
    }

    #[test]
    fn test_circular() {
        let resolver = StandardPlaceholderResolver::new();
        let layers = layers(&[("a", "${b}"), ("b", "${a}")]);
        assert!(matches!(
            resolver.resolve_required("${a}", &layers),
            Err(PlaceholderError::Circular { .. })
        ));
    }

    #[test]
    fn test_unterminated() {
        let resolver = StandardPlaceholderResolver::new();
        assert!(matches!(
            resolver.resolve_required("${a", &PropertyLayers::new()),
            Err(PlaceholderError::Unterminated { .. })
        ));
    }
}

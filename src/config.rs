//! Resolver configuration.

/// Knobs controlling a [`Resolver`](crate::resolve::Resolver).
///
/// Built with `Default` plus `with_*` methods:
///
/// ```
/// use confgraph::ResolverConfig;
///
/// let config = ResolverConfig::default()
///     .with_fail_fast(true)
///     .with_platform_prefix("std.");
/// assert!(config.fail_fast);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolverConfig {
    /// Namespaces belonging to the platform's built-in types. Annotations and
    /// superclasses in these namespaces are never walked.
    pub platform_prefixes: Vec<String>,
    /// Whether deferred selectors are batched until every top-level candidate
    /// has been processed. When disabled they run immediately.
    pub deferred_imports: bool,
    /// Raise the first error-level problem instead of collecting it.
    pub fail_fast: bool,
    /// Encoding used for property resources that declare none.
    pub default_encoding: String,
    /// Reconcile runtime producer-method order against static metadata.
    pub reconcile_method_order: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            platform_prefixes: vec!["platform.".to_string()],
            deferred_imports: true,
            fail_fast: false,
            default_encoding: "UTF-8".to_string(),
            reconcile_method_order: true,
        }
    }
}

impl ResolverConfig {
    /// Add a platform namespace prefix.
    pub fn with_platform_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !self.platform_prefixes.contains(&prefix) {
            self.platform_prefixes.push(prefix);
        }
        self
    }

    /// Enable or disable the deferred import phase.
    pub fn with_deferred_imports(mut self, enabled: bool) -> Self {
        self.deferred_imports = enabled;
        self
    }

    /// Enable or disable fail-fast problem reporting.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the default resource encoding.
    pub fn with_default_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.default_encoding = encoding.into();
        self
    }

    /// Enable or disable producer-method order reconciliation.
    pub fn with_reconcile_method_order(mut self, enabled: bool) -> Self {
        self.reconcile_method_order = enabled;
        self
    }

    /// Check if a name belongs to the platform's built-in namespace.
    pub fn is_platform(&self, name: &str) -> bool {
        self.platform_prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert!(config.deferred_imports);
        assert!(!config.fail_fast);
        assert_eq!(config.default_encoding, "UTF-8");
        assert!(config.is_platform("platform.lang.Object"));
        assert!(!config.is_platform("app.Config"));
    }

    #[test]
    fn test_platform_prefix_not_duplicated() {
        let config = ResolverConfig::default()
            .with_platform_prefix("platform.")
            .with_platform_prefix("std.");
        assert_eq!(config.platform_prefixes, vec!["platform.", "std."]);
    }
}

//! Fully-qualified type names.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use smol_str::SmolStr;
use thiserror::Error;

/// Error produced when validating a type name.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("type name must not be empty")]
    Empty,
    #[error("type name '{name}' has an invalid segment '{segment}'")]
    InvalidSegment { name: String, segment: String },
}

/// The identity of a declared type, e.g. `app.config.DataConfig`.
///
/// Two types with the same `TypeName` are the same type everywhere in the
/// resolver: configuration entities, Source Views and import provenance are
/// all keyed by it.
///
/// Nested types use `$` as separator (`app.Outer$Inner`), so the simple name
/// of a nested type is the part after the last `$`.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TypeName(SmolStr);

impl TypeName {
    /// Create a TypeName without validation.
    #[inline]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name.as_ref()))
    }

    /// Create a TypeName, checking that every segment is an identifier.
    pub fn parse(name: &str) -> Result<Self, NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        for segment in name.split(['.', '$']) {
            if !is_identifier(segment) {
                return Err(NameError::InvalidSegment {
                    name: name.to_string(),
                    segment: segment.to_string(),
                });
            }
        }
        Ok(Self::new(name))
    }

    /// Get the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The unqualified name: `app.Outer$Inner` -> `Inner`.
    pub fn simple_name(&self) -> &str {
        match self.0.rfind(['.', '$']) {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// The package part: `app.config.DataConfig` -> `app.config`.
    pub fn package(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Check whether the name lives in a namespace starting with `prefix`.
    #[inline]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeName({})", self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    #[inline]
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    #[inline]
    fn from(name: String) -> Self {
        Self(SmolStr::from(name))
    }
}

impl From<&TypeName> for TypeName {
    #[inline]
    fn from(name: &TypeName) -> Self {
        name.clone()
    }
}

impl AsRef<str> for TypeName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for TypeName {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeName {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TypeName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("app.config.DataConfig", "DataConfig")]
    #[case("app.Outer$Inner", "Inner")]
    #[case("Plain", "Plain")]
    fn test_simple_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(TypeName::new(name).simple_name(), expected);
    }

    #[test]
    fn test_package() {
        assert_eq!(TypeName::new("app.config.DataConfig").package(), "app.config");
        assert_eq!(TypeName::new("Plain").package(), "");
    }

    #[test]
    fn test_parse_valid() {
        assert!(TypeName::parse("app.config.DataConfig").is_ok());
        assert!(TypeName::parse("app.Outer$Inner").is_ok());
        assert!(TypeName::parse("_private.Thing").is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("app..Config")]
    #[case("app.1Config")]
    #[case("app.Con fig")]
    fn test_parse_invalid(#[case] name: &str) {
        assert!(TypeName::parse(name).is_err());
    }

    #[test]
    fn test_type_name_hash_lookup_by_str() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(TypeName::new("a.B"));
        set.insert(TypeName::new("a.B")); // duplicate

        assert_eq!(set.len(), 1);
        assert!(set.contains("a.B"));
    }

    #[test]
    fn test_has_prefix() {
        let name = TypeName::new("platform.lang.Object");
        assert!(name.has_prefix("platform."));
        assert!(!name.has_prefix("app."));
    }
}

//! Property layer factories and the line-oriented properties format.

use indexmap::IndexMap;

use crate::error::ResourceError;

use super::layers::PropertyLayer;
use super::resource::Resource;

/// A resource paired with the encoding it should be decoded with.
#[derive(Clone, Debug)]
pub struct EncodedResource {
    pub resource: Resource,
    pub encoding: String,
}

impl EncodedResource {
    pub fn new(resource: Resource, encoding: impl Into<String>) -> Self {
        Self {
            resource,
            encoding: encoding.into(),
        }
    }

    /// Decode the resource content to text.
    pub fn decode(&self) -> Result<String, ResourceError> {
        let bytes = self.resource.bytes();
        let malformed = || ResourceError::Malformed {
            location: self.resource.location().to_string(),
            encoding: self.encoding.clone(),
        };
        match Encoding::parse(&self.encoding) {
            Some(Encoding::Utf8) => {
                let text = std::str::from_utf8(bytes).map_err(|_| malformed())?;
                Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
            }
            Some(Encoding::Latin1) => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Some(Encoding::Ascii) => {
                if bytes.is_ascii() {
                    Ok(bytes.iter().map(|&b| char::from(b)).collect())
                } else {
                    Err(malformed())
                }
            }
            None => Err(ResourceError::UnsupportedEncoding {
                location: self.resource.location().to_string(),
                encoding: self.encoding.clone(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Latin1,
    Ascii,
}

impl Encoding {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Some(Encoding::Utf8),
            "ISO-8859-1" | "ISO8859-1" | "LATIN1" => Some(Encoding::Latin1),
            "US-ASCII" | "ASCII" => Some(Encoding::Ascii),
            _ => None,
        }
    }
}

/// Builds a property layer from a resource.
pub trait PropertyLayerFactory: Send + Sync {
    /// `name` is the declared layer name, if any.
    fn create_layer(
        &self,
        name: Option<&str>,
        resource: &EncodedResource,
    ) -> Result<PropertyLayer, ResourceError>;
}

/// The default factory: one resource-backed layer per properties file.
///
/// The layer is named after the declaration or, when it declares no name,
/// after the resource description.
#[derive(Clone, Copy, Debug, Default)]
pub struct PropertiesLayerFactory;

impl PropertyLayerFactory for PropertiesLayerFactory {
    fn create_layer(
        &self,
        name: Option<&str>,
        resource: &EncodedResource,
    ) -> Result<PropertyLayer, ResourceError> {
        let text = resource.decode()?;
        let description = resource.resource.description();
        Ok(PropertyLayer::from_resource(
            name.unwrap_or(description),
            description,
            parse_properties(&text),
        ))
    }
}

// ============================================================================
// PROPERTIES FORMAT
// ============================================================================

/// Parse `key=value` / `key: value` / `key value` lines.
///
/// `#` and `!` start comment lines, a trailing odd backslash continues the
/// line, and `\t \n \r \f \uXXXX` escapes are decoded. Later keys replace
/// earlier ones.
pub fn parse_properties(text: &str) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let mut lines = text.lines();
    while let Some(first) = lines.next() {
        let first = first.trim_start();
        if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
            continue;
        }
        let mut logical = String::from(first);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }
        let (key, value) = split_key_value(&logical);
        out.insert(unescape(key), unescape(value));
    }
    out
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                key_end = idx;
                break;
            }
            _ => {}
        }
    }
    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches([' ', '\t', '\x0c']);
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .map(|r| r.trim_start_matches([' ', '\t', '\x0c']))
        .unwrap_or(rest);
    (key, rest)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

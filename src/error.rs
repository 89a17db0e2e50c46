//! Error taxonomy for configuration resolution.
//!
//! Leaf errors belong to the collaborator that raises them. [`ResolveError`]
//! is what the resolver surfaces; its store-level variants carry the identity
//! of the entity being resolved and are never wrapped twice.

use crate::base::{NameError, TypeName};
use crate::diagnostics::Problem;
use thiserror::Error;

/// Boxed error returned by user-provided strategies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to obtain or interpret type metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("type [{0}] not found")]
    NotFound(TypeName),
    #[error("type [{0}] cannot be loaded at runtime")]
    NotLoadable(TypeName),
    #[error("attribute '{attribute}' of annotation [{annotation}] {reason}")]
    Attribute {
        annotation: TypeName,
        attribute: String,
        reason: &'static str,
    },
    #[error(transparent)]
    Name(#[from] NameError),
}

/// Failure to load a resource backing a property layer.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource [{location}] not found")]
    NotFound { location: String },
    #[error("failed to read resource [{location}]")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported encoding '{encoding}' for resource [{location}]")]
    UnsupportedEncoding { location: String, encoding: String },
    #[error("resource [{location}] is not valid {encoding}")]
    Malformed { location: String, encoding: String },
}

impl ResourceError {
    /// Check if this is a missing-resource failure (eligible for soft-failure).
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResourceError::NotFound { .. })
    }
}

/// Failure to resolve `${...}` placeholders.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlaceholderError {
    #[error("could not resolve placeholder '{key}' in value \"{text}\"")]
    Unresolvable { key: String, text: String },
    #[error("circular placeholder reference '{key}' in property definitions")]
    Circular { key: String },
    #[error("unterminated placeholder in value \"{text}\"")]
    Unterminated { text: String },
}

/// Failure to instantiate or run a selector, registrar or import group.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("no strategy registered for [{0}]")]
    Unknown(TypeName),
    #[error("[{name}] is not {expected}")]
    WrongKind { name: TypeName, expected: &'static str },
    #[error("failed to instantiate [{name}]")]
    Instantiation {
        name: TypeName,
        #[source]
        source: BoxError,
    },
    #[error("selector [{name}] failed to select imports")]
    Selection {
        name: TypeName,
        #[source]
        source: BoxError,
    },
    #[error("import group [{name}] failed")]
    Group {
        name: TypeName,
        #[source]
        source: BoxError,
    },
    #[error("registrar [{name}] failed to register definitions")]
    Registration {
        name: TypeName,
        #[source]
        source: BoxError,
    },
}

/// Error surfaced by [`Resolver::parse`](crate::resolve::Resolver::parse).
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to parse configuration entity [{candidate}]")]
    Parse {
        candidate: TypeName,
        #[source]
        source: Box<ResolveError>,
    },
    #[error("failed to process import candidates for configuration entity [{owner}]")]
    ImportProcessing {
        owner: TypeName,
        #[source]
        source: Box<ResolveError>,
    },
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error("invalid [{annotation}] declaration on [{owner}]: {reason}")]
    InvalidDeclaration {
        owner: TypeName,
        annotation: TypeName,
        reason: String,
    },
    #[error("component scan declared on [{owner}] failed")]
    Scan {
        owner: TypeName,
        #[source]
        source: BoxError,
    },
    #[error("import group produced an entry for [{0}], which recorded no deferred import")]
    UnknownGroupOwner(TypeName),
    #[error("{0}")]
    Problem(Box<Problem>),
}

impl ResolveError {
    /// Store-level failures already carry entity context and pass through unwrapped.
    pub fn is_store_level(&self) -> bool {
        matches!(
            self,
            ResolveError::Parse { .. } | ResolveError::ImportProcessing { .. } | ResolveError::Problem(_)
        )
    }

    /// Attribute a failure to the entity whose imports were being processed.
    pub(crate) fn in_imports_of(self, owner: &TypeName) -> Self {
        if self.is_store_level() {
            return self;
        }
        ResolveError::ImportProcessing {
            owner: owner.clone(),
            source: Box::new(self),
        }
    }

    /// Attribute a failure to the top-level candidate being parsed.
    pub(crate) fn in_parse_of(self, candidate: &TypeName) -> Self {
        if self.is_store_level() {
            return self;
        }
        ResolveError::Parse {
            candidate: candidate.clone(),
            source: Box::new(self),
        }
    }
}

impl From<Problem> for ResolveError {
    fn from(problem: Problem) -> Self {
        ResolveError::Problem(Box::new(problem))
    }
}

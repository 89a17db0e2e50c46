//! # confgraph-base
//!
//! Core library for resolving declarative configuration sources into an
//! ordered configuration model.
//!
//! Starting from top-level candidate types, the resolver follows imports,
//! nested member types, superclasses and interfaces; merges declared property
//! sources into named layers; defers selected imports into groups resolved
//! after the main traversal; and detects circular imports.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! resolve     → Resolver, traversal, imports, deferred groups, validation
//!   ↓
//! env         → Property layers, resources, placeholders
//! metadata    → Type metadata, type sources, source views
//!   ↓
//! diagnostics → Problems and the problem collector
//! error       → Error types
//! config      → ResolverConfig
//!   ↓
//! base        → Primitives (TypeName, ordering)
//! ```

// ============================================================================
// FOUNDATION
// ============================================================================

/// Foundation types: TypeName, precedence ordering
pub mod base;

/// Resolver configuration
pub mod config;

/// Problems reported during resolution
pub mod diagnostics;

/// Error types
pub mod error;

// ============================================================================
// INPUTS
// ============================================================================

/// Property layers and the collaborators that fill them
pub mod env;

/// Type metadata and the views the resolver reads it through
pub mod metadata;

// ============================================================================
// RESOLUTION
// ============================================================================

/// Resolver, configuration model and import strategies
pub mod resolve;

// Re-export commonly needed items
pub use base::TypeName;
pub use config::ResolverConfig;
pub use diagnostics::{Problem, ProblemCollector, Severity};
pub use error::ResolveError;
pub use resolve::{Candidate, ConfigurationEntity, Resolution, Resolver};

//! Diagnostics — problems found while resolving configuration entities.
//!
//! Problems are collected rather than raised so that one bad import does not
//! abort the resolution of its siblings. A resolver configured as fail-fast
//! turns the first error-level problem into a [`ResolveError`](crate::ResolveError).

use std::fmt;
use std::sync::Arc;

use crate::base::TypeName;

// ============================================================================
// PROBLEM TYPES
// ============================================================================

/// Severity level of a problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Where a problem was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// The configuration entity the problem is attributed to.
    pub entity: TypeName,
    /// The resource the entity was declared in, if known.
    pub resource: Option<Arc<str>>,
}

/// Related information for a problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedInfo {
    /// The entity this note refers to.
    pub entity: TypeName,
    /// The message.
    pub message: Arc<str>,
}

/// A problem found during resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Problem {
    /// Severity level.
    pub severity: Severity,
    /// Problem code (e.g., "E0101").
    pub code: Option<Arc<str>>,
    /// The problem message.
    pub message: Arc<str>,
    /// The entity (and resource) the problem belongs to.
    pub location: Option<Location>,
    /// Optional related information.
    pub related: Vec<RelatedInfo>,
}

impl Problem {
    /// Create a new error problem.
    pub fn error(message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            location: None,
            related: Vec::new(),
        }
    }

    /// Create a new warning problem.
    pub fn warning(message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(message)
        }
    }

    /// Set the problem code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the location.
    pub fn at(mut self, entity: &TypeName, resource: Option<Arc<str>>) -> Self {
        self.location = Some(Location {
            entity: entity.clone(),
            resource,
        });
        self
    }

    /// Add related information.
    pub fn with_related(mut self, entity: &TypeName, message: impl Into<Arc<str>>) -> Self {
        self.related.push(RelatedInfo {
            entity: entity.clone(),
            message: message.into(),
        });
        self
    }

    /// The entity this problem is attributed to.
    pub fn entity(&self) -> Option<&TypeName> {
        self.location.as_ref().map(|loc| &loc.entity)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = &self.code {
            write!(f, "[{code}] ")?;
        }
        f.write_str(&self.message)?;
        if let Some(Location { resource: Some(resource), .. }) = &self.location {
            write!(f, " (in {resource})")?;
        }
        Ok(())
    }
}

// ============================================================================
// PROBLEM CODES
// ============================================================================

/// Stable problem codes.
pub mod codes {
    /// Circular import.
    pub const CIRCULAR_IMPORT: &str = "E0101";
    /// Proxied configuration declared final.
    pub const FINAL_CONFIGURATION: &str = "E0102";
    /// Producer method cannot be overridden by a proxy.
    pub const NON_OVERRIDABLE_PRODUCER: &str = "E0103";

    /// Property location skipped because the declaration allows it.
    pub const IGNORED_RESOURCE: &str = "W0101";
}

// ============================================================================
// PROBLEM COLLECTOR
// ============================================================================

/// Collects problems during resolution.
#[derive(Clone, Debug, Default)]
pub struct ProblemCollector {
    problems: Vec<Problem>,
}

impl ProblemCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a problem.
    pub fn add(&mut self, problem: Problem) {
        self.problems.push(problem);
    }

    /// Build a circular import error.
    ///
    /// `importer` is the entity on top of the import stack, `chain` the
    /// rendered stack (`[A->B->C]`).
    pub fn circular_import(
        importer: &TypeName,
        importer_resource: Option<Arc<str>>,
        attempted: &TypeName,
        chain: &str,
    ) -> Problem {
        let attempted_name = attempted.simple_name();
        Problem::error(format!(
            "A circular import has been detected: illegal attempt by configuration entity '{}' \
             to import '{}' as '{}' is already present in the current import stack {}",
            importer.simple_name(),
            attempted_name,
            attempted_name,
            chain,
        ))
        .with_code(codes::CIRCULAR_IMPORT)
        .at(importer, importer_resource)
        .with_related(attempted, format!("'{attempted_name}' closes the cycle"))
    }

    /// Build a final-configuration error.
    pub fn final_configuration(entity: &TypeName, resource: Option<Arc<str>>) -> Problem {
        Problem::error(format!(
            "configuration entity '{}' must not be final; declare it non-final or opt out of proxying",
            entity.simple_name()
        ))
        .with_code(codes::FINAL_CONFIGURATION)
        .at(entity, resource)
    }

    /// Build a non-overridable producer method error.
    pub fn non_overridable_producer(
        entity: &TypeName,
        resource: Option<Arc<str>>,
        method: &str,
    ) -> Problem {
        Problem::error(format!(
            "producer method '{}' on '{}' must not be private or final; change the method's modifiers to continue",
            method,
            entity.simple_name()
        ))
        .with_code(codes::NON_OVERRIDABLE_PRODUCER)
        .at(entity, resource)
    }

    /// Build an ignored-resource warning.
    pub fn ignored_resource(entity: &TypeName, location: &str, reason: &str) -> Problem {
        Problem::warning(format!("properties location [{location}] not resolvable: {reason}"))
            .with_code(codes::IGNORED_RESOURCE)
            .at(entity, None)
    }

    /// Get all problems.
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Get problems attributed to a specific entity.
    pub fn problems_for_entity(&self, entity: &str) -> Vec<&Problem> {
        self.problems
            .iter()
            .filter(|p| p.entity().is_some_and(|e| e.as_str() == entity))
            .collect()
    }

    /// Get problems carrying a given code.
    pub fn problems_with_code(&self, code: &str) -> Vec<&Problem> {
        self.problems
            .iter()
            .filter(|p| p.code.as_deref() == Some(code))
            .collect()
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.problems.iter().filter(|p| p.severity == Severity::Error).count()
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.problems.iter().filter(|p| p.severity == Severity::Warning).count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(|p| p.severity == Severity::Error)
    }

    /// Take all problems, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Problem> {
        std::mem::take(&mut self.problems)
    }

    /// Get the number of problems.
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    /// Check if no problems were collected.
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

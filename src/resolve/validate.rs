//! Post-resolution validation of the configuration model.

use crate::diagnostics::{Problem, ProblemCollector};

use super::candidate::ConfigurationMode;
use super::entity::ConfigurationEntity;

/// Problems with one finalized entity.
///
/// Only full configuration entities are checked: their type and producer
/// methods must be overridable for proxying. Static producer methods are exempt.
pub(crate) fn validate_entity(entity: &ConfigurationEntity) -> Vec<Problem> {
    let mut problems = Vec::new();
    if entity.mode() != ConfigurationMode::Full {
        return problems;
    }
    if entity.metadata().is_final() {
        problems.push(ProblemCollector::final_configuration(
            entity.name(),
            entity.resource().cloned(),
        ));
    }
    for producer in entity.producer_methods() {
        let method = &producer.method;
        if !method.is_static() && (method.is_final() || method.is_private()) {
            problems.push(ProblemCollector::non_overridable_producer(
                entity.name(),
                entity.resource().cloned(),
                method.name(),
            ));
        }
    }
    problems
}

//! Foundation types for the confgraph toolchain.
//!
//! This module provides fundamental types used throughout the resolver:
//! - [`TypeName`] - Fully-qualified type identities
//! - [`sort_by_order`] and the precedence constants - Deterministic ordering
//!
//! This module has NO dependencies on other confgraph modules.

mod name;
mod order;

pub use name::{NameError, TypeName};
pub use order::{HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE, sort_by_order};

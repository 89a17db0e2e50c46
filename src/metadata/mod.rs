//! Metadata layer — what the resolver knows about declared types.
//!
//! ## Overview
//!
//! - [`TypeMetadata`] - Annotations, methods and hierarchy of one type
//! - [`TypeSource`] - Collaborator producing metadata by static reading or runtime loading
//! - [`SourceView`] - Uniform facade over a type, whichever way it was obtained
//! - [`well_known`] - Names of the annotations and capabilities the resolver understands
//!
//! ## Usage
//!
//! ```
//! use confgraph::ResolverConfig;
//! use confgraph::metadata::{InMemoryTypeSource, TypeMetadata, ViewContext, well_known};
//!
//! let types = InMemoryTypeSource::new();
//! let name = types.define(TypeMetadata::class("app.Config").annotated(well_known::CONFIGURATION));
//!
//! let config = ResolverConfig::default();
//! let cx = ViewContext::new(&types, &config);
//! let view = cx.view_for_name(&name).unwrap();
//! assert!(view.has_annotation(&cx, well_known::CONFIGURATION));
//! ```

mod source;
mod types;
mod view;
pub mod well_known;

pub use source::{InMemoryTypeSource, TypeSource};
pub use types::{AnnotationAttributes, AttributeValue, MethodMetadata, TypeKind, TypeMetadata};
pub use view::{Origin, SourceView, ViewContext};

//! The filtering operations a pipeline stage is built from.
//!
//! Attribute filters evaluate numeric predicates against a layer's data
//! table; spatial filters evaluate containment and proximity against its
//! projected geometries. Every filter returns a fresh narrowed
//! [`Layer`](crate::layer::Layer) and leaves its inputs untouched.

pub mod attribute;
pub mod predicate;
pub mod spatial;

pub use attribute::filter_attributes;
pub use predicate::{Comparator, FilterError, Predicate};
pub use spatial::{filter_contained, filter_within};

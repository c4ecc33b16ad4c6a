//! # fieldstream core
//!
//! Core types for the fieldstream query-pipeline engine: the error
//! taxonomy, element lanes, value capability traits and the typed field
//! model that produces predicates and comparators.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod field;
pub mod lane;
pub mod statistics;
pub mod value;

pub use error::{BoxError, Error, Result};
pub use field::{
    ComparatorDescriptor, Condition, Direction, EntityComparator, EntityPredicate, Field,
    FieldBuilder, FieldComparator, FieldPredicate, Inclusion, NullOrder, OperandSet,
    PredicateDescriptor, PredicateKind,
};
pub use lane::{Element, Lane, RefType};
pub use statistics::SummaryStatistics;
pub use value::{LaneNumber, Numeric, Orderable};


//! # fieldstream pipeline
//!
//! Operation descriptors, the [`Pipeline`] intermediate representation and
//! the terminal-operation optimizer seam.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod callable;
pub mod operation;
pub mod optimizer;
pub mod pipeline;

pub use callable::{
    ElementAction, ElementCombiner, ElementConsumer, ElementDedup, ElementFlatMapper, ElementIter,
    ElementMapper, ElementOrder, ElementPredicate,
};
pub use operation::{IntermediateOperation, StageDescription, TerminalOperation};
pub use optimizer::{PassThroughOptimizer, TerminalOperationOptimizer};
pub use pipeline::{Pipeline, PipelineDescription};

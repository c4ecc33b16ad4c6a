//! Rewrite seam between pipeline construction and execution.
//!
//! Every pipeline passes through a [`TerminalOperationOptimizer`] before it
//! reaches the execution adapter. An optimizer is total: it never fails,
//! and when it cannot prove a rewrite preserves the observable result it
//! returns its input. Rewrites must be idempotent, so that
//! `optimize(optimize(p)) == optimize(p)`.

use crate::pipeline::Pipeline;
use tracing::trace;

/// Rewrites a pipeline into one with the same observable result.
pub trait TerminalOperationOptimizer: Send + Sync {
    /// Returns an equivalent pipeline.
    fn optimize(&self, pipeline: Pipeline) -> Pipeline;
}

/// The default optimizer: returns every pipeline unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughOptimizer;

impl TerminalOperationOptimizer for PassThroughOptimizer {
    fn optimize(&self, pipeline: Pipeline) -> Pipeline {
        trace!(pipeline = %pipeline, "pass-through optimizer");
        pipeline
    }
}

impl<F> TerminalOperationOptimizer for F
where
    F: Fn(Pipeline) -> Pipeline + Send + Sync,
{
    fn optimize(&self, pipeline: Pipeline) -> Pipeline {
        self(pipeline)
    }
}

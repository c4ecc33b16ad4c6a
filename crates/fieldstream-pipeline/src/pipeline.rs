//! The pipeline intermediate representation.
//!
//! A [`Pipeline`] records the intermediate operations of a query in
//! declaration order plus at most one terminal operation. It is built
//! through an append-only interface and frozen once terminated. A frozen
//! pipeline is consumed exactly once: copies made after `terminate` share
//! one consumption flag, so executing any of them a second time fails.

use crate::operation::{IntermediateOperation, StageDescription, TerminalOperation};
use fieldstream_core::{Error, Lane, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Ordered intermediate operations plus an optional terminal operation.
#[derive(Clone)]
pub struct Pipeline {
    root: Lane,
    lane: Lane,
    intermediates: Vec<IntermediateOperation>,
    terminal: Option<TerminalOperation>,
    parallel: bool,
    ordered: bool,
    consumed: Arc<AtomicBool>,
}

impl Pipeline {
    /// An empty, sequential, ordered pipeline over a source of `E`.
    pub fn of<E: 'static>() -> Self {
        Self::with_root(Lane::of::<E>())
    }

    /// An empty pipeline whose source yields elements of `root`.
    pub fn with_root(root: Lane) -> Self {
        Self {
            root,
            lane: root,
            intermediates: Vec::new(),
            terminal: None,
            parallel: false,
            ordered: true,
            consumed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Appends an intermediate operation.
    ///
    /// Fails with `PipelineState` once the pipeline is terminated and with
    /// `LaneMismatch` when the operation reads another lane than the
    /// active one. A failed append leaves the pipeline unchanged.
    pub fn append(&mut self, operation: IntermediateOperation) -> Result<&mut Self> {
        if let Some(terminal) = &self.terminal {
            return Err(Error::PipelineState(format!(
                "cannot append {} after terminal operation {}",
                operation, terminal
            )));
        }
        self.check_lane(operation.input_lane())?;

        trace!(op = %operation, lane = %operation.output_lane(), "append intermediate operation");
        self.lane = operation.output_lane();
        self.intermediates.push(operation);
        Ok(self)
    }

    /// Attaches the terminal operation and freezes the pipeline.
    pub fn terminate(&mut self, operation: TerminalOperation) -> Result<&mut Self> {
        if let Some(terminal) = &self.terminal {
            return Err(Error::PipelineState(format!(
                "pipeline already terminated by {}; cannot terminate again with {}",
                terminal, operation
            )));
        }
        self.check_lane(operation.input_lane())?;

        trace!(op = %operation, "terminate pipeline");
        self.terminal = Some(operation);
        // Unfrozen copies taken earlier keep their own flag.
        self.consumed = Arc::new(AtomicBool::new(false));
        Ok(self)
    }

    /// Claims the single execution of a frozen pipeline.
    ///
    /// Fails with `PipelineState` if the pipeline is not terminated or if
    /// it, or a copy taken after `terminate`, was already consumed.
    pub fn consume(&self) -> Result<()> {
        if self.terminal.is_none() {
            return Err(Error::PipelineState(
                "cannot execute a pipeline without a terminal operation".to_string(),
            ));
        }
        if self.consumed.swap(true, Ordering::AcqRel) {
            return Err(Error::PipelineState(format!(
                "pipeline already executed: {}",
                self
            )));
        }
        Ok(())
    }

    /// Whether this frozen pipeline was already executed.
    pub fn is_consumed(&self) -> bool {
        self.consumed.load(Ordering::Acquire)
    }

    fn check_lane(&self, expected: Lane) -> Result<()> {
        if expected != self.lane {
            return Err(Error::LaneMismatch {
                expected,
                actual: self.lane,
            });
        }
        Ok(())
    }

    /// Marks the pipeline for parallel terminal evaluation.
    pub fn parallel(&mut self) -> &mut Self {
        self.parallel = true;
        self
    }

    /// Marks the pipeline for sequential evaluation.
    pub fn sequential(&mut self) -> &mut Self {
        self.parallel = false;
        self
    }

    /// Releases the encounter-order guarantee for parallel evaluation.
    pub fn unordered(&mut self) -> &mut Self {
        self.ordered = false;
        self
    }

    /// Lane of the elements the source must yield.
    pub fn root_lane(&self) -> Lane {
        self.root
    }

    /// Active lane: the lane the next operation must read.
    pub fn lane(&self) -> Lane {
        self.lane
    }

    /// Intermediate operations in declaration order.
    pub fn intermediates(&self) -> &[IntermediateOperation] {
        &self.intermediates
    }

    /// The terminal operation, once attached.
    pub fn terminal(&self) -> Option<&TerminalOperation> {
        self.terminal.as_ref()
    }

    /// Whether a terminal operation is attached.
    pub fn is_frozen(&self) -> bool {
        self.terminal.is_some()
    }

    /// Whether the terminal operation may fan out across threads.
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Whether encounter order must be preserved.
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Number of intermediate operations.
    pub fn len(&self) -> usize {
        self.intermediates.len()
    }

    /// Whether there are no intermediate operations.
    pub fn is_empty(&self) -> bool {
        self.intermediates.is_empty()
    }

    /// Serialisable snapshot for diagnostics.
    pub fn describe(&self) -> PipelineDescription {
        PipelineDescription {
            root: self.root.to_string(),
            lane: self.lane.to_string(),
            stages: self
                .intermediates
                .iter()
                .map(IntermediateOperation::describe)
                .collect(),
            terminal: self.terminal.as_ref().map(TerminalOperation::describe),
            parallel: self.parallel,
            ordered: self.ordered,
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Lane::Reference(ty) => write!(f, "Pipeline[{}]", ty.short_name())?,
            other => write!(f, "Pipeline[{}]", other)?,
        }
        let stages = self
            .intermediates
            .iter()
            .map(ToString::to_string)
            .chain(self.terminal.iter().map(ToString::to_string))
            .collect::<Vec<_>>();
        if !stages.is_empty() {
            write!(f, " {}", stages.join(" -> "))?;
        }
        if self.parallel {
            write!(f, " (parallel)")?;
        }
        Ok(())
    }
}

impl PartialEq for Pipeline {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.lane == other.lane
            && self.intermediates == other.intermediates
            && self.terminal == other.terminal
            && self.parallel == other.parallel
            && self.ordered == other.ordered
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("root", &self.root)
            .field("lane", &self.lane)
            .field("intermediates", &self.intermediates)
            .field("terminal", &self.terminal)
            .field("parallel", &self.parallel)
            .field("ordered", &self.ordered)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Serialisable snapshot of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDescription {
    /// Lane of the source elements
    pub root: String,
    /// Active lane after the last intermediate operation
    pub lane: String,
    /// Intermediate stages in order
    pub stages: Vec<StageDescription>,
    /// Terminal stage, if attached
    pub terminal: Option<StageDescription>,
    /// Parallel flag
    pub parallel: bool,
    /// Ordered flag
    pub ordered: bool,
}

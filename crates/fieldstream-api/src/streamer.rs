//! The entry point: opens streams and executes pipelines over a source.

use crate::adapter::{ExecutionAdapter, LocalAdapter};
use crate::config::StreamerConfig;
use crate::fault::{FaultSlot, Shunt};
use crate::query::QueryStream;
use crate::source::SequenceSource;
use crate::terminal::TerminalValue;
use fieldstream_autoclose::AutoClosingStream;
use fieldstream_core::{Element, Error, Lane, Result};
use fieldstream_pipeline::{
    ElementIter, PassThroughOptimizer, Pipeline, TerminalOperation, TerminalOperationOptimizer,
};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Streams and queries over one entity source.
///
/// Execution runs every pipeline through the optimizer, realizes it with
/// the execution adapter and consumes the result through an
/// [`AutoClosingStream`], so the source's resource is released exactly
/// once per execution.
///
/// # Examples
///
/// ```
/// use fieldstream::{InMemorySource, Streamer};
///
/// let streamer = Streamer::new(InMemorySource::new(vec![5i64, 3, 8]));
/// let big = streamer.query().filter(|v: &i64| *v > 4).sorted().collect().unwrap();
/// assert_eq!(big, vec![5, 8]);
/// ```
pub struct Streamer<E> {
    source: Arc<dyn SequenceSource<E>>,
    optimizer: Arc<dyn TerminalOperationOptimizer>,
    adapter: Arc<dyn ExecutionAdapter>,
    config: StreamerConfig,
}

impl<E: Send + 'static> Streamer<E> {
    /// A streamer over `source` with the pass-through optimizer, the
    /// local adapter and the default configuration.
    pub fn new<S: SequenceSource<E> + 'static>(source: S) -> Self {
        Self {
            source: Arc::new(source),
            optimizer: Arc::new(PassThroughOptimizer),
            adapter: Arc::new(LocalAdapter::new()),
            config: StreamerConfig::default(),
        }
    }

    /// Replaces the optimizer.
    pub fn with_optimizer<O: TerminalOperationOptimizer + 'static>(mut self, optimizer: O) -> Self {
        self.optimizer = Arc::new(optimizer);
        self
    }

    /// Replaces the execution adapter.
    pub fn with_adapter<A: ExecutionAdapter + 'static>(mut self, adapter: A) -> Self {
        self.adapter = Arc::new(adapter);
        self
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: StreamerConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration.
    pub fn config(&self) -> StreamerConfig {
        self.config
    }

    /// Opens the source as an auto-closing stream.
    pub fn stream(&self) -> Result<AutoClosingStream<E>> {
        let sequence = self.source.open()?;
        let stream = AutoClosingStream::new(sequence, self.config.auto_close);
        Ok(if self.config.parallel {
            stream.parallel()
        } else {
            stream
        })
    }

    /// An empty pipeline over this source's entities.
    pub fn pipeline(&self) -> Pipeline {
        let mut pipeline = Pipeline::of::<E>();
        if self.config.parallel {
            pipeline.parallel();
        }
        pipeline
    }

    /// A typed query builder over this source.
    pub fn query(&self) -> QueryStream<'_, E, E> {
        QueryStream::new(self, self.pipeline())
    }

    /// Executes a terminated pipeline.
    ///
    /// Fails with `PipelineState` if the pipeline has no terminal
    /// operation or was already executed, and with `LaneMismatch` if it
    /// was built for other entities. Once the source is open, the result
    /// is returned only after its resource has been released; a failure
    /// raised while pulling is returned as the primary error, chained
    /// with any release failure.
    pub fn execute(&self, pipeline: Pipeline) -> Result<TerminalValue> {
        let source_lane = Lane::of::<E>();
        if pipeline.is_frozen() && pipeline.root_lane() != source_lane {
            return Err(Error::LaneMismatch {
                expected: pipeline.root_lane(),
                actual: source_lane,
            });
        }
        pipeline.consume()?;

        let pipeline = self.optimizer.optimize(pipeline);
        let terminal = pipeline.terminal().cloned().ok_or_else(|| {
            Error::PipelineState("optimizer dropped the terminal operation".to_string())
        })?;
        debug!(pipeline = %pipeline, "executing pipeline");

        let opened = self.source.open()?.map_iter(|iter| {
            let elements: ElementIter = Box::new(iter.map(Element::wrap));
            elements
        });
        let realized = self.adapter.open(&pipeline, opened)?;

        let fault = FaultSlot::new();
        let shunted = realized.map_iter(|iter| {
            let elements: ElementIter = Box::new(Shunt::new(iter, fault.clone()));
            elements
        });
        let mut stream = AutoClosingStream::new(shunted, self.config.auto_close);
        if pipeline.is_parallel() {
            stream = stream.parallel();
        }
        if !pipeline.is_ordered() {
            stream = stream.unordered();
        }

        let outcome = run_terminal(stream, terminal, &fault);
        match (fault.take(), outcome) {
            (None, outcome) => outcome,
            (Some(failure), Ok(_)) => Err(failure),
            (Some(failure), Err(release)) => Err(Error::chain(failure, release)),
        }
    }
}

fn run_terminal(
    stream: AutoClosingStream<Element>,
    terminal: TerminalOperation,
    fault: &FaultSlot,
) -> Result<TerminalValue> {
    debug!(terminal = %terminal, "running terminal operation");
    Ok(match terminal {
        TerminalOperation::Collect { .. } => TerminalValue::List(stream.to_vec()?),
        TerminalOperation::ToArray { .. } => TerminalValue::Array(stream.to_array()?),
        TerminalOperation::Reduce(combiner) => {
            let merge = combiner.clone();
            let reduced = stream
                .map(Ok::<Element, Error>)
                .reduce_opt(move |a, b| match (a, b) {
                    (Ok(a), Ok(b)) => merge.combine(a, b),
                    (Err(err), _) | (_, Err(err)) => Err(err),
                })?;
            let value = match (combiner.identity(), reduced) {
                (identity, None) => identity,
                (None, Some(value)) => Some(value?),
                (Some(identity), Some(value)) => Some(combiner.combine(identity, value?)?),
            };
            TerminalValue::Single(value)
        }
        TerminalOperation::Count { .. } => TerminalValue::Count(stream.count()?),
        TerminalOperation::ForEach(consumer) => {
            let fault = fault.clone();
            stream.for_each(move |e| {
                if let Err(err) = consumer.accept(e) {
                    fault.record(err);
                }
            })?;
            TerminalValue::Unit
        }
        TerminalOperation::ForEachOrdered(consumer) => {
            let fault = fault.clone();
            stream.for_each_ordered(move |e| {
                if let Err(err) = consumer.accept(e) {
                    fault.record(err);
                }
            })?;
            TerminalValue::Unit
        }
        TerminalOperation::FindFirst { .. } => TerminalValue::Single(stream.find_first()?),
        TerminalOperation::FindAny { .. } => TerminalValue::Single(stream.find_any()?),
        TerminalOperation::AnyMatch(predicate) => {
            TerminalValue::Bool(stream.any_match(move |e| predicate.test(e))?)
        }
        TerminalOperation::AllMatch(predicate) => {
            TerminalValue::Bool(stream.all_match(move |e| predicate.test(e))?)
        }
        TerminalOperation::NoneMatch(predicate) => {
            TerminalValue::Bool(stream.none_match(move |e| predicate.test(e))?)
        }
        TerminalOperation::Statistics { lane } => match lane {
            Lane::Int => TerminalValue::IntStatistics(
                stream.flat_map(|e: Element| e.as_int()).statistics()?,
            ),
            Lane::Long => TerminalValue::LongStatistics(
                stream.flat_map(|e: Element| e.as_long()).statistics()?,
            ),
            Lane::Double => TerminalValue::DoubleStatistics(
                stream.flat_map(|e: Element| e.as_double()).statistics()?,
            ),
            Lane::Reference(_) => {
                let unsupported =
                    Error::UnsupportedOperation(format!("statistics over the {} lane", lane));
                return Err(match stream.close() {
                    Ok(()) => unsupported,
                    Err(release) => Error::chain(unsupported, release),
                });
            }
        },
    })
}

impl<E> Clone for Streamer<E> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            optimizer: Arc::clone(&self.optimizer),
            adapter: Arc::clone(&self.adapter),
            config: self.config,
        }
    }
}

impl<E> fmt::Debug for Streamer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streamer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

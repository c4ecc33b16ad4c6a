//! A typed builder that records a pipeline while tracking the element
//! type statically.

use crate::streamer::Streamer;
use crate::terminal::TerminalValue;
use fieldstream_core::{
    EntityComparator, EntityPredicate, Error, Lane, LaneNumber, Orderable, Result,
    SummaryStatistics,
};
use fieldstream_pipeline::{IntermediateOperation, Pipeline, TerminalOperation};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

/// A query over the entities of a [`Streamer`], currently yielding `T`.
///
/// Every intermediate call appends one operation to the underlying
/// [`Pipeline`]; nothing runs until a terminal call, which terminates the
/// pipeline and executes it.
///
/// Because `T` follows every `map`, a chain started from
/// [`Streamer::query`] cannot express a lane mismatch. The append is
/// still checked: a failed append is recorded at once and visible through
/// [`QueryStream::error`], later appends are skipped, and the terminal
/// call returns the recorded error without opening the source.
pub struct QueryStream<'s, E, T> {
    streamer: &'s Streamer<E>,
    pipeline: Pipeline,
    error: Option<Error>,
    _lane: PhantomData<fn() -> T>,
}

impl<'s, E: Send + 'static, T: Send + 'static> QueryStream<'s, E, T> {
    pub(crate) fn new(streamer: &'s Streamer<E>, pipeline: Pipeline) -> Self {
        Self {
            streamer,
            pipeline,
            error: None,
            _lane: PhantomData,
        }
    }

    fn push<U>(mut self, operation: IntermediateOperation) -> QueryStream<'s, E, U> {
        if self.error.is_none() {
            if let Err(err) = self.pipeline.append(operation) {
                self.error = Some(err);
            }
        }
        QueryStream {
            streamer: self.streamer,
            pipeline: self.pipeline,
            error: self.error,
            _lane: PhantomData,
        }
    }

    /// The error recorded by the first failed append, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Keeps elements matching a field predicate or closure.
    pub fn filter<P: EntityPredicate<T> + 'static>(self, predicate: P) -> Self {
        self.push(IntermediateOperation::filter::<T, P>(predicate))
    }

    /// Transforms every element.
    pub fn map<R, F>(self, f: F) -> QueryStream<'s, E, R>
    where
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        self.push(IntermediateOperation::map(f))
    }

    /// Maps into the int lane.
    pub fn map_to_int<F: Fn(T) -> i32 + Send + Sync + 'static>(self, f: F) -> QueryStream<'s, E, i32> {
        self.map(f)
    }

    /// Maps into the long lane.
    pub fn map_to_long<F: Fn(T) -> i64 + Send + Sync + 'static>(self, f: F) -> QueryStream<'s, E, i64> {
        self.map(f)
    }

    /// Maps into the double lane.
    pub fn map_to_double<F: Fn(T) -> f64 + Send + Sync + 'static>(
        self,
        f: F,
    ) -> QueryStream<'s, E, f64> {
        self.map(f)
    }

    /// Replaces every element by the elements `f` returns for it.
    pub fn flat_map<R, I, F>(self, f: F) -> QueryStream<'s, E, R>
    where
        R: Send + 'static,
        I: IntoIterator<Item = R>,
        I::IntoIter: Send + 'static,
        F: Fn(T) -> I + Send + Sync + 'static,
    {
        self.push(IntermediateOperation::flat_map(f))
    }

    /// Sorts by natural order.
    pub fn sorted(self) -> Self
    where
        T: Orderable,
    {
        self.push(IntermediateOperation::sorted::<T>())
    }

    /// Sorts by a field comparator or closure.
    pub fn sorted_by<C: EntityComparator<T> + 'static>(self, comparator: C) -> Self {
        self.push(IntermediateOperation::sorted_by::<T, C>(comparator))
    }

    /// Drops repeated elements.
    pub fn distinct(self) -> Self
    where
        T: Eq + Hash + Clone,
    {
        self.push(IntermediateOperation::distinct::<T>())
    }

    /// Drops elements whose key was already seen.
    pub fn distinct_by<K, F>(self, key: F) -> Self
    where
        K: Eq + Hash + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.push(IntermediateOperation::distinct_by(key))
    }

    /// Keeps at most `n` elements.
    pub fn limit(self, n: u64) -> Self {
        self.push(IntermediateOperation::limit(Lane::of::<T>(), n))
    }

    /// Drops the first `n` elements.
    pub fn skip(self, n: u64) -> Self {
        self.push(IntermediateOperation::skip(Lane::of::<T>(), n))
    }

    /// Observes every element as it is pulled.
    pub fn peek<F: Fn(&T) + Send + Sync + 'static>(self, action: F) -> Self {
        self.push(IntermediateOperation::peek(action))
    }

    /// Keeps elements while `predicate` holds.
    pub fn take_while<P: EntityPredicate<T> + 'static>(self, predicate: P) -> Self {
        self.push(IntermediateOperation::take_while::<T, P>(predicate))
    }

    /// Drops elements while `predicate` holds.
    pub fn drop_while<P: EntityPredicate<T> + 'static>(self, predicate: P) -> Self {
        self.push(IntermediateOperation::drop_while::<T, P>(predicate))
    }

    /// Marks the query for parallel evaluation.
    pub fn parallel(mut self) -> Self {
        self.pipeline.parallel();
        self
    }

    /// Marks the query for sequential evaluation.
    pub fn sequential(mut self) -> Self {
        self.pipeline.sequential();
        self
    }

    /// Releases the encounter-order guarantee.
    pub fn unordered(mut self) -> Self {
        self.pipeline.unordered();
        self
    }

    /// Whether the query will run in parallel.
    pub fn is_parallel(&self) -> bool {
        self.pipeline.is_parallel()
    }

    /// The pipeline recorded so far.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The recorded pipeline, or the error of a failed append.
    pub fn into_pipeline(self) -> Result<Pipeline> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.pipeline),
        }
    }

    fn run(self, terminal: TerminalOperation) -> Result<TerminalValue> {
        let streamer = self.streamer;
        let mut pipeline = self.into_pipeline()?;
        pipeline.terminate(terminal)?;
        streamer.execute(pipeline)
    }

    /// Gathers the elements into a `Vec`.
    pub fn collect(self) -> Result<Vec<T>> {
        self.run(TerminalOperation::collect(Lane::of::<T>()))?
            .into_list()
    }

    /// Gathers the elements into a boxed slice.
    pub fn to_array(self) -> Result<Box<[T]>> {
        self.run(TerminalOperation::to_array(Lane::of::<T>()))?
            .into_array()
    }

    /// Folds with an associative `f`, starting from `identity`.
    pub fn reduce<F>(self, identity: T, f: F) -> Result<T>
    where
        T: Clone + Sync,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        self.run(TerminalOperation::reduce(Some(identity), f))?
            .into_value()
    }

    /// Folds with an associative `f`; `None` for an empty result.
    pub fn reduce_opt<F>(self, f: F) -> Result<Option<T>>
    where
        T: Clone + Sync,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        self.run(TerminalOperation::reduce::<T, F>(None, f))?
            .into_optional()
    }

    /// Number of elements.
    pub fn count(self) -> Result<u64> {
        self.run(TerminalOperation::count(Lane::of::<T>()))?
            .as_count()
    }

    /// Hands every element to `action`; in any order when parallel.
    pub fn for_each<F: Fn(T) + Send + Sync + 'static>(self, action: F) -> Result<()> {
        self.run(TerminalOperation::for_each(action)).map(|_| ())
    }

    /// Hands every element to `action` in encounter order.
    pub fn for_each_ordered<F: Fn(T) + Send + Sync + 'static>(self, action: F) -> Result<()> {
        self.run(TerminalOperation::for_each_ordered(action))
            .map(|_| ())
    }

    /// The first element in encounter order.
    pub fn find_first(self) -> Result<Option<T>> {
        self.run(TerminalOperation::find_first(Lane::of::<T>()))?
            .into_optional()
    }

    /// Some element.
    pub fn find_any(self) -> Result<Option<T>> {
        self.run(TerminalOperation::find_any(Lane::of::<T>()))?
            .into_optional()
    }

    /// Whether some element matches.
    pub fn any_match<P: EntityPredicate<T> + 'static>(self, predicate: P) -> Result<bool> {
        self.run(TerminalOperation::any_match::<T, P>(predicate))?
            .as_bool()
    }

    /// Whether every element matches.
    pub fn all_match<P: EntityPredicate<T> + 'static>(self, predicate: P) -> Result<bool> {
        self.run(TerminalOperation::all_match::<T, P>(predicate))?
            .as_bool()
    }

    /// Whether no element matches.
    pub fn none_match<P: EntityPredicate<T> + 'static>(self, predicate: P) -> Result<bool> {
        self.run(TerminalOperation::none_match::<T, P>(predicate))?
            .as_bool()
    }
}

impl<'s, E: Send + 'static, T: LaneNumber> QueryStream<'s, E, T> {
    /// Count, sum, min, max and average of a numeric lane.
    pub fn statistics(self) -> Result<SummaryStatistics<T>> {
        self.run(TerminalOperation::statistics::<T>())?
            .into_statistics()
    }
}

impl<E, T> fmt::Debug for QueryStream<'_, E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryStream")
            .field("pipeline", &self.pipeline)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

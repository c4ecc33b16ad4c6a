//! The auto-closing stream decorator.
//!
//! An [`AutoClosingStream`] wraps a lazily pulled sequence and the handle
//! of the resource behind it. Intermediate operations wrap the sequence
//! and hand the same handle to the new stream. Every terminal operation
//! runs the traversal and then closes the handle, whether the traversal
//! finished, short-circuited or failed. A panic inside a terminal
//! operation still releases the resource, through the handle's `Drop`.

use crate::config::AutoCloseConfig;
use crate::cursor::RawCursor;
use crate::iter::Deferred;
use crate::resource::{Resource, ResourceHandle};
use crate::sequence::{BoxIter, ClosableSequence};
use fieldstream_core::{BoxError, Error, Result};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use tracing::{debug, trace};

/// How a terminal operation traverses the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Execution {
    Sequential,
    /// Parallel, results combined in encounter order
    ParallelOrdered,
    /// Parallel, encounter order not preserved
    ParallelUnordered,
}

/// A lazy stream of `T` that releases its resource exactly once, when a
/// terminal operation completes.
pub struct AutoClosingStream<T> {
    iter: BoxIter<T>,
    handle: ResourceHandle,
    config: AutoCloseConfig,
    parallel: bool,
    ordered: bool,
}

impl<T: Send + 'static> AutoClosingStream<T> {
    /// Wraps a closable sequence.
    pub fn new(sequence: ClosableSequence<T>, config: AutoCloseConfig) -> Self {
        let (iter, handle) = sequence.into_parts();
        Self {
            iter,
            handle,
            config,
            parallel: false,
            ordered: true,
        }
    }

    /// Wraps `iter`, releasing `resource` on close.
    pub fn over<I, R>(iter: I, resource: R, config: AutoCloseConfig) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
        R: Resource + 'static,
    {
        Self::new(ClosableSequence::new(iter, resource), config)
    }

    fn wrap<U, F>(self, stage: &'static str, f: F) -> AutoClosingStream<U>
    where
        U: Send + 'static,
        F: FnOnce(BoxIter<T>) -> BoxIter<U>,
    {
        trace!(stage, "wrap auto-closing stream");
        AutoClosingStream {
            iter: f(self.iter),
            handle: self.handle,
            config: self.config,
            parallel: self.parallel,
            ordered: self.ordered,
        }
    }

    /// Keeps elements matching `predicate`.
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        self.wrap("filter", move |iter| Box::new(iter.filter(predicate)))
    }

    /// Transforms every element.
    pub fn map<U, F>(self, f: F) -> AutoClosingStream<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        self.wrap("map", move |iter| Box::new(iter.map(f)))
    }

    /// Maps into the int lane.
    pub fn map_to_int<F>(self, f: F) -> AutoClosingStream<i32>
    where
        F: FnMut(T) -> i32 + Send + 'static,
    {
        self.wrap("map_to_int", move |iter| Box::new(iter.map(f)))
    }

    /// Maps into the long lane.
    pub fn map_to_long<F>(self, f: F) -> AutoClosingStream<i64>
    where
        F: FnMut(T) -> i64 + Send + 'static,
    {
        self.wrap("map_to_long", move |iter| Box::new(iter.map(f)))
    }

    /// Maps into the double lane.
    pub fn map_to_double<F>(self, f: F) -> AutoClosingStream<f64>
    where
        F: FnMut(T) -> f64 + Send + 'static,
    {
        self.wrap("map_to_double", move |iter| Box::new(iter.map(f)))
    }

    /// Maps into the reference lane of `U`.
    pub fn map_to_obj<U, F>(self, f: F) -> AutoClosingStream<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        self.wrap("map_to_obj", move |iter| Box::new(iter.map(f)))
    }

    /// Replaces every element by the elements `f` returns for it.
    pub fn flat_map<U, I, F>(self, f: F) -> AutoClosingStream<U>
    where
        U: Send + 'static,
        I: IntoIterator<Item = U> + 'static,
        I::IntoIter: Send + 'static,
        F: FnMut(T) -> I + Send + 'static,
    {
        self.wrap("flat_map", move |iter| Box::new(iter.flat_map(f)))
    }

    /// Replaces every element by whatever `f` pushes into the buffer.
    pub fn map_multi<U, F>(self, mut f: F) -> AutoClosingStream<U>
    where
        U: Send + 'static,
        F: FnMut(T, &mut Vec<U>) + Send + 'static,
    {
        self.wrap("map_multi", move |iter| {
            Box::new(iter.flat_map(move |value| {
                let mut out = Vec::new();
                f(value, &mut out);
                out
            }))
        })
    }

    /// Drops repeated elements, keeping the first occurrence.
    pub fn distinct(self) -> Self
    where
        T: Eq + Hash + Clone,
    {
        self.wrap("distinct", |iter| {
            let mut seen = HashSet::new();
            Box::new(iter.filter(move |value| seen.insert(value.clone())))
        })
    }

    /// Drops elements whose key was already seen.
    pub fn distinct_by<K, F>(self, mut key: F) -> Self
    where
        K: Eq + Hash + Send + 'static,
        F: FnMut(&T) -> K + Send + 'static,
    {
        self.wrap("distinct_by", move |iter| {
            let mut seen = HashSet::new();
            Box::new(iter.filter(move |value| seen.insert(key(value))))
        })
    }

    /// Sorts by natural order. Nothing is pulled until a terminal operation
    /// runs. Doubles sort with `sorted_by(f64::total_cmp)`.
    pub fn sorted(self) -> Self
    where
        T: Ord,
    {
        self.wrap("sorted", |iter| {
            Box::new(Deferred::new(move || {
                let mut values: Vec<T> = iter.collect();
                values.sort();
                values.into_iter()
            }))
        })
    }

    /// Stable sort by `compare`.
    pub fn sorted_by<C>(self, compare: C) -> Self
    where
        C: FnMut(&T, &T) -> Ordering + Send + 'static,
    {
        self.wrap("sorted_by", |iter| {
            Box::new(Deferred::new(move || {
                let mut values: Vec<T> = iter.collect();
                values.sort_by(compare);
                values.into_iter()
            }))
        })
    }

    /// Keeps at most `n` elements, then stops pulling.
    pub fn limit(self, n: u64) -> Self {
        let n = usize::try_from(n).unwrap_or(usize::MAX);
        self.wrap("limit", move |iter| Box::new(iter.take(n)))
    }

    /// Drops the first `n` elements.
    pub fn skip(self, n: u64) -> Self {
        let n = usize::try_from(n).unwrap_or(usize::MAX);
        self.wrap("skip", move |iter| Box::new(iter.skip(n)))
    }

    /// Observes every element as it is pulled.
    pub fn peek<F>(self, action: F) -> Self
    where
        F: FnMut(&T) + Send + 'static,
    {
        self.wrap("peek", move |iter| Box::new(iter.inspect(action)))
    }

    /// Keeps elements while `predicate` holds, then stops pulling.
    pub fn take_while<P>(self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        self.wrap("take_while", move |iter| Box::new(iter.take_while(predicate)))
    }

    /// Drops elements while `predicate` holds.
    pub fn drop_while<P>(self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'static,
    {
        self.wrap("drop_while", move |iter| Box::new(iter.skip_while(predicate)))
    }

    /// Appends `other`. Closing the result releases both resources.
    pub fn concat(self, other: AutoClosingStream<T>) -> Self {
        let AutoClosingStream {
            iter: tail,
            handle: tail_handle,
            parallel: tail_parallel,
            ..
        } = other;
        self.handle.absorb(tail_handle);
        let mut joined = self.wrap("concat", move |iter| Box::new(iter.chain(tail)));
        joined.parallel |= tail_parallel;
        joined
    }

    /// Registers `hook` to run when the stream closes.
    pub fn on_close<F: FnOnce() + Send + 'static>(self, hook: F) -> Self {
        self.handle.on_close(hook);
        self
    }

    /// Lets terminal operations fan out across worker threads.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Runs terminal operations on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Releases the encounter-order guarantee of parallel terminals.
    pub fn unordered(mut self) -> Self {
        self.ordered = false;
        self
    }

    /// Whether terminal operations may run in parallel.
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Whether encounter order is kept.
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// The configuration every derived stream inherits.
    pub fn config(&self) -> AutoCloseConfig {
        self.config
    }

    /// Releases the resource without running a terminal operation.
    /// Idempotent.
    pub fn close(&self) -> Result<()> {
        self.handle.close()
    }

    /// Whether the resource has been released.
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    fn execution(&self) -> Execution {
        match (self.parallel, self.ordered) {
            (false, _) => Execution::Sequential,
            (true, true) => Execution::ParallelOrdered,
            (true, false) => Execution::ParallelUnordered,
        }
    }

    /// Runs `op` over the sequence, then closes the handle.
    ///
    /// A terminal failure is returned as is when release succeeds, and
    /// chained with the release failure otherwise.
    pub(crate) fn finally_close<R, F>(self, name: &'static str, op: F) -> Result<R>
    where
        F: FnOnce(BoxIter<T>, Execution) -> Result<R>,
    {
        let mode = self.execution();
        let AutoClosingStream { iter, handle, .. } = self;
        if handle.is_closed() {
            return Err(Error::PipelineState(format!(
                "{}() called on a closed stream",
                name
            )));
        }

        debug!(op = name, ?mode, "running terminal operation");
        let outcome = op(iter, mode);
        let released = handle.close();
        debug!(op = name, ok = outcome.is_ok(), "stream closed");

        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(release)) => Err(release),
            (Err(failure), Ok(())) => Err(failure),
            (Err(failure), Err(release)) => Err(Error::chain(failure, release)),
        }
    }

    pub(crate) fn fold_named<U, A, C>(
        self,
        name: &'static str,
        identity: U,
        accumulate: A,
        combine: C,
    ) -> Result<U>
    where
        U: Clone + Send + Sync,
        A: Fn(U, T) -> U + Send + Sync,
        C: Fn(U, U) -> U + Send + Sync,
    {
        self.finally_close(name, |iter, mode| {
            Ok(match mode {
                Execution::Sequential => iter.fold(identity, accumulate),
                Execution::ParallelOrdered => iter
                    .collect::<Vec<_>>()
                    .into_par_iter()
                    .fold(|| identity.clone(), accumulate)
                    .reduce(|| identity.clone(), combine),
                Execution::ParallelUnordered => iter
                    .par_bridge()
                    .fold(|| identity.clone(), accumulate)
                    .reduce(|| identity.clone(), combine),
            })
        })
    }

    pub(crate) fn reduce_named<F>(self, name: &'static str, op: F) -> Result<Option<T>>
    where
        F: Fn(T, T) -> T + Send + Sync,
    {
        self.finally_close(name, |iter, mode| {
            Ok(match mode {
                Execution::Sequential => iter.reduce(op),
                Execution::ParallelOrdered => {
                    iter.collect::<Vec<_>>().into_par_iter().reduce_with(op)
                }
                Execution::ParallelUnordered => iter.par_bridge().reduce_with(op),
            })
        })
    }

    /// Hands every element to `action`; in any order when parallel.
    pub fn for_each<F>(self, action: F) -> Result<()>
    where
        F: Fn(T) + Send + Sync,
    {
        self.finally_close("for_each", |iter, mode| {
            match mode {
                Execution::Sequential => iter.for_each(action),
                _ => iter.par_bridge().for_each(action),
            }
            Ok(())
        })
    }

    /// Hands every element to `action` in encounter order, on the calling
    /// thread.
    pub fn for_each_ordered<F>(self, action: F) -> Result<()>
    where
        F: FnMut(T),
    {
        self.finally_close("for_each_ordered", |iter, _| {
            iter.for_each(action);
            Ok(())
        })
    }

    /// Gathers the elements into a `Vec`.
    pub fn to_vec(self) -> Result<Vec<T>> {
        self.finally_close("to_vec", |iter, mode| Ok(gather(iter, mode)))
    }

    /// Gathers the elements into a boxed slice.
    pub fn to_array(self) -> Result<Box<[T]>> {
        self.finally_close("to_array", |iter, mode| {
            Ok(gather(iter, mode).into_boxed_slice())
        })
    }

    /// Gathers the elements into any collection, in encounter order.
    pub fn collect<C: FromIterator<T>>(self) -> Result<C> {
        self.finally_close("collect", |iter, _| Ok(iter.collect()))
    }

    /// Folds with an associative `op`, starting from `identity`.
    pub fn reduce<F>(self, identity: T, op: F) -> Result<T>
    where
        T: Clone + Sync,
        F: Fn(T, T) -> T + Send + Sync,
    {
        self.fold_named("reduce", identity, &op, &op)
    }

    /// Folds with an associative `op`; `None` for an empty stream.
    pub fn reduce_opt<F>(self, op: F) -> Result<Option<T>>
    where
        F: Fn(T, T) -> T + Send + Sync,
    {
        self.reduce_named("reduce", op)
    }

    /// Folds into `U` with `accumulate`, merging partial results of a
    /// parallel traversal with `combine`.
    pub fn fold_with<U, A, C>(self, identity: U, accumulate: A, combine: C) -> Result<U>
    where
        U: Clone + Send + Sync,
        A: Fn(U, T) -> U + Send + Sync,
        C: Fn(U, U) -> U + Send + Sync,
    {
        self.fold_named("fold_with", identity, accumulate, combine)
    }

    /// Smallest element under `compare`.
    pub fn min_by<C>(self, compare: C) -> Result<Option<T>>
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync,
    {
        self.reduce_named("min_by", move |a, b| {
            if compare(&b, &a) == Ordering::Less {
                b
            } else {
                a
            }
        })
    }

    /// Largest element under `compare`.
    pub fn max_by<C>(self, compare: C) -> Result<Option<T>>
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync,
    {
        self.reduce_named("max_by", move |a, b| {
            if compare(&b, &a) == Ordering::Greater {
                b
            } else {
                a
            }
        })
    }

    /// Number of elements.
    pub fn count(self) -> Result<u64> {
        self.finally_close("count", |iter, mode| {
            let n = match mode {
                Execution::Sequential => iter.count(),
                _ => iter.par_bridge().count(),
            };
            Ok(n as u64)
        })
    }

    /// Whether some element matches; stops at the first match.
    pub fn any_match<P>(self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        self.finally_close("any_match", |mut iter, mode| {
            Ok(match mode {
                Execution::Sequential => iter.any(|v| predicate(&v)),
                _ => iter.par_bridge().any(|v| predicate(&v)),
            })
        })
    }

    /// Whether every element matches; stops at the first mismatch.
    pub fn all_match<P>(self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        self.finally_close("all_match", |mut iter, mode| {
            Ok(match mode {
                Execution::Sequential => iter.all(|v| predicate(&v)),
                _ => iter.par_bridge().all(|v| predicate(&v)),
            })
        })
    }

    /// Whether no element matches; stops at the first match.
    pub fn none_match<P>(self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        self.finally_close("none_match", |mut iter, mode| {
            Ok(match mode {
                Execution::Sequential => !iter.any(|v| predicate(&v)),
                _ => !iter.par_bridge().any(|v| predicate(&v)),
            })
        })
    }

    /// The first element in encounter order.
    pub fn find_first(self) -> Result<Option<T>> {
        self.finally_close("find_first", |mut iter, _| Ok(iter.next()))
    }

    /// Some element; any element when parallel and unordered.
    pub fn find_any(self) -> Result<Option<T>> {
        self.finally_close("find_any", |mut iter, mode| {
            Ok(match mode {
                Execution::ParallelUnordered => iter.par_bridge().find_any(|_| true),
                _ => iter.next(),
            })
        })
    }

    /// Hands every element to a fallible `action` in encounter order,
    /// stopping at the first failure.
    pub fn try_for_each<E, F>(self, action: F) -> Result<()>
    where
        E: Into<BoxError>,
        F: FnMut(T) -> std::result::Result<(), E>,
    {
        self.finally_close("try_for_each", |mut iter, _| {
            iter.try_for_each(action).map_err(Error::operation)
        })
    }

    /// Fallible sequential fold, stopping at the first failure.
    pub fn try_fold<B, E, F>(self, init: B, f: F) -> Result<B>
    where
        E: Into<BoxError>,
        F: FnMut(B, T) -> std::result::Result<B, E>,
    {
        self.finally_close("try_fold", |mut iter, _| {
            iter.try_fold(init, f).map_err(Error::operation)
        })
    }

    /// Hands out a raw cursor over the remaining elements.
    ///
    /// Refused with `UnsupportedOperation` unless the stream was built
    /// with `allow_iterator_escape`; the stream then stays open and
    /// usable. On success the cursor owns the resource and this stream
    /// is left closed.
    pub fn iterator(&mut self) -> Result<RawCursor<T>> {
        self.escape("iterator")
    }

    /// Like [`AutoClosingStream::iterator`]; the cursor can be split into
    /// batches with [`RawCursor::try_split`].
    pub fn spliterator(&mut self) -> Result<RawCursor<T>> {
        self.escape("spliterator")
    }

    fn escape(&mut self, name: &'static str) -> Result<RawCursor<T>> {
        if !self.config.allow_iterator_escape {
            return Err(Error::UnsupportedOperation(format!(
                "{}() is not supported by auto-closing streams; \
                 enable allow_iterator_escape to manage the resource manually",
                name
            )));
        }
        if self.handle.is_closed() {
            return Err(Error::PipelineState(format!(
                "{}() called on a closed stream",
                name
            )));
        }
        debug!(op = name, "raw cursor escapes auto-closing stream");
        let empty: BoxIter<T> = Box::new(std::iter::empty());
        let iter = std::mem::replace(&mut self.iter, empty);
        let handle = std::mem::replace(&mut self.handle, ResourceHandle::detached());
        Ok(RawCursor::new(iter, handle))
    }
}

fn gather<T: Send>(iter: BoxIter<T>, mode: Execution) -> Vec<T> {
    match mode {
        Execution::ParallelUnordered => iter.par_bridge().collect(),
        _ => iter.collect(),
    }
}

impl<T> fmt::Debug for AutoClosingStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoClosingStream")
            .field("handle", &self.handle)
            .field("config", &self.config)
            .field("parallel", &self.parallel)
            .field("ordered", &self.ordered)
            .finish_non_exhaustive()
    }
}

//! Execution adapters: realize a pipeline's intermediate operations over
//! an opened sequence.

use crate::fault::{FaultSlot, FaultTail, Shunt};
use fieldstream_autoclose::{BoxIter, ClosableSequence, Deferred};
use fieldstream_core::{Element, Result};
use fieldstream_pipeline::{ElementIter, IntermediateOperation, Pipeline};
use tracing::{debug, trace};

/// Turns a pipeline plus an opened source sequence into a realized lazy
/// sequence reflecting every intermediate operation, in declared order.
///
/// The adapter may translate operations into a remote query, run them
/// locally, or mix both. The returned sequence must keep the source's
/// resource handle so that closing it releases the source. A failure
/// raised while pulling is yielded as an `Err` item.
pub trait ExecutionAdapter: Send + Sync {
    /// Realizes the intermediate operations of `pipeline` over `source`.
    fn open(
        &self,
        pipeline: &Pipeline,
        source: ClosableSequence<Element>,
    ) -> Result<ClosableSequence<Result<Element>>>;
}

/// Runs every intermediate operation in-process, lazily.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAdapter;

impl LocalAdapter {
    /// Creates the adapter.
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionAdapter for LocalAdapter {
    fn open(
        &self,
        pipeline: &Pipeline,
        source: ClosableSequence<Element>,
    ) -> Result<ClosableSequence<Result<Element>>> {
        debug!(stages = pipeline.len(), "realizing pipeline locally");
        let fault = FaultSlot::new();
        Ok(source.map_iter(|iter| {
            let realized = pipeline
                .intermediates()
                .iter()
                .cloned()
                .fold(iter, |iter, op| apply_stage(iter, op, &fault));
            let tailed: BoxIter<Result<Element>> = Box::new(FaultTail::new(realized, fault));
            tailed
        }))
    }
}

fn apply_stage(iter: ElementIter, op: IntermediateOperation, fault: &FaultSlot) -> ElementIter {
    trace!(op = %op, "apply stage");
    match op {
        IntermediateOperation::Filter(predicate) => {
            Box::new(iter.filter(move |e| predicate.test(e)))
        }
        IntermediateOperation::Map(mapper) => Box::new(Shunt::new(
            iter.map(move |e| mapper.apply(e)),
            fault.clone(),
        )),
        IntermediateOperation::Sorted(order) => {
            let fault = fault.clone();
            Box::new(Deferred::new(move || {
                let mut elements: Vec<Element> = iter.collect();
                if fault.is_tripped() {
                    elements.clear();
                }
                elements.sort_by(|a, b| order.compare(a, b));
                elements.into_iter()
            }))
        }
        IntermediateOperation::Distinct(dedup) => dedup.apply(iter),
        IntermediateOperation::Limit { n, .. } => {
            Box::new(iter.take(usize::try_from(n).unwrap_or(usize::MAX)))
        }
        IntermediateOperation::Skip { n, .. } => {
            Box::new(iter.skip(usize::try_from(n).unwrap_or(usize::MAX)))
        }
        IntermediateOperation::Peek(action) => Box::new(iter.inspect(move |e| action.run(e))),
        IntermediateOperation::FlatMap(mapper) => Box::new(
            Shunt::new(iter.map(move |e| mapper.apply(e)), fault.clone()).flatten(),
        ),
        IntermediateOperation::TakeWhile(predicate) => {
            Box::new(iter.take_while(move |e| predicate.test(e)))
        }
        IntermediateOperation::DropWhile(predicate) => {
            Box::new(iter.skip_while(move |e| predicate.test(e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldstream_core::{BoxError, Error, Lane};

    fn realize(pipeline: &Pipeline, values: Vec<i32>) -> Vec<Result<Element>> {
        let source = ClosableSequence::new(
            values.into_iter().map(Element::wrap),
            || -> std::result::Result<(), BoxError> { Ok(()) },
        );
        let (iter, _handle) = LocalAdapter::new()
            .open(pipeline, source)
            .unwrap()
            .into_parts();
        iter.collect()
    }

    fn ints(results: Vec<Result<Element>>) -> Vec<i32> {
        results
            .into_iter()
            .filter_map(|r| r.ok().and_then(|e| e.as_int()))
            .collect()
    }

    #[test]
    fn test_stages_apply_in_order() {
        let mut p = Pipeline::of::<i32>();
        p.append(IntermediateOperation::filter::<i32, _>(|v: &i32| *v % 2 == 1))
            .unwrap()
            .append(IntermediateOperation::sorted::<i32>())
            .unwrap()
            .append(IntermediateOperation::skip(Lane::Int, 1))
            .unwrap()
            .append(IntermediateOperation::limit(Lane::Int, 2))
            .unwrap();
        assert_eq!(ints(realize(&p, vec![9, 4, 7, 1, 3, 8, 5])), vec![3, 5]);
    }

    #[test]
    fn test_lane_change_and_flat_map() {
        let mut p = Pipeline::of::<i32>();
        p.append(IntermediateOperation::flat_map(|v: i32| vec![v; v as usize]))
            .unwrap()
            .append(IntermediateOperation::distinct::<i32>())
            .unwrap()
            .append(IntermediateOperation::map(|v: i32| i64::from(v) * 10))
            .unwrap();
        let out: Vec<i64> = realize(&p, vec![2, 1, 2])
            .into_iter()
            .filter_map(|r| r.ok().and_then(|e| e.as_long()))
            .collect();
        assert_eq!(out, vec![20, 10]);
    }

    #[test]
    fn test_take_and_drop_while() {
        let mut p = Pipeline::of::<i32>();
        p.append(IntermediateOperation::drop_while::<i32, _>(|v: &i32| *v < 3))
            .unwrap()
            .append(IntermediateOperation::take_while::<i32, _>(|v: &i32| *v < 6))
            .unwrap();
        assert_eq!(ints(realize(&p, (1..10).collect())), vec![3, 4, 5]);
    }

    #[test]
    fn test_stage_failure_ends_sequence_with_error() {
        // Map stage whose erased input lane does not match the elements.
        let mut p = Pipeline::with_root(Lane::Int);
        p.append(IntermediateOperation::map(|v: i32| v + 1))
            .unwrap()
            .append(IntermediateOperation::sorted::<i32>())
            .unwrap();
        let source = ClosableSequence::new(
            vec![Element::wrap(1i32), Element::wrap(2i64), Element::wrap(3i32)],
            || -> std::result::Result<(), BoxError> { Ok(()) },
        );
        let (iter, _handle) = LocalAdapter::new().open(&p, source).unwrap().into_parts();
        let out: Vec<Result<Element>> = iter.collect();
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(Error::LaneMismatch { .. })));
    }
}

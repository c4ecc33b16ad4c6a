#![no_main]

use arbitrary::Arbitrary;
use fieldstream::{InMemorySource, Streamer};
use fieldstream_core::{Error, Lane};
use fieldstream_pipeline::{IntermediateOperation, TerminalOperation};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    FilterLong { bound: i64 },
    FilterInt { bound: i32 },
    LongToInt,
    IntToLong,
    LongToDouble,
    Limit { lane: u8, n: u8 },
    Skip { lane: u8, n: u8 },
    SortedLong,
    DistinctLong,
    Count { lane: u8 },
    Collect { lane: u8 },
    SumLong,
}

fn lane(tag: u8) -> Lane {
    match tag % 3 {
        0 => Lane::Int,
        1 => Lane::Long,
        _ => Lane::Double,
    }
}

fn expected(err: &Error) -> bool {
    matches!(err, Error::LaneMismatch { .. } | Error::PipelineState(_))
}

fuzz_target!(|input: (Vec<i64>, Vec<Op>)| {
    let (values, ops) = input;
    let streamer = Streamer::new(InMemorySource::new(values.into_iter().take(256).collect::<Vec<_>>()));
    let mut pipeline = streamer.pipeline();

    for op in ops.iter().take(32) {
        let outcome = match op {
            Op::FilterLong { bound } => {
                let bound = *bound;
                pipeline
                    .append(IntermediateOperation::filter::<i64, _>(move |v: &i64| *v < bound))
                    .map(|_| ())
            }
            Op::FilterInt { bound } => {
                let bound = *bound;
                pipeline
                    .append(IntermediateOperation::filter::<i32, _>(move |v: &i32| *v >= bound))
                    .map(|_| ())
            }
            Op::LongToInt => pipeline
                .append(IntermediateOperation::map(|v: i64| v as i32))
                .map(|_| ()),
            Op::IntToLong => pipeline
                .append(IntermediateOperation::map(|v: i32| i64::from(v)))
                .map(|_| ()),
            Op::LongToDouble => pipeline
                .append(IntermediateOperation::map(|v: i64| v as f64))
                .map(|_| ()),
            Op::Limit { lane: tag, n } => pipeline
                .append(IntermediateOperation::limit(lane(*tag), u64::from(*n)))
                .map(|_| ()),
            Op::Skip { lane: tag, n } => pipeline
                .append(IntermediateOperation::skip(lane(*tag), u64::from(*n)))
                .map(|_| ()),
            Op::SortedLong => pipeline
                .append(IntermediateOperation::sorted::<i64>())
                .map(|_| ()),
            Op::DistinctLong => pipeline
                .append(IntermediateOperation::distinct::<i64>())
                .map(|_| ()),
            Op::Count { lane: tag } => pipeline
                .terminate(TerminalOperation::count(lane(*tag)))
                .map(|_| ()),
            Op::Collect { lane: tag } => pipeline
                .terminate(TerminalOperation::collect(lane(*tag)))
                .map(|_| ()),
            Op::SumLong => pipeline
                .terminate(TerminalOperation::reduce(Some(0i64), |a: i64, b: i64| a.wrapping_add(b)))
                .map(|_| ()),
        };
        if let Err(err) = outcome {
            assert!(expected(&err), "unexpected build error: {:?}", err);
        }
    }

    if pipeline.is_frozen() {
        if let Err(err) = streamer.execute(pipeline) {
            panic!("frozen pipeline failed to execute: {:?}", err);
        }
    }
});

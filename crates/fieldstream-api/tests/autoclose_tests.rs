mod common;

use common::{catalogue, scenario_films, streamer, Film, FilmFields};
use fieldstream::{
    AutoCloseConfig, AutoClosingStream, Error, InMemorySource, Streamer, StreamerConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type S = AutoClosingStream<Film>;
type Terminal = fn(S) -> fieldstream::Result<()>;

#[test]
fn test_every_terminal_releases_once() {
    let terminals: [(&str, Terminal); 16] = [
        ("for_each", |s: S| s.for_each(|_| {})),
        ("for_each_ordered", |s: S| s.for_each_ordered(|_| {})),
        ("to_vec", |s: S| s.to_vec().map(|_| ())),
        ("to_array", |s: S| s.to_array().map(|_| ())),
        ("collect", |s: S| s.collect::<Vec<_>>().map(|_| ())),
        ("reduce_opt", |s: S| s.reduce_opt(|a, _| a).map(|_| ())),
        ("fold_with", |s: S| s.fold_with(0usize, |n, _| n + 1, |a, b| a + b).map(|_| ())),
        ("min_by", |s: S| s.min_by(|a, b| a.id.cmp(&b.id)).map(|_| ())),
        ("max_by", |s: S| s.max_by(|a, b| a.id.cmp(&b.id)).map(|_| ())),
        ("count", |s: S| s.count().map(|_| ())),
        ("any_match", |s: S| s.any_match(|f| f.id == 1).map(|_| ())),
        ("all_match", |s: S| s.all_match(|f| f.id > 100).map(|_| ())),
        ("none_match", |s: S| s.none_match(|f| f.id == 1).map(|_| ())),
        ("find_first", |s: S| s.find_first().map(|_| ())),
        ("find_any", |s: S| s.find_any().map(|_| ())),
        ("try_for_each", |s: S| s.try_for_each(|_| Ok::<(), Error>(()))),
    ];

    for (name, terminal) in terminals {
        for parallel in [false, true] {
            let (streamer, source) = streamer(catalogue());
            let stream = streamer.stream().unwrap();
            let stream = if parallel { stream.parallel() } else { stream };
            terminal(stream).unwrap_or_else(|e| panic!("{} failed: {}", name, e));
            assert_eq!(source.released(), 1, "{} (parallel: {})", name, parallel);
        }
    }
}

#[test]
fn test_short_circuit_on_infinite_source() {
    let released = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&released);
    let stream = AutoClosingStream::over(
        (0u64..).map(|i| Film::new(i as i64, 100, "G")),
        move || -> Result<(), fieldstream::BoxError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        AutoCloseConfig::default(),
    );
    let ids = stream
        .filter(|f| f.id % 7 == 0)
        .map_to_long(|f| f.id)
        .limit(3)
        .to_vec()
        .unwrap();
    assert_eq!(ids, vec![0, 7, 14]);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_limit_zero_closes() {
    let (streamer, source) = streamer(scenario_films());
    assert!(streamer.stream().unwrap().limit(0).to_vec().unwrap().is_empty());
    assert_eq!(streamer.query().limit(0).collect().unwrap(), vec![]);
    assert_eq!(source.opened(), 2);
    assert_eq!(source.released(), 2);
}

#[test]
fn test_failure_then_release_failure_chained() {
    let source = InMemorySource::new(scenario_films()).failing_release("cursor already gone");
    let streamer = Streamer::new(source.clone());
    let err = streamer
        .stream()
        .unwrap()
        .try_for_each(|f| {
            if f.id == 2 {
                Err(format!("cannot process film {}", f.id))
            } else {
                Ok(())
            }
        })
        .unwrap_err();

    assert!(matches!(err.primary(), Error::Operation(_)));
    assert!(err.primary().to_string().contains("film 2"));
    assert!(matches!(err.secondary(), Some(Error::ResourceRelease(_))));
    assert_eq!(source.released(), 1);
}

#[test]
fn test_release_failure_alone() {
    let source = InMemorySource::new(scenario_films()).failing_release("cursor already gone");
    let streamer = Streamer::new(source.clone());
    let err = streamer.query().count().unwrap_err();
    assert!(matches!(err, Error::ResourceRelease(_)));
    assert_eq!(source.released(), 1);
}

#[test]
fn test_explicit_close_is_idempotent() {
    let (streamer, source) = streamer(scenario_films());
    let stream = streamer.stream().unwrap();
    stream.close().unwrap();
    stream.close().unwrap();
    assert!(stream.is_closed());
    assert!(matches!(stream.count(), Err(Error::PipelineState(_))));
    assert_eq!(source.released(), 1);
}

#[test]
fn test_dropped_stream_releases() {
    let (streamer, source) = streamer(scenario_films());
    let stream = streamer.stream().unwrap().filter(|f| f.length > 100);
    drop(stream);
    assert_eq!(source.released(), 1);
}

#[test]
fn test_wrapping_keeps_single_resource() {
    let fields = FilmFields::generated();
    let (streamer, source) = streamer(catalogue());
    let length = fields.length.clone();
    let stats = streamer
        .stream()
        .unwrap()
        .filter(move |f| length.get(f).is_some_and(|l| l > 100))
        .map_to_int(|f| f.length)
        .sorted()
        .distinct()
        .statistics()
        .unwrap();
    assert!(stats.count() > 0);
    assert!(stats.min().unwrap() > 100);
    assert_eq!(source.opened(), 1);
    assert_eq!(source.released(), 1);
}

#[test]
fn test_escape_hatch_disabled_by_default() {
    let (streamer, source) = streamer(scenario_films());
    let mut stream = streamer.stream().unwrap();
    assert!(matches!(
        stream.iterator(),
        Err(Error::UnsupportedOperation(_))
    ));
    assert!(matches!(
        stream.spliterator(),
        Err(Error::UnsupportedOperation(_))
    ));
    assert_eq!(source.released(), 0);
    assert_eq!(stream.count().unwrap(), 3);
    assert_eq!(source.released(), 1);
}

#[test]
fn test_escape_hatch_enabled() {
    let source = InMemorySource::new(catalogue());
    let streamer = Streamer::new(source.clone())
        .with_config(StreamerConfig::new().with_iterator_escape(true));

    let mut stream = streamer.stream().unwrap().map_to_long(|f| f.id);
    let mut cursor = stream.spliterator().unwrap();
    assert!(stream.is_closed());
    assert_eq!(source.released(), 0);

    let first = cursor.try_split().unwrap();
    assert_eq!(first.len(), 40);
    assert!(cursor.try_split().is_none());
    cursor.close().unwrap();
    assert_eq!(source.released(), 1);

    let mut stream = streamer.stream().unwrap();
    let cursor = stream.iterator().unwrap();
    drop(cursor);
    assert_eq!(source.released(), 2);
}

#[test]
fn test_concat_releases_both_sources() {
    let left = InMemorySource::new(scenario_films());
    let right = InMemorySource::new(catalogue());
    let left_streamer = Streamer::new(left.clone());
    let right_streamer = Streamer::new(right.clone());

    let count = left_streamer
        .stream()
        .unwrap()
        .concat(right_streamer.stream().unwrap())
        .map_to_long(|f| f.id)
        .distinct()
        .count()
        .unwrap();
    assert_eq!(count, 40);
    assert!(left.is_balanced());
    assert!(right.is_balanced());
}

#[test]
fn test_panicking_consumer_still_releases() {
    let (streamer, source) = streamer(scenario_films());
    let stream = streamer.stream().unwrap();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        stream.for_each_ordered(|f| {
            if f.id == 2 {
                panic!("consumer gave up");
            }
        })
    }));
    assert!(outcome.is_err());
    assert_eq!(source.released(), 1);
}

#[test]
fn test_parallel_numeric_terminals_match_sequential() {
    let (streamer, _) = streamer(catalogue());
    let sequential = streamer
        .stream()
        .unwrap()
        .map_to_double(|f| f.rental_rate)
        .statistics()
        .unwrap();
    let parallel = streamer
        .stream()
        .unwrap()
        .parallel()
        .map_to_double(|f| f.rental_rate)
        .statistics()
        .unwrap();
    assert_eq!(sequential.count(), parallel.count());
    assert_eq!(sequential.min(), parallel.min());
    assert_eq!(sequential.max(), parallel.max());
    assert!((sequential.sum() - parallel.sum()).abs() < 1e-9);

    let ids_sum = streamer
        .stream()
        .unwrap()
        .parallel()
        .map_to_int(|f| f.id as i32)
        .sum()
        .unwrap();
    assert_eq!(ids_sum, 820);

    let lengths = streamer
        .stream()
        .unwrap()
        .map_to_int(|f| f.length)
        .as_long_stream()
        .max()
        .unwrap();
    assert!(lengths.is_some());
}

#[test]
fn test_streamer_parallel_config() {
    let source = InMemorySource::new(catalogue());
    let streamer = Streamer::new(source).with_config(StreamerConfig::new().with_parallel(true));
    assert!(streamer.stream().unwrap().is_parallel());
    assert!(streamer.pipeline().is_parallel());
    assert_eq!(streamer.query().count().unwrap(), 40);
}

mod common;

use common::{Film, FilmFields};
use fieldstream::{
    AutoCloseConfig, AutoClosingStream, Inclusion, InMemorySource, PassThroughOptimizer,
    Streamer, TerminalOperationOptimizer,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const RATINGS: [&str; 4] = ["G", "PG", "PG-13", "R"];

fn films() -> impl Strategy<Value = Vec<Film>> {
    prop::collection::vec((1i64..500, 30i32..200, 0usize..RATINGS.len()), 0..60).prop_map(|rows| {
        rows.into_iter()
            .map(|(id, length, rating)| Film::new(id, length, RATINGS[rating]))
            .collect()
    })
}

fn inclusion() -> impl Strategy<Value = Inclusion> {
    prop_oneof![
        Just(Inclusion::Open),
        Just(Inclusion::Closed),
        Just(Inclusion::StartOpen),
        Just(Inclusion::EndOpen),
    ]
}

proptest! {
    #[test]
    fn prop_filter_matches_in_memory_filter(films in films(), threshold in 30i32..200) {
        let fields = FilmFields::generated();
        let source = InMemorySource::new(films.clone());
        let streamer = Streamer::new(source.clone());

        let queried = streamer
            .query()
            .filter(fields.length.greater_or_equal(threshold))
            .collect()
            .unwrap();
        let expected: Vec<Film> = films.into_iter().filter(|f| f.length >= threshold).collect();

        prop_assert_eq!(queried, expected);
        prop_assert!(source.is_balanced());
    }

    #[test]
    fn prop_between_and_not_between_partition(
        films in films(),
        a in 30i32..200,
        b in 30i32..200,
        inclusion in inclusion(),
    ) {
        let fields = FilmFields::generated();
        let (start, end) = (a.min(b), a.max(b));
        let inside = fields.length.between(start, end, inclusion);
        let outside = fields.length.not_between(start, end, inclusion);

        for film in &films {
            prop_assert_ne!(inside.test(film), outside.test(film));
            prop_assert_eq!(
                inside.test(film),
                inclusion.contains(&film.length, &start, &end)
            );
        }
    }

    #[test]
    fn prop_in_ignores_duplicates(
        films in films(),
        picks in prop::collection::vec(0usize..RATINGS.len(), 0..6),
    ) {
        let fields = FilmFields::generated();
        let values: Vec<String> = picks.iter().map(|&i| RATINGS[i].to_string()).collect();
        let doubled: Vec<String> = values.iter().chain(values.iter()).cloned().collect();

        let once = fields.rating.is_in(values.clone());
        let twice = fields.rating.is_in(doubled.clone());
        let not_once = fields.rating.not_in(values.clone());
        let not_twice = fields.rating.not_in(doubled);

        for film in &films {
            prop_assert_eq!(once.test(film), twice.test(film));
            prop_assert_eq!(not_once.test(film), not_twice.test(film));
            prop_assert_eq!(once.test(film), values.contains(&film.rating));
            prop_assert_ne!(once.test(film), not_once.test(film));
        }
    }

    #[test]
    fn prop_optimizer_is_idempotent(limit in 0u64..50, skip in 0u64..50, threshold in 30i32..200) {
        let fields = FilmFields::generated();
        let streamer = Streamer::new(InMemorySource::new(Vec::<Film>::new()));
        let pipeline = streamer
            .query()
            .filter(fields.length.less_than(threshold))
            .skip(skip)
            .limit(limit)
            .map_to_long(|f| f.id)
            .into_pipeline()
            .unwrap();

        let once = PassThroughOptimizer.optimize(pipeline.clone());
        let twice = PassThroughOptimizer.optimize(once.clone());
        prop_assert_eq!(&once, &pipeline);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_release_runs_exactly_once(
        len in 0usize..100,
        take in 0u64..120,
        parallel in any::<bool>(),
        closes in 0usize..3,
    ) {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let stream = AutoClosingStream::over(
            0..len as i64,
            move || -> Result<(), fieldstream::BoxError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            AutoCloseConfig::default(),
        );
        let stream = if parallel { stream.parallel() } else { stream };
        for _ in 0..closes {
            stream.close().unwrap();
        }

        let outcome = stream.limit(take).count();
        if closes == 0 {
            prop_assert_eq!(outcome.unwrap(), (len as u64).min(take));
        } else {
            prop_assert!(outcome.is_err());
        }
        prop_assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}

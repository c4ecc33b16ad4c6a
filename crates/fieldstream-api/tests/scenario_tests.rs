mod common;

use common::{scenario_films, streamer, Film, FilmFields};

#[test]
fn test_union_by_concat() {
    let fields = FilmFields::generated();
    let (streamer, source) = streamer(scenario_films());

    let long = fields.length.greater_than(120);
    let teen = fields.rating.equal("PG-13".to_string());
    let id = fields.id.comparator();

    let ids: Vec<i64> = streamer
        .stream()
        .unwrap()
        .filter(move |f| long.test(f))
        .concat(streamer.stream().unwrap().filter(move |f| teen.test(f)))
        .distinct_by(|f| f.id)
        .sorted_by(move |a, b| id.compare(a, b))
        .map_to_long(|f| f.id)
        .to_vec()
        .unwrap();

    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(source.opened(), 2);
    assert_eq!(source.released(), 2);
}

#[test]
fn test_union_matches_single_disjunctive_filter() {
    let fields = FilmFields::generated();
    let (streamer, source) = streamer(scenario_films());

    let long = fields.length.greater_than(120);
    let teen = fields.rating.equal("PG-13".to_string());
    let either = move |f: &Film| long.test(f) || teen.test(f);

    let single = streamer
        .query()
        .filter(either)
        .sorted_by(fields.id.comparator())
        .map_to_long(|f| f.id)
        .collect()
        .unwrap();

    let left = streamer
        .query()
        .filter(fields.length.greater_than(120))
        .collect()
        .unwrap();
    let right = streamer
        .query()
        .filter(fields.rating.equal("PG-13".to_string()))
        .collect()
        .unwrap();
    let mut union: Vec<i64> = left.iter().chain(right.iter()).map(|f| f.id).collect();
    union.sort_unstable();
    union.dedup();

    assert_eq!(single, vec![1, 2, 3]);
    assert_eq!(single, union);
    assert_eq!(source.opened(), 3);
    assert!(source.is_balanced());
}

#[test]
fn test_each_half_of_the_union() {
    let fields = FilmFields::generated();
    let (streamer, _) = streamer(scenario_films());

    let long = streamer
        .query()
        .filter(fields.length.greater_than(120))
        .map_to_long(|f| f.id)
        .collect()
        .unwrap();
    assert_eq!(long, vec![1, 3]);

    let teen = streamer
        .query()
        .filter(fields.rating.equal("PG-13".to_string()))
        .map_to_long(|f| f.id)
        .collect()
        .unwrap();
    assert_eq!(teen, vec![2]);
}

#[test]
fn test_limit_zero_yields_nothing_and_releases() {
    let fields = FilmFields::generated();
    let (streamer, source) = streamer(scenario_films());

    let none = streamer
        .query()
        .filter(fields.length.greater_than(120))
        .limit(0)
        .map_to_long(|f| f.id)
        .collect()
        .unwrap();
    assert!(none.is_empty());
    assert_eq!(streamer.query().limit(0).count().unwrap(), 0);
    assert!(streamer.query().limit(0).find_first().unwrap().is_none());
    assert!(source.is_balanced());
}

#[test]
fn test_sorted_union_is_deterministic_in_parallel() {
    let fields = FilmFields::generated();
    let (streamer, source) = streamer(scenario_films());
    let long = fields.length.greater_than(120);
    let teen = fields.rating.equal("PG-13".to_string());

    let ids = streamer
        .query()
        .parallel()
        .filter(move |f: &Film| long.test(f) || teen.test(f))
        .sorted_by(fields.id.comparator())
        .map_to_long(|f| f.id)
        .collect()
        .unwrap();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(source.is_balanced());
}

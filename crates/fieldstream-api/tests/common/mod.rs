//! Shared fixtures: a film entity, its field table and sample rows.

#![allow(dead_code)]

use fieldstream::{Field, InMemorySource, NullOrder, Streamer};

#[derive(Debug, Clone, PartialEq)]
pub struct Film {
    pub id: i64,
    pub title: String,
    pub length: i32,
    pub rating: String,
    pub rental_rate: f64,
    pub original_language: Option<i64>,
}

impl Film {
    pub fn new(id: i64, length: i32, rating: &str) -> Self {
        Self {
            id,
            title: format!("FILM {}", id),
            length,
            rating: rating.to_string(),
            rental_rate: 0.99 + id as f64,
            original_language: if id % 2 == 0 { Some(id % 3) } else { None },
        }
    }
}

/// The field table a generator would emit for `Film`.
pub struct FilmFields {
    pub id: Field<Film, i64>,
    pub title: Field<Film, String>,
    pub length: Field<Film, i32>,
    pub rating: Field<Film, String>,
    pub rental_rate: Field<Film, f64>,
    pub original_language: Field<Film, i64>,
}

impl FilmFields {
    pub fn generated() -> Self {
        Self {
            id: Field::builder("film", "film_id")
                .getter(|f: &Film| f.id)
                .unique(true)
                .build()
                .unwrap(),
            title: Field::new("film", "title", |f: &Film| f.title.clone()).unwrap(),
            length: Field::new("film", "length", |f: &Film| f.length).unwrap(),
            rating: Field::new("film", "rating", |f: &Film| f.rating.clone()).unwrap(),
            rental_rate: Field::new("film", "rental_rate", |f: &Film| f.rental_rate).unwrap(),
            original_language: Field::builder("film", "original_language_id")
                .nullable_getter(|f: &Film| f.original_language)
                .null_order(NullOrder::First)
                .build()
                .unwrap(),
        }
    }
}

/// The three films of the union scenario.
pub fn scenario_films() -> Vec<Film> {
    vec![
        Film::new(1, 130, "PG"),
        Film::new(2, 90, "PG-13"),
        Film::new(3, 150, "R"),
    ]
}

/// A larger, unsorted catalogue.
pub fn catalogue() -> Vec<Film> {
    let ratings = ["G", "PG", "PG-13", "R", "NC-17"];
    (1..=40)
        .map(|i| {
            let id = (i * 17) % 41;
            Film::new(id, 45 + ((id * 37) % 140) as i32, ratings[(id % 5) as usize])
        })
        .collect()
}

pub fn streamer(films: Vec<Film>) -> (Streamer<Film>, InMemorySource<Film>) {
    let source = InMemorySource::new(films);
    (Streamer::new(source.clone()), source)
}

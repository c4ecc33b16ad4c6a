/// Film Query Demo
///
/// Builds typed queries over an in-memory film table and shows the
/// recorded pipelines behind them.
use fieldstream::{Field, InMemorySource, Inclusion, NullOrder, Streamer};

#[derive(Debug, Clone, PartialEq)]
struct Film {
    id: i64,
    title: String,
    length: i32,
    rating: String,
    language: Option<i64>,
}

fn film(id: i64, title: &str, length: i32, rating: &str, language: Option<i64>) -> Film {
    Film {
        id,
        title: title.to_string(),
        length,
        rating: rating.to_string(),
        language,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== fieldstream Film Query Demo ===\n");

    let id = Field::builder("film", "film_id")
        .getter(|f: &Film| f.id)
        .unique(true)
        .build()?;
    let title = Field::new("film", "title", |f: &Film| f.title.clone())?;
    let length = Field::new("film", "length", |f: &Film| f.length)?;
    let rating = Field::new("film", "rating", |f: &Film| f.rating.clone())?;
    let language = Field::builder("film", "original_language_id")
        .nullable_getter(|f: &Film| f.language)
        .null_order(NullOrder::First)
        .build()?;

    let source = InMemorySource::new(vec![
        film(4, "ACE GOLDFINGER", 48, "G", Some(1)),
        film(1, "ACADEMY DINOSAUR", 130, "PG", None),
        film(3, "ADAPTATION HOLES", 150, "R", Some(2)),
        film(2, "ACE OF SPADES", 90, "PG-13", None),
        film(5, "AFFAIR PREJUDICE", 117, "G", Some(1)),
    ]);
    let streamer = Streamer::new(source.clone());

    println!("1. Long films, by id:");
    let long = streamer
        .query()
        .filter(length.greater_than(120))
        .sorted_by(id.comparator());
    println!("   {}", long.pipeline());
    for f in long.collect()? {
        println!("   {:>2} {:<20} {} min", f.id, f.title, f.length);
    }

    println!("\n2. Feature-length titles, longest first:");
    let titles = streamer
        .query()
        .filter(length.between(90, 150, Inclusion::Closed))
        .sorted_by(length.reversed())
        .map(|f: Film| f.title)
        .collect()?;
    println!("   {:?}", titles);

    println!("\n3. Ratings other than G and PG:");
    let count = streamer
        .query()
        .filter(rating.not_in(vec!["G".to_string(), "PG".to_string()]))
        .count()?;
    println!("   {} films", count);

    println!("\n4. Languages, nulls first:");
    let languages = streamer
        .query()
        .sorted_by(language.comparator())
        .map(|f: Film| (f.id, f.language))
        .collect()?;
    println!("   {:?}", languages);

    println!("\n5. Length statistics:");
    let stats = streamer.query().map_to_int(|f| f.length).statistics()?;
    println!(
        "   count={} min={:?} max={:?} avg={:?}",
        stats.count(),
        stats.min(),
        stats.max(),
        stats.average()
    );

    println!("\n6. First title starting with 'ACE':");
    let ace = streamer
        .query()
        .sorted_by(title.comparator())
        .filter(|f: &Film| f.title.starts_with("ACE"))
        .find_first()?;
    println!("   {:?}", ace.map(|f| f.title));

    println!(
        "\nSource opened {} times, released {} times",
        source.opened(),
        source.released()
    );
    println!("\n=== Demo Complete ===");

    Ok(())
}

use fieldstream::logging::LogConfig;
use fieldstream::{Field, InMemorySource, Streamer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Trace level shows every stage as it is appended and wrapped
    let _guard = LogConfig::trace().init()?;

    println!("=== fieldstream Logging Demo ===\n");

    let length = Field::new("film", "length", |f: &(i64, i32)| f.1)?;
    let streamer = Streamer::new(InMemorySource::new(vec![(1i64, 130), (2, 90), (3, 150)]));

    println!("\n1. Recorded query...");
    let ids = streamer
        .query()
        .filter(length.greater_than(100))
        .map_to_long(|f| f.0)
        .collect()?;
    println!("Found: {:?}", ids);

    println!("\n2. Raw stream...");
    let total = streamer.stream()?.map_to_int(|f| f.1).sum()?;
    println!("Total length: {}", total);

    println!("\n3. Explicit close...");
    let stream = streamer.stream()?;
    stream.close()?;
    stream.close()?;

    println!("\n=== Demo Complete ===");
    println!("Check the logs above to see tracing output!");

    Ok(())
}

/// Escape Hatch Demo
///
/// Shows how a stream releases its cursor on every terminal operation,
/// and what changes once iterator escape is allowed.
use fieldstream::{InMemorySource, Streamer, StreamerConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== fieldstream Escape Hatch Demo ===\n");

    let source = InMemorySource::new((1..=10i64).collect::<Vec<_>>());
    let streamer = Streamer::new(source.clone());

    println!("1. Terminal operations release the cursor:");
    let total = streamer.stream()?.filter(|v| v % 2 == 0).sum()?;
    println!("   sum of evens = {}", total);
    println!("   released = {}", source.released());

    println!("\n2. Escaping is refused by default:");
    let mut stream = streamer.stream()?;
    match stream.iterator() {
        Ok(_) => println!("   unexpected: iterator handed out"),
        Err(e) => println!("   {}", e),
    }
    println!("   stream still usable: count = {}", stream.count()?);

    println!("\n3. With escape allowed, the caller owns the cursor:");
    let streamer = streamer.with_config(StreamerConfig::new().with_iterator_escape(true));
    let mut stream = streamer.stream()?.map(|v| v * v);
    let mut cursor = stream.iterator()?;
    println!("   stream closed = {}", stream.is_closed());
    let first: Vec<i64> = cursor.by_ref().take(3).collect();
    println!("   first squares = {:?}", first);
    println!("   released before close = {}", source.released());
    cursor.close()?;
    println!("   released after close = {}", source.released());

    println!("\n4. Splitting a cursor into batches:");
    let mut cursor = streamer.stream()?.spliterator()?;
    while let Some(batch) = cursor.try_split() {
        println!("   batch of {}", batch.len());
    }
    drop(cursor);

    println!(
        "\nSource opened {} times, released {} times",
        source.opened(),
        source.released()
    );
    println!("\n=== Demo Complete ===");

    Ok(())
}

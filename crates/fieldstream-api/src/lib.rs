//! # fieldstream
//!
//! Typed, column-aware query pipelines over closable entity sources.
//!
//! Queries are composed from [`Field`]s, which produce predicates and
//! comparators without reflection or string building. A query is recorded
//! as a [`Pipeline`], passed through a [`TerminalOperationOptimizer`],
//! realized by an [`ExecutionAdapter`] and consumed through an
//! [`AutoClosingStream`], which releases the source's resource exactly
//! once however the terminal operation ends.
//!
//! ## Quick Start
//!
//! ```rust
//! use fieldstream::{Field, InMemorySource, Streamer};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Film {
//!     id: i64,
//!     length: i32,
//!     rating: String,
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let id = Field::new("film", "film_id", |f: &Film| f.id)?;
//!     let length = Field::new("film", "length", |f: &Film| f.length)?;
//!
//!     let source = InMemorySource::new(vec![
//!         Film { id: 3, length: 150, rating: "R".into() },
//!         Film { id: 1, length: 130, rating: "PG".into() },
//!         Film { id: 2, length: 90, rating: "PG-13".into() },
//!     ]);
//!     let streamer = Streamer::new(source.clone());
//!
//!     let long_films = streamer
//!         .query()
//!         .filter(length.greater_than(120))
//!         .sorted_by(id.comparator())
//!         .map_to_long(|f| f.id)
//!         .collect()?;
//!     assert_eq!(long_films, vec![1, 3]);
//!
//!     // The cursor behind the query has been released.
//!     assert!(source.is_balanced());
//!     Ok(())
//! }
//! ```
//!
//! ## Raw streams
//!
//! [`Streamer::stream`] hands out the [`AutoClosingStream`] directly, for
//! closures that need not be recorded in a pipeline:
//!
//! ```rust
//! use fieldstream::{InMemorySource, Streamer};
//!
//! let streamer = Streamer::new(InMemorySource::new(1..=4i32));
//! let total = streamer.stream()?.map(|v| v * 10).sum()?;
//! assert_eq!(total, 100);
//! # Ok::<(), fieldstream::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
mod fault;
pub mod logging;
pub mod query;
pub mod source;
pub mod streamer;
pub mod terminal;

mod config;

// Re-export core types
pub use fieldstream_core::{
    BoxError, ComparatorDescriptor, Direction, Element, EntityComparator, EntityPredicate, Error,
    Field, FieldBuilder, FieldComparator, FieldPredicate, Inclusion, Lane, LaneNumber, NullOrder,
    Numeric, Orderable, PredicateDescriptor, PredicateKind, Result, SummaryStatistics,
};

// Pipeline components
pub use fieldstream_pipeline::{
    IntermediateOperation, PassThroughOptimizer, Pipeline, PipelineDescription, StageDescription,
    TerminalOperation, TerminalOperationOptimizer,
};

// Auto-closing decorator
pub use fieldstream_autoclose::{
    AutoCloseConfig, AutoClosingStream, ClosableSequence, RawCursor, Resource, ResourceHandle,
};

pub use adapter::{ExecutionAdapter, LocalAdapter};
pub use config::StreamerConfig;
pub use query::QueryStream;
pub use source::{InMemorySource, SequenceSource};
pub use streamer::Streamer;
pub use terminal::TerminalValue;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

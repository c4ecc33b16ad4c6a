//! # fieldstream autoclose
//!
//! A stream decorator that releases the resource behind a lazy sequence
//! exactly once: when a terminal operation completes, fails or panics, on
//! an explicit [`AutoClosingStream::close`], or when the stream is dropped.
//!
//! ```
//! use fieldstream_autoclose::{AutoCloseConfig, AutoClosingStream};
//! use fieldstream_core::BoxError;
//!
//! let stream = AutoClosingStream::over(
//!     vec![3, 1, 2],
//!     || -> Result<(), BoxError> { Ok(()) },
//!     AutoCloseConfig::default(),
//! );
//! assert_eq!(stream.sorted().to_vec().unwrap(), vec![1, 2, 3]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod cursor;
pub mod iter;
pub mod numeric;
pub mod resource;
pub mod sequence;
pub mod stream;

pub use config::AutoCloseConfig;
pub use cursor::RawCursor;
pub use iter::Deferred;
pub use resource::{Resource, ResourceHandle};
pub use sequence::{BoxIter, ClosableSequence};
pub use stream::AutoClosingStream;

//! Sources of closable entity sequences.

use fieldstream_autoclose::ClosableSequence;
use fieldstream_core::{BoxError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Opens a lazily pulled, single-traversal sequence of `E` together with
/// the resource that must be released once it is no longer consumed.
///
/// Every call to [`SequenceSource::open`] acquires a fresh resource.
pub trait SequenceSource<E>: Send + Sync {
    /// Opens a new sequence.
    fn open(&self) -> Result<ClosableSequence<E>>;
}

impl<E, F> SequenceSource<E> for F
where
    F: Fn() -> Result<ClosableSequence<E>> + Send + Sync,
{
    fn open(&self) -> Result<ClosableSequence<E>> {
        self()
    }
}

/// A source over rows held in memory that counts how often its
/// "cursor" is opened and released.
#[derive(Clone)]
pub struct InMemorySource<E> {
    rows: Arc<Vec<E>>,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    release_failure: Option<String>,
}

impl<E: Clone + Send + Sync + 'static> InMemorySource<E> {
    /// A source yielding clones of `rows`, in order.
    pub fn new(rows: impl IntoIterator<Item = E>) -> Self {
        Self {
            rows: Arc::new(rows.into_iter().collect()),
            opened: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
            release_failure: None,
        }
    }

    /// Makes every release fail with `message` (after counting it).
    pub fn failing_release(mut self, message: impl Into<String>) -> Self {
        self.release_failure = Some(message.into());
        self
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// How many sequences have been opened.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// How many sequences have been released.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Whether every opened sequence has been released exactly once.
    pub fn is_balanced(&self) -> bool {
        self.opened() == self.released()
    }
}

impl<E: Clone + Send + Sync + 'static> SequenceSource<E> for InMemorySource<E> {
    fn open(&self) -> Result<ClosableSequence<E>> {
        let cursor = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(cursor, rows = self.rows.len(), "opening in-memory cursor");

        let rows = Arc::clone(&self.rows);
        let iter = (0..rows.len()).map(move |i| rows[i].clone());

        let released = Arc::clone(&self.released);
        let failure = self.release_failure.clone();
        let release = move || -> std::result::Result<(), BoxError> {
            released.fetch_add(1, Ordering::SeqCst);
            debug!(cursor, "releasing in-memory cursor");
            match &failure {
                Some(message) => Err(message.clone().into()),
                None => Ok(()),
            }
        };
        Ok(ClosableSequence::new(iter, release))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_release_counted() {
        let source = InMemorySource::new(vec![1, 2, 3]);
        let seq = source.open().unwrap();
        assert_eq!(source.opened(), 1);
        assert_eq!(source.released(), 0);

        let (iter, handle) = seq.into_parts();
        assert_eq!(iter.collect::<Vec<_>>(), vec![1, 2, 3]);
        handle.close().unwrap();
        handle.close().unwrap();
        assert_eq!(source.released(), 1);
        assert!(source.is_balanced());
    }

    #[test]
    fn test_failing_release() {
        let source = InMemorySource::new(vec!["a"]).failing_release("socket reset");
        let seq = source.open().unwrap();
        let err = seq.handle().close().unwrap_err();
        assert!(err.to_string().contains("socket reset"));
        assert_eq!(source.released(), 1);
    }

    #[test]
    fn test_closure_source() {
        let source = || -> Result<ClosableSequence<u8>> { Ok(ClosableSequence::unmanaged(0..3u8)) };
        let (iter, _) = SequenceSource::open(&source).unwrap().into_parts();
        assert_eq!(iter.count(), 3);
    }
}

//! Raw pull cursors handed out by the escape hatch.

use crate::resource::ResourceHandle;
use crate::sequence::BoxIter;
use fieldstream_core::Result;
use std::fmt;

const BATCH_UNIT: usize = 1 << 10;
const MAX_BATCH: usize = 1 << 25;

/// A raw cursor over the remaining elements of a stream.
///
/// The cursor owns the stream's resource. Releasing it is the caller's
/// job: call [`RawCursor::close`], or drop the cursor. Once closed the
/// cursor yields nothing more.
pub struct RawCursor<T> {
    iter: BoxIter<T>,
    handle: ResourceHandle,
    batch: usize,
}

impl<T: Send + 'static> RawCursor<T> {
    pub(crate) fn new(iter: BoxIter<T>, handle: ResourceHandle) -> Self {
        Self {
            iter,
            handle,
            batch: 0,
        }
    }

    /// Releases the resource. Idempotent.
    pub fn close(&self) -> Result<()> {
        self.handle.close()
    }

    /// Whether the resource has been released.
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Upper bound on the remaining elements, if known.
    pub fn estimate_size(&self) -> Option<usize> {
        self.iter.size_hint().1
    }

    /// Pulls a prefix of the remaining elements into a batch that can be
    /// processed independently. Batches grow on every call. `None` once
    /// the cursor is exhausted or closed.
    pub fn try_split(&mut self) -> Option<std::vec::IntoIter<T>> {
        if self.is_closed() {
            return None;
        }
        self.batch = (self.batch + BATCH_UNIT).min(MAX_BATCH);
        let batch: Vec<T> = self.iter.by_ref().take(self.batch).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch.into_iter())
        }
    }
}

impl<T> Iterator for RawCursor<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.handle.is_closed() {
            return None;
        }
        self.iter.next()
    }
}

impl<T> fmt::Debug for RawCursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCursor")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

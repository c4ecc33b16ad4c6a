//! Lazily pulled sequences paired with the resource behind them.

use crate::resource::{Resource, ResourceHandle};
use std::fmt;

/// A boxed, sendable iterator.
pub type BoxIter<T> = Box<dyn Iterator<Item = T> + Send>;

/// A single-traversal lazy sequence that owns a closable resource.
///
/// This is what sources hand to execution adapters and what adapters
/// hand back, transformed, for wrapping in an
/// [`AutoClosingStream`](crate::AutoClosingStream).
pub struct ClosableSequence<T> {
    iter: BoxIter<T>,
    handle: ResourceHandle,
}

impl<T: Send + 'static> ClosableSequence<T> {
    /// A sequence over `iter` that releases `resource` when closed.
    pub fn new<I, R>(iter: I, resource: R) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
        R: Resource + 'static,
    {
        Self::from_parts(Box::new(iter.into_iter()), ResourceHandle::new(resource))
    }

    /// A sequence with nothing to release.
    pub fn unmanaged<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_parts(Box::new(iter.into_iter()), ResourceHandle::empty())
    }

    /// Reassembles a sequence from its iterator and handle.
    pub fn from_parts(iter: BoxIter<T>, handle: ResourceHandle) -> Self {
        Self { iter, handle }
    }

    /// Splits the sequence into its iterator and handle.
    pub fn into_parts(self) -> (BoxIter<T>, ResourceHandle) {
        (self.iter, self.handle)
    }

    /// Transforms the iterator, keeping the same handle.
    pub fn map_iter<U, F>(self, f: F) -> ClosableSequence<U>
    where
        F: FnOnce(BoxIter<T>) -> BoxIter<U>,
    {
        ClosableSequence {
            iter: f(self.iter),
            handle: self.handle,
        }
    }

    /// The close-tracking handle.
    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

impl<T> fmt::Debug for ClosableSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosableSequence")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

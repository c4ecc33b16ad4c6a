//! Capture of the first failure raised inside a lazily pulled sequence.

use fieldstream_core::{Element, Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared slot holding the first failure of a traversal.
///
/// Once a failure is recorded the slot stays tripped, even after the
/// error has been taken out, so every [`Shunt`] reading it stops pulling.
#[derive(Clone, Default)]
pub(crate) struct FaultSlot {
    inner: Arc<FaultInner>,
}

#[derive(Default)]
struct FaultInner {
    tripped: AtomicBool,
    error: Mutex<Option<Error>>,
}

impl FaultSlot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records `err` unless a failure is already held.
    pub(crate) fn record(&self, err: Error) {
        let mut slot = self.inner.error.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.inner.tripped.swap(true, Ordering::AcqRel) {
            *slot = Some(err);
        }
    }

    pub(crate) fn is_tripped(&self) -> bool {
        self.inner.tripped.load(Ordering::Acquire)
    }

    /// Takes the recorded failure, leaving the slot tripped.
    pub(crate) fn take(&self) -> Option<Error> {
        self.inner
            .error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Unwraps `Ok` items and ends the iteration at the first `Err`, which is
/// recorded in the slot.
pub(crate) struct Shunt<I> {
    iter: I,
    fault: FaultSlot,
}

impl<I> Shunt<I> {
    pub(crate) fn new(iter: I, fault: FaultSlot) -> Self {
        Self { iter, fault }
    }
}

impl<I, T> Iterator for Shunt<I>
where
    I: Iterator<Item = Result<T>>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.fault.is_tripped() {
            return None;
        }
        match self.iter.next()? {
            Ok(value) => Some(value),
            Err(err) => {
                self.fault.record(err);
                None
            }
        }
    }
}

/// Yields the elements of `iter` as `Ok`, then the recorded failure, if
/// any, as a final `Err`.
pub(crate) struct FaultTail<I> {
    iter: I,
    fault: Option<FaultSlot>,
}

impl<I> FaultTail<I> {
    pub(crate) fn new(iter: I, fault: FaultSlot) -> Self {
        Self {
            iter,
            fault: Some(fault),
        }
    }
}

impl<I> Iterator for FaultTail<I>
where
    I: Iterator<Item = Element>,
{
    type Item = Result<Element>;

    fn next(&mut self) -> Option<Result<Element>> {
        let fault = self.fault.as_ref()?;
        if !fault.is_tripped() {
            if let Some(element) = self.iter.next() {
                return Some(Ok(element));
            }
        }
        self.fault.take().and_then(|fault| fault.take()).map(Err)
    }
}

//! Iterator adapters shared by the stream stages.

/// An iterator built on first pull.
///
/// Used for stages that must see the whole input before yielding, such
/// as sorting, so that nothing is traversed until a terminal operation
/// pulls.
pub struct Deferred<F, I> {
    state: DeferredState<F, I>,
}

enum DeferredState<F, I> {
    Pending(F),
    Ready(I),
    Done,
}

impl<F, I> Deferred<F, I>
where
    F: FnOnce() -> I,
    I: Iterator,
{
    /// Defers `build` until the first call to `next`.
    pub fn new(build: F) -> Self {
        Self {
            state: DeferredState::Pending(build),
        }
    }
}

impl<F, I> Iterator for Deferred<F, I>
where
    F: FnOnce() -> I,
    I: Iterator,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if let DeferredState::Pending(_) = self.state {
            if let DeferredState::Pending(build) =
                std::mem::replace(&mut self.state, DeferredState::Done)
            {
                self.state = DeferredState::Ready(build());
            }
        }
        match &mut self.state {
            DeferredState::Ready(iter) => iter.next(),
            _ => None,
        }
    }
}

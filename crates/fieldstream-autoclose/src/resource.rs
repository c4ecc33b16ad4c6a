//! Exactly-once release of the resource behind a lazy sequence.

use fieldstream_core::{BoxError, Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Something that must be released once a sequence is no longer consumed,
/// such as a cursor or a connection.
pub trait Resource: Send {
    /// Releases the resource. Called at most once.
    fn release(&mut self) -> std::result::Result<(), BoxError>;
}

impl<F> Resource for F
where
    F: FnMut() -> std::result::Result<(), BoxError> + Send,
{
    fn release(&mut self) -> std::result::Result<(), BoxError> {
        self()
    }
}

/// Close-tracking owner of the resources behind one sequence.
///
/// The handle starts `OPEN` and moves to `CLOSED` exactly once, through an
/// atomic compare-and-set, so racing closers release nothing twice.
/// Resources are released in registration order. A handle that is dropped
/// while still open closes itself and logs release failures.
pub struct ResourceHandle {
    closed: AtomicBool,
    resources: Mutex<Vec<Box<dyn Resource>>>,
}

impl ResourceHandle {
    /// A handle owning `resource`.
    pub fn new<R: Resource + 'static>(resource: R) -> Self {
        let handle = Self::empty();
        handle.register(resource);
        handle
    }

    /// An open handle with nothing to release yet.
    pub fn empty() -> Self {
        Self {
            closed: AtomicBool::new(false),
            resources: Mutex::new(Vec::new()),
        }
    }

    /// A handle that is already closed and owns nothing.
    pub fn detached() -> Self {
        Self {
            closed: AtomicBool::new(true),
            resources: Mutex::new(Vec::new()),
        }
    }

    /// Adds a resource released after every previously registered one.
    ///
    /// Registering on a closed handle releases the resource immediately.
    pub fn register<R: Resource + 'static>(&self, resource: R) {
        self.register_boxed(Box::new(resource));
    }

    fn register_boxed(&self, mut resource: Box<dyn Resource>) {
        let mut resources = self.lock();
        if !self.is_closed() {
            resources.push(resource);
            return;
        }
        drop(resources);
        if let Err(err) = resource.release() {
            warn!(error = %err, "release of resource registered on a closed handle failed");
        }
    }

    /// Registers a hook that runs on close, after the resources registered
    /// before it.
    pub fn on_close<F: FnOnce() + Send + 'static>(&self, hook: F) {
        let mut hook = Some(hook);
        self.register(move || -> std::result::Result<(), BoxError> {
            if let Some(hook) = hook.take() {
                hook();
            }
            Ok(())
        });
    }

    /// Takes over everything `other` still has to release.
    pub fn absorb(&self, other: ResourceHandle) {
        let taken = std::mem::take(&mut *other.lock());
        other.closed.store(true, Ordering::Release);
        for resource in taken {
            self.register_boxed(resource);
        }
    }

    /// Whether the handle has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Moves to `CLOSED` and releases every resource.
    ///
    /// Idempotent: only the first call releases anything; later calls
    /// return `Ok(())`. All resources are released even if some fail; the
    /// failures are reported in order, the first one as primary.
    pub fn close(&self) -> Result<()> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let resources = std::mem::take(&mut *self.lock());
        debug!(resources = resources.len(), "closing resource handle");

        let mut failure: Option<Error> = None;
        for mut resource in resources {
            if let Err(err) = resource.release() {
                let err = Error::release(err);
                failure = Some(match failure {
                    None => err,
                    Some(previous) => Error::chain(previous, err),
                });
            }
        }
        match failure {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Box<dyn Resource>>> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResourceHandle {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        if self.is_closed() {
            return;
        }
        if std::thread::panicking() {
            debug!("closing resource handle during unwinding");
        }
        if let Err(err) = self.close() {
            warn!(error = %err, "resource release failed while dropping an open handle");
        }
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("closed", &self.is_closed())
            .field("pending", &self.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counting(counter: &Arc<AtomicUsize>) -> impl Resource + 'static {
        let counter = Arc::clone(counter);
        move || -> std::result::Result<(), BoxError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_close_is_idempotent() {
        let released = Arc::new(AtomicUsize::new(0));
        let handle = ResourceHandle::new(counting(&released));
        assert!(!handle.is_closed());
        handle.close().unwrap();
        handle.close().unwrap();
        assert!(handle.is_closed());
        assert_eq!(released.load(Ordering::SeqCst), 1);
        drop(handle);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_closes_open_handle() {
        let released = Arc::new(AtomicUsize::new(0));
        drop(ResourceHandle::new(counting(&released)));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_racing_closers_release_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let handle = Arc::new(ResourceHandle::new(counting(&released)));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || handle.close().unwrap())
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_every_resource_released_despite_failures() {
        let released = Arc::new(AtomicUsize::new(0));
        let handle = ResourceHandle::empty();
        handle.register(|| -> std::result::Result<(), BoxError> { Err("first".into()) });
        handle.register(counting(&released));
        handle.register(|| -> std::result::Result<(), BoxError> { Err("second".into()) });

        let err = handle.close().unwrap_err();
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(err.primary().to_string().contains("first"));
        assert!(err.secondary().unwrap().to_string().contains("second"));
    }

    #[test]
    fn test_absorb_and_hooks() {
        let released = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));
        let left = ResourceHandle::new(counting(&released));
        let right = ResourceHandle::new(counting(&released));
        let log = Arc::clone(&order);
        right.on_close(move || log.lock().unwrap().push("right hook"));
        left.absorb(right);
        let log = Arc::clone(&order);
        left.on_close(move || log.lock().unwrap().push("left hook"));

        left.close().unwrap();
        assert_eq!(released.load(Ordering::SeqCst), 2);
        assert_eq!(*order.lock().unwrap(), vec!["right hook", "left hook"]);
    }

    #[test]
    fn test_detached_handle() {
        let handle = ResourceHandle::detached();
        assert!(handle.is_closed());
        assert!(handle.close().is_ok());
    }
}

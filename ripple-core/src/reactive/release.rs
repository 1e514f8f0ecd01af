//! Release handles.
//!
//! Subscribing to anything in this crate hands back a [`Release`]. Calling
//! [`Release::release`] tears the subscription down. The handle is cheap to
//! clone and every clone shares the same teardown, which runs at most once.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

type Teardown = Box<dyn FnOnce() + Send>;

/// Idempotent handle that ends a subscription.
#[derive(Clone)]
pub struct Release {
    teardown: Arc<Mutex<Option<Teardown>>>,
}

impl Release {
    /// Create a handle that runs `teardown` on first release.
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            teardown: Arc::new(Mutex::new(Some(Box::new(teardown)))),
        }
    }

    /// A handle with nothing to tear down. Starts out released.
    pub fn noop() -> Self {
        Self {
            teardown: Arc::new(Mutex::new(None)),
        }
    }

    /// End the subscription. Calling this again (from any clone) is a no-op.
    pub fn release(&self) {
        // Take first so the teardown runs without the lock held; it may
        // re-enter the observable that issued this handle.
        let teardown = self.teardown.lock().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    /// Whether the teardown has already run.
    pub fn is_released(&self) -> bool {
        self.teardown.lock().is_none()
    }
}

impl fmt::Debug for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Release")
            .field("released", &self.is_released())
            .finish()
    }
}

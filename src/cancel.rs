use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

//===========================================================================//

/// A cooperative cancellation flag.  Clones share the same flag, so one can
/// be handed to a batch while the caller keeps another to cancel it.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that has not been cancelled.
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    /// Requests cancellation.  Work already in progress notices the request
    /// at its next checkpoint.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once `cancel` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

//===========================================================================//


//===========================================================================//

//! Subscriber state for ring buffer streaming
//!
//! Each subscriber tracks:
//! - Unique ID for the subscription
//! - Callback invoked once per delivered item
//! - Absolute read position (never decreases except on a hard clear)
//! - Handle of the pending delivery, cancelled when a newer one is scheduled

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::AbortHandle;

/// Subscription identifier
pub type SubscriptionId = u64;

/// Counter for generating unique subscription IDs
static SUBSCRIPTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Item callback
pub(crate) type Callback<T> = Arc<dyn Fn(Arc<T>) + Send + Sync>;

/// A scheduled, not yet run delivery pass
pub(crate) struct PendingDelivery {
    /// Ticket of the scheduled pass
    pub ticket: u64,
    /// Handle to cancel the task
    pub handle: AbortHandle,
}

/// A single live subscriber
pub(crate) struct Subscriber<T> {
    /// Unique identifier
    id: SubscriptionId,
    /// Item callback
    callback: Callback<T>,
    /// Next position to deliver
    pub pos: u64,
    /// Ticket counter for scheduled passes
    next_ticket: u64,
    /// Outstanding delivery, if any
    pub pending: Option<PendingDelivery>,
}

impl<T> Subscriber<T> {
    /// Create a subscriber starting at `pos`
    pub fn new(callback: Callback<T>, pos: u64) -> Self {
        Self {
            id: SUBSCRIPTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            callback,
            pos,
            next_ticket: 0,
            pending: None,
        }
    }

    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Invoke the callback for one item
    #[inline]
    pub fn notify(&self, item: Arc<T>) {
        (self.callback)(item);
    }

    /// Cancel the outstanding delivery, if any
    pub fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }

    /// Take a ticket for a new delivery pass
    pub fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Forget the pending delivery if it is the one identified by `ticket`
    pub fn complete(&mut self, ticket: u64) {
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.ticket == ticket)
        {
            self.pending = None;
        }
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("pos", &self.pos)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

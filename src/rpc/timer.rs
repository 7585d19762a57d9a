//! Shared deadline timer.
//!
//! # Responsibilities
//! - Schedule one-shot deadlines for outstanding calls
//! - Release an entry as soon as its call resolves
//! - Report how many deadlines are still armed
//!
//! # Design Decisions
//! - Each entry is a Tokio task sleeping until its deadline, so a paused
//!   test clock drives expiry without real waiting
//! - Firing and cancelling both go through removal from the entry map;
//!   whichever removes the entry first decides, the other is a no-op
//! - One lazily created instance serves the whole process; independent
//!   instances can be constructed and injected

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::AbortHandle;

/// Armed entries. `None` until the spawned task's abort handle is recorded.
type Entries = DashMap<u64, Option<AbortHandle>>;

/// Scheduler for one-shot deadlines.
#[derive(Debug, Default)]
pub struct DeadlineTimer {
    entries: Arc<Entries>,
    next_id: AtomicU64,
}

impl DeadlineTimer {
    /// Create an independent timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide timer, created on first use and never torn down.
    pub fn shared() -> Arc<DeadlineTimer> {
        static SHARED: OnceLock<Arc<DeadlineTimer>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(DeadlineTimer::new())).clone()
    }

    /// Run `on_expire` after `after` unless the returned entry is cancelled first.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, after: Duration, on_expire: F) -> TimerEntry
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(id, None);

        let entries = self.entries.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if entries.remove(&id).is_some() {
                tracing::trace!(entry = id, "Deadline fired");
                on_expire();
            }
        });

        // The task may already have fired and removed its entry.
        if let Some(mut slot) = self.entries.get_mut(&id) {
            *slot = Some(task.abort_handle());
        }

        TimerEntry {
            id,
            entries: self.entries.clone(),
        }
    }

    /// Number of deadlines still armed.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }
}

/// Handle to one scheduled deadline.
#[derive(Debug)]
pub struct TimerEntry {
    id: u64,
    entries: Arc<Entries>,
}

impl TimerEntry {
    /// Disarm the deadline. Returns false if it already fired or was cancelled.
    pub fn cancel(&self) -> bool {
        match self.entries.remove(&self.id) {
            Some((_, handle)) => {
                if let Some(handle) = handle {
                    handle.abort();
                }
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.entries.contains_key(&self.id)
    }
}

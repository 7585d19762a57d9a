//! Single-use completion handle with a deadline.
//!
//! # State Transitions
//! ```text
//! Pending → Resolved: first of {resolve_success, resolve_failure, deadline}
//! Resolved → Resolved: every later attempt is a silent no-op
//! ```
//!
//! # Design Decisions
//! - One compare-and-set on the state decides the winner; only the winner
//!   touches the handler
//! - The deadline entry is released on every resolution path
//! - Timeout is reported with its own error kind

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::observability::metrics;
use crate::rpc::timer::{DeadlineTimer, TimerEntry};
use crate::rpc::types::{SdkError, SdkResult};

/// Deadline applied when the caller does not pick one.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Delivery behaviour for one call. Exactly one method runs, at most once.
pub trait Callback<T>: Send + 'static {
    fn on_success(self: Box<Self>, value: T);

    fn on_failed(self: Box<Self>, error: SdkError);
}

/// Resolution state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackState {
    Pending = 0,
    Resolved = 1,
}

impl From<u8> for CallbackState {
    fn from(val: u8) -> Self {
        match val {
            0 => CallbackState::Pending,
            _ => CallbackState::Resolved,
        }
    }
}

struct Inner<T> {
    state: AtomicU8,
    handler: Mutex<Option<Box<dyn Callback<T>>>>,
    deadline: Mutex<Option<TimerEntry>>,
}

/// Completion handle for one outstanding call.
///
/// Clones share the same state, so the transport and the deadline can each
/// hold one.
pub struct TimedCallback<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for TimedCallback<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> TimedCallback<T> {
    /// Arm a deadline of `timeout` on `timer` and wrap `handler`.
    pub fn new(timer: &DeadlineTimer, timeout: Duration, handler: Box<dyn Callback<T>>) -> Self {
        let callback = Self {
            inner: Arc::new(Inner {
                state: AtomicU8::new(CallbackState::Pending as u8),
                handler: Mutex::new(Some(handler)),
                deadline: Mutex::new(None),
            }),
        };

        let on_expire = callback.clone();
        let entry = timer.schedule(timeout, move || {
            if on_expire.resolve(Err(SdkError::timeout())) {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Call timed out");
            }
        });

        *lock(&callback.inner.deadline) = Some(entry);
        // Resolution may have raced ahead of storing the entry.
        if callback.is_resolved() {
            callback.release_deadline();
        }

        callback
    }

    /// Build from a pair of closures.
    pub fn from_fns<S, F>(timer: &DeadlineTimer, timeout: Duration, on_success: S, on_failed: F) -> Self
    where
        S: FnOnce(T) + Send + 'static,
        F: FnOnce(SdkError) + Send + 'static,
    {
        Self::new(timer, timeout, Box::new(FnCallback { on_success, on_failed }))
    }

    /// Build a callback whose single outcome is delivered on a channel.
    pub fn channel(timer: &DeadlineTimer, timeout: Duration) -> (Self, oneshot::Receiver<SdkResult<T>>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(timer, timeout, Box::new(tx)), rx)
    }

    /// Deliver a value. Returns false if the call was already resolved.
    pub fn resolve_success(&self, value: T) -> bool {
        self.resolve(Ok(value))
    }

    /// Deliver a failure. Returns false if the call was already resolved.
    pub fn resolve_failure(&self, error: SdkError) -> bool {
        self.resolve(Err(error))
    }

    /// Abandon the call; the handler sees a remote-call failure with `reason`.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        self.resolve(Err(SdkError::remote_call(reason)))
    }

    pub fn state(&self) -> CallbackState {
        CallbackState::from(self.inner.state.load(Ordering::Acquire))
    }

    pub fn is_resolved(&self) -> bool {
        self.state() == CallbackState::Resolved
    }

    fn resolve(&self, outcome: SdkResult<T>) -> bool {
        if self
            .inner
            .state
            .compare_exchange(
                CallbackState::Pending as u8,
                CallbackState::Resolved as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            tracing::trace!("Callback already resolved, ignoring");
            return false;
        }

        self.release_deadline();

        let handler = lock(&self.inner.handler).take();
        let Some(handler) = handler else {
            return true;
        };

        match outcome {
            Ok(value) => {
                metrics::record_callback_outcome("success");
                handler.on_success(value);
            }
            Err(error) => {
                metrics::record_callback_outcome(if error.is_timeout() { "timeout" } else { "failure" });
                handler.on_failed(error);
            }
        }
        true
    }

    fn release_deadline(&self) {
        if let Some(entry) = lock(&self.inner.deadline).take() {
            entry.cancel();
        }
    }
}

impl<T> std::fmt::Debug for TimedCallback<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCallback")
            .field("state", &CallbackState::from(self.inner.state.load(Ordering::Acquire)))
            .finish()
    }
}

fn lock<V>(mutex: &Mutex<V>) -> std::sync::MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct FnCallback<S, F> {
    on_success: S,
    on_failed: F,
}

impl<T, S, F> Callback<T> for FnCallback<S, F>
where
    S: FnOnce(T) + Send + 'static,
    F: FnOnce(SdkError) + Send + 'static,
{
    fn on_success(self: Box<Self>, value: T) {
        (self.on_success)(value)
    }

    fn on_failed(self: Box<Self>, error: SdkError) {
        (self.on_failed)(error)
    }
}

impl<T: Send + 'static> Callback<T> for oneshot::Sender<SdkResult<T>> {
    fn on_success(self: Box<Self>, value: T) {
        let _ = (*self).send(Ok(value));
    }

    fn on_failed(self: Box<Self>, error: SdkError) {
        let _ = (*self).send(Err(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counts {
        success: AtomicUsize,
        failed: AtomicUsize,
        timeouts: AtomicUsize,
    }

    impl Counts {
        fn total(&self) -> usize {
            self.success.load(Ordering::SeqCst) + self.failed.load(Ordering::SeqCst)
        }
    }

    /// Wait for the first notification, then give a second one time to show up.
    async fn settle(counts: &Counts) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        while counts.total() == 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    fn counting(timer: &DeadlineTimer, timeout: Duration, counts: &Arc<Counts>) -> TimedCallback<u32> {
        let on_ok = counts.clone();
        let on_err = counts.clone();
        TimedCallback::from_fns(
            timer,
            timeout,
            move |_| {
                on_ok.success.fetch_add(1, Ordering::SeqCst);
            },
            move |e: SdkError| {
                if e.is_timeout() {
                    on_err.timeouts.fetch_add(1, Ordering::SeqCst);
                }
                on_err.failed.fetch_add(1, Ordering::SeqCst);
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_cancels_deadline() {
        let timer = DeadlineTimer::new();
        let counts = Arc::new(Counts::default());
        let cb = counting(&timer, DEFAULT_CALLBACK_TIMEOUT, &counts);
        assert_eq!(timer.pending(), 1);
        assert_eq!(cb.state(), CallbackState::Pending);

        assert!(cb.resolve_success(7));
        assert_eq!(timer.pending(), 0);
        assert!(cb.is_resolved());

        tokio::time::sleep(DEFAULT_CALLBACK_TIMEOUT * 2).await;
        assert_eq!(counts.success.load(Ordering::SeqCst), 1);
        assert_eq!(counts.timeouts.load(Ordering::SeqCst), 0);
        assert_eq!(counts.total(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_resolution_is_noop() {
        let timer = DeadlineTimer::new();
        let counts = Arc::new(Counts::default());
        let cb = counting(&timer, DEFAULT_CALLBACK_TIMEOUT, &counts);

        assert!(cb.resolve_failure(SdkError::remote_call("refused")));
        assert!(!cb.resolve_success(1));
        assert!(!cb.resolve_failure(SdkError::remote_call("again")));
        assert!(!cb.cancel("too late"));

        assert_eq!(counts.failed.load(Ordering::SeqCst), 1);
        assert_eq!(counts.total(), 1);
        assert_eq!(timer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_call_times_out() {
        let timer = DeadlineTimer::new();
        let (cb, rx) = TimedCallback::<String>::channel(&timer, DEFAULT_CALLBACK_TIMEOUT);

        let started = tokio::time::Instant::now();
        let err = rx.await.unwrap().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.message(), Some("Timeout"));
        assert!(started.elapsed() >= DEFAULT_CALLBACK_TIMEOUT);

        assert!(cb.is_resolved());
        assert!(!cb.resolve_success("late".into()));
        assert_eq!(timer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_goes_through_failure_path() {
        let timer = DeadlineTimer::new();
        let (cb, rx) = TimedCallback::<String>::channel(&timer, DEFAULT_CALLBACK_TIMEOUT);

        assert!(cb.cancel("caller gave up"));
        let err = rx.await.unwrap().unwrap_err();
        assert!(!err.is_timeout());
        assert_eq!(err.message(), Some("caller gave up"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_success_and_deadline_race() {
        let timer = Arc::new(DeadlineTimer::new());

        for _ in 0..200 {
            let counts = Arc::new(Counts::default());
            let cb = counting(&timer, Duration::from_millis(1), &counts);

            let racer = cb.clone();
            let delay = Duration::from_micros(fastrand::u64(0..1_500));
            let thread = std::thread::spawn(move || {
                std::thread::sleep(delay);
                racer.resolve_success(1);
            });
            thread.join().unwrap();

            settle(&counts).await;
            assert_eq!(counts.total(), 1, "exactly one notification per call");
            assert!(cb.is_resolved());
        }
        assert_eq!(timer.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_three_way_race() {
        let timer = Arc::new(DeadlineTimer::new());

        for _ in 0..100 {
            let counts = Arc::new(Counts::default());
            let cb = counting(&timer, Duration::from_millis(1), &counts);

            let threads: Vec<_> = (0..2)
                .map(|i| {
                    let racer = cb.clone();
                    let delay = Duration::from_micros(fastrand::u64(0..1_200));
                    std::thread::spawn(move || {
                        std::thread::sleep(delay);
                        if i == 0 {
                            racer.resolve_success(1);
                        } else {
                            racer.resolve_failure(SdkError::remote_call("refused"));
                        }
                    })
                })
                .collect();
            for t in threads {
                t.join().unwrap();
            }

            settle(&counts).await;
            assert_eq!(counts.total(), 1);
        }
        assert_eq!(timer.pending(), 0);
    }
}

//! One-shot deadline and cancellation signal.
//!
//! A [`DeadlineSignal`] starts active and moves to expired exactly once,
//! either because its deadline passed or because someone called
//! [`DeadlineSignal::cancel`]. The first transition fixes the
//! [`ExpiryCause`]; every clone observes the same cause afterwards.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Why a [`DeadlineSignal`] expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpiryCause {
    /// `cancel` was called before the deadline passed.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for ExpiryCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryCause::Cancelled => write!(f, "context cancelled"),
            ExpiryCause::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Shared, one-way deadline signal.
///
/// Cloning is cheap and every clone refers to the same state, so a handler
/// can pass the signal to helper threads and all of them see one deadline.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use request_scope::{DeadlineSignal, ExpiryCause};
///
/// let signal = DeadlineSignal::new(Duration::from_secs(60));
/// assert!(!signal.is_expired());
///
/// assert!(signal.cancel());
/// assert!(!signal.cancel()); // already expired
/// assert_eq!(signal.cause(), Some(ExpiryCause::Cancelled));
/// ```
#[derive(Clone)]
pub struct DeadlineSignal {
    inner: Arc<SignalState>,
}

struct SignalState {
    /// `None` when the timeout overflowed `Instant`; such a signal only
    /// expires through `cancel`.
    deadline: Option<Instant>,
    /// Fast path for `is_expired`; set after `cause` is written.
    expired: AtomicBool,
    cause: Mutex<Option<ExpiryCause>>,
    wakeup: Condvar,
}

impl DeadlineSignal {
    /// Creates a signal that expires `timeout` from now.
    pub fn new(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now().checked_add(timeout))
    }

    fn with_deadline(deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(SignalState {
                deadline,
                expired: AtomicBool::new(false),
                cause: Mutex::new(None),
                wakeup: Condvar::new(),
            }),
        }
    }

    /// Returns the instant at which the signal expires on its own.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Returns `true` once the signal has expired.
    ///
    /// Observing a passed deadline latches the expiry, so a later `cancel`
    /// cannot change the recorded cause.
    pub fn is_expired(&self) -> bool {
        if self.inner.expired.load(Ordering::Acquire) {
            return true;
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.expire(ExpiryCause::DeadlineExceeded);
                true
            }
            _ => false,
        }
    }

    /// Returns why the signal expired, or `None` while it is still active.
    pub fn cause(&self) -> Option<ExpiryCause> {
        if !self.is_expired() {
            return None;
        }
        *self.inner.cause.lock()
    }

    /// Expires the signal immediately.
    ///
    /// Returns `true` only for the call that performed the transition;
    /// calls on an already expired signal do nothing and return `false`.
    pub fn cancel(&self) -> bool {
        self.expire(ExpiryCause::Cancelled)
    }

    /// Time left before the deadline; zero once expired.
    ///
    /// Returns `Duration::MAX` for a signal without a representable deadline.
    pub fn remaining(&self) -> Duration {
        if self.is_expired() {
            return Duration::ZERO;
        }
        match self.inner.deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => Duration::MAX,
        }
    }

    /// Blocks the calling thread until the signal expires.
    pub fn wait(&self) -> ExpiryCause {
        let mut cause = self.inner.cause.lock();
        loop {
            if let Some(cause) = *cause {
                return cause;
            }
            match self.inner.deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    return self.latch(&mut cause, ExpiryCause::DeadlineExceeded);
                }
                Some(deadline) => {
                    self.inner.wakeup.wait_until(&mut cause, deadline);
                }
                None => self.inner.wakeup.wait(&mut cause),
            }
        }
    }

    /// Blocks for at most `timeout` waiting for the signal to expire.
    ///
    /// Returns the cause if the signal expired in time, `None` otherwise.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<ExpiryCause> {
        let limit = Instant::now().checked_add(timeout);
        let mut cause = self.inner.cause.lock();
        loop {
            if let Some(cause) = *cause {
                return Some(cause);
            }
            let now = Instant::now();
            if self.inner.deadline.is_some_and(|deadline| now >= deadline) {
                return Some(self.latch(&mut cause, ExpiryCause::DeadlineExceeded));
            }
            if limit.is_some_and(|limit| now >= limit) {
                return None;
            }
            let wake_at = match (self.inner.deadline, limit) {
                (Some(deadline), Some(limit)) => Some(deadline.min(limit)),
                (deadline, limit) => deadline.or(limit),
            };
            match wake_at {
                Some(at) => {
                    self.inner.wakeup.wait_until(&mut cause, at);
                }
                None => self.inner.wakeup.wait(&mut cause),
            }
        }
    }

    fn expire(&self, cause: ExpiryCause) -> bool {
        let mut slot = self.inner.cause.lock();
        if slot.is_some() {
            return false;
        }
        self.latch(&mut slot, cause);
        true
    }

    /// Records `cause` and wakes every waiter. Caller holds the cause lock.
    fn latch(&self, slot: &mut Option<ExpiryCause>, cause: ExpiryCause) -> ExpiryCause {
        *slot = Some(cause);
        self.inner.expired.store(true, Ordering::Release);
        self.inner.wakeup.notify_all();
        tracing::trace!(%cause, "deadline signal expired");
        cause
    }
}

impl fmt::Debug for DeadlineSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineSignal")
            .field("deadline", &self.inner.deadline)
            .field("cause", &self.cause())
            .finish()
    }
}

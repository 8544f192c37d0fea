use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ContextConfig;
use crate::deadline::{DeadlineSignal, ExpiryCause};
use crate::store::{Key, KeyStore, StoredValue};

/// Per-request execution context.
///
/// A `RequestContext` carries two things for one inbound request:
/// - a [`DeadlineSignal`] that expires a fixed time after construction or
///   when [`cancel`](Self::cancel) is called, whichever comes first
/// - a key/value bag for request-derived data (identity, trace ids,
///   parsed parameters) guarded by a reader/writer lock
///
/// Cloning is cheap and clones share state. Hand a clone to every thread
/// that works on the request; they all read and write the same bag and
/// observe the same deadline.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use request_scope::RequestContext;
///
/// let ctx = RequestContext::new(Duration::from_secs(1));
/// ctx.set("user", "alice".to_string());
///
/// let helper = ctx.clone();
/// let seen = std::thread::spawn(move || helper.get::<String>("user"))
///     .join()
///     .unwrap();
///
/// assert_eq!(seen.as_deref().map(String::as_str), Some("alice"));
/// assert!(!ctx.is_expired());
/// ```
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    request_id: Option<String>,
    timeout: Duration,
    signal: DeadlineSignal,
    store: KeyStore,
}

// ============================================================================
// Construction
// ============================================================================

impl RequestContext {
    /// Creates a context whose deadline is `timeout` from now.
    ///
    /// Construction cannot fail. A timeout too large to represent yields a
    /// context that only expires through [`cancel`](Self::cancel).
    pub fn new(timeout: Duration) -> Self {
        Self::build(timeout, None)
    }

    /// Creates a context from an explicit configuration.
    pub fn from_config(config: &ContextConfig) -> Self {
        Self::build(config.timeout(), config.request_id().map(str::to_owned))
    }

    /// Returns a builder for a context.
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    fn build(timeout: Duration, request_id: Option<String>) -> Self {
        tracing::debug!(
            request_id = request_id.as_deref().unwrap_or("-"),
            timeout_ms = timeout.as_millis() as u64,
            "request context created"
        );
        Self {
            inner: Arc::new(ContextInner {
                request_id,
                timeout,
                signal: DeadlineSignal::new(timeout),
                store: KeyStore::new(),
            }),
        }
    }

    /// Returns the request id used for log correlation, if one was set.
    pub fn request_id(&self) -> Option<&str> {
        self.inner.request_id.as_deref()
    }

    /// Returns the timeout this context was created with.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Returns `true` if both handles refer to the same context.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// ============================================================================
// Key/value bag
// ============================================================================

impl RequestContext {
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// Takes the write lock for the duration of the insert. The first call
    /// allocates the backing map.
    pub fn set<T>(&self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.inner.store.set(key.into(), Arc::new(value));
    }

    /// Returns the value under `key` if present and of type `T`.
    ///
    /// Takes the read lock, so concurrent readers do not block each other.
    /// A missing key and a value of another type both yield `None`.
    pub fn get<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.inner.store.get(key)?.downcast::<T>().ok()
    }

    /// Returns the untyped value under `key`.
    pub fn get_raw(&self, key: &str) -> Option<StoredValue> {
        self.inner.store.get(key)
    }

    /// Stores a value under a typed key.
    pub fn set_key<T>(&self, key: &Key<T>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.set(key.name(), value);
    }

    /// Reads a value through a typed key.
    pub fn get_key<T>(&self, key: &Key<T>) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.get(key.name())
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&self, key: &str) -> Option<StoredValue> {
        self.inner.store.remove(key)
    }

    /// Returns `true` if a value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.store.contains_key(key)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the stored keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.store.keys()
    }
}

// ============================================================================
// Deadline and cancellation
// ============================================================================

impl RequestContext {
    /// Expires the context immediately.
    ///
    /// Repeat calls, and calls after the deadline already passed, do nothing.
    pub fn cancel(&self) {
        if self.inner.signal.cancel() {
            tracing::debug!(
                request_id = self.request_id().unwrap_or("-"),
                "request context cancelled"
            );
        }
    }

    /// Returns `true` once the deadline passed or the context was cancelled.
    pub fn is_expired(&self) -> bool {
        self.inner.signal.is_expired()
    }

    /// Returns why the context expired, or `None` while it is active.
    pub fn cause(&self) -> Option<ExpiryCause> {
        self.inner.signal.cause()
    }

    /// Instant at which the context expires on its own.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.signal.deadline()
    }

    /// Time left before the deadline; zero once expired.
    pub fn remaining(&self) -> Duration {
        self.inner.signal.remaining()
    }

    /// Blocks the calling thread until the context expires.
    pub fn wait(&self) -> ExpiryCause {
        self.inner.signal.wait()
    }

    /// Blocks for at most `timeout`; returns the cause if the context expired.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<ExpiryCause> {
        self.inner.signal.wait_timeout(timeout)
    }

    /// Returns a handle to the deadline signal alone.
    ///
    /// Useful for helpers that must observe the deadline but have no business
    /// touching the key/value bag.
    pub fn signal(&self) -> DeadlineSignal {
        self.inner.signal.clone()
    }

    #[cfg(test)]
    pub(crate) fn store_is_materialized(&self) -> bool {
        self.inner.store.is_materialized()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.inner.request_id)
            .field("timeout", &self.inner.timeout)
            .field("signal", &self.inner.signal)
            .field("store", &self.inner.store)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for a [`RequestContext`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use request_scope::RequestContext;
///
/// let ctx = RequestContext::builder()
///     .timeout(Duration::from_millis(250))
///     .request_id("req-123")
///     .build();
///
/// assert_eq!(ctx.request_id(), Some("req-123"));
/// assert_eq!(ctx.timeout(), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    config: ContextConfig,
}

impl ContextBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Sets the request id.
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.config = self.config.with_request_id(request_id);
        self
    }

    /// Builds the context. The deadline clock starts here.
    pub fn build(self) -> RequestContext {
        RequestContext::from_config(&self.config)
    }
}

impl From<ContextConfig> for ContextBuilder {
    fn from(config: ContextConfig) -> Self {
        Self { config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TIMEOUT;
    use std::thread;

    #[test]
    fn set_then_get_returns_value() {
        let ctx = RequestContext::new(Duration::from_secs(1));
        ctx.set("user", "alice".to_string());

        let user = ctx.get::<String>("user").expect("user was set");
        assert_eq!(user.as_str(), "alice");
    }

    #[test]
    fn get_on_fresh_context_misses() {
        let ctx = RequestContext::new(Duration::from_secs(1));
        assert!(ctx.get::<String>("user").is_none());
        assert!(ctx.get_raw("user").is_none());
        assert!(ctx.is_empty());
    }

    #[test]
    fn store_is_lazy() {
        let ctx = RequestContext::new(Duration::from_secs(1));
        assert!(!ctx.store_is_materialized());

        let _ = ctx.get::<u32>("anything");
        assert!(!ctx.store_is_materialized());

        ctx.set("anything", 1u32);
        assert!(ctx.store_is_materialized());
    }

    #[test]
    fn get_with_wrong_type_misses() {
        let ctx = RequestContext::new(Duration::from_secs(1));
        ctx.set("count", 7u32);

        assert!(ctx.get::<String>("count").is_none());
        assert!(ctx.contains_key("count"));
        assert_eq!(ctx.get::<u32>("count").as_deref(), Some(&7));
    }

    #[test]
    fn overwrite_replaces_value() {
        let ctx = RequestContext::new(Duration::from_secs(1));
        ctx.set("role", "viewer");
        ctx.set("role", "admin");
        assert_eq!(ctx.get::<&str>("role").as_deref(), Some(&"admin"));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn overwrite_may_change_type() {
        let ctx = RequestContext::new(Duration::from_secs(1));
        ctx.set("id", 1u64);
        ctx.set("id", "one".to_string());
        assert!(ctx.get::<u64>("id").is_none());
        assert!(ctx.get::<String>("id").is_some());
    }

    #[test]
    fn typed_keys_round_trip() {
        const TRACE_ID: Key<String> = Key::new("trace_id");
        let ctx = RequestContext::new(Duration::from_secs(1));

        assert!(ctx.get_key(&TRACE_ID).is_none());
        ctx.set_key(&TRACE_ID, "abc123".to_string());
        assert_eq!(
            ctx.get_key(&TRACE_ID).as_deref().map(String::as_str),
            Some("abc123")
        );
        // The string API sees the same entry
        assert!(ctx.contains_key("trace_id"));
    }

    #[test]
    fn remove_and_keys() {
        let ctx = RequestContext::new(Duration::from_secs(1));
        ctx.set("a", 1i32);
        ctx.set("b", 2i32);

        let mut keys = ctx.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        assert!(ctx.remove("a").is_some());
        assert!(ctx.remove("a").is_none());
        assert_eq!(ctx.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn clones_share_store_and_signal() {
        let ctx = RequestContext::new(Duration::from_secs(60));
        let clone = ctx.clone();

        clone.set("k", 5u8);
        assert_eq!(ctx.get::<u8>("k").as_deref(), Some(&5));

        clone.cancel();
        assert!(ctx.is_expired());
        assert!(ctx.ptr_eq(&clone));
    }

    #[test]
    fn separate_contexts_do_not_share() {
        let a = RequestContext::new(Duration::from_secs(60));
        let b = RequestContext::new(Duration::from_secs(60));

        a.set("k", 1u8);
        a.cancel();

        assert!(b.get::<u8>("k").is_none());
        assert!(!b.is_expired());
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn cancel_expires_immediately_and_is_idempotent() {
        let ctx = RequestContext::new(Duration::from_secs(60));
        assert!(!ctx.is_expired());
        assert!(ctx.cause().is_none());

        ctx.cancel();
        assert!(ctx.is_expired());
        assert_eq!(ctx.cause(), Some(ExpiryCause::Cancelled));

        ctx.cancel();
        assert_eq!(ctx.cause(), Some(ExpiryCause::Cancelled));
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }

    #[test]
    fn deadline_expires_after_timeout() {
        let ctx = RequestContext::new(Duration::from_millis(200));
        thread::sleep(Duration::from_millis(10));
        assert!(!ctx.is_expired());

        thread::sleep(Duration::from_millis(250));
        assert!(ctx.is_expired());
        assert_eq!(ctx.cause(), Some(ExpiryCause::DeadlineExceeded));
    }

    #[test]
    fn expiry_does_not_clear_store() {
        let ctx = RequestContext::new(Duration::from_secs(60));
        ctx.set("user", "alice");
        ctx.cancel();
        assert_eq!(ctx.get::<&str>("user").as_deref(), Some(&"alice"));
    }

    #[test]
    fn deadline_matches_timeout() {
        let before = Instant::now();
        let ctx = RequestContext::new(Duration::from_secs(5));
        let after = Instant::now();

        let deadline = ctx.deadline().unwrap();
        assert!(deadline >= before + Duration::from_secs(5));
        assert!(deadline <= after + Duration::from_secs(5));
    }

    #[test]
    fn signal_handle_observes_cancel() {
        let ctx = RequestContext::new(Duration::from_secs(60));
        let signal = ctx.signal();
        ctx.cancel();
        assert_eq!(signal.cause(), Some(ExpiryCause::Cancelled));
    }

    #[test]
    fn wait_timeout_on_active_context() {
        let ctx = RequestContext::new(Duration::from_secs(60));
        assert!(ctx.wait_timeout(Duration::from_millis(5)).is_none());
    }

    #[test]
    fn builder_defaults() {
        let ctx = RequestContext::builder().build();
        assert_eq!(ctx.timeout(), DEFAULT_TIMEOUT);
        assert!(ctx.request_id().is_none());
    }

    #[test]
    fn builder_from_config() {
        let config = ContextConfig::new(Duration::from_millis(300)).with_request_id("req-9");
        let ctx = ContextBuilder::from(config).build();
        assert_eq!(ctx.timeout(), Duration::from_millis(300));
        assert_eq!(ctx.request_id(), Some("req-9"));
    }

    #[test]
    fn debug_hides_values() {
        let ctx = RequestContext::builder().request_id("req-dbg").build();
        ctx.set("password", "hunter2");

        let debug_out = format!("{:?}", ctx);
        assert!(debug_out.contains("req-dbg"));
        assert!(debug_out.contains("password"));
        assert!(!debug_out.contains("hunter2"));
    }

    #[test]
    fn concurrent_writers_last_one_wins() {
        let ctx = RequestContext::new(Duration::from_secs(5));

        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let ctx = ctx.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        ctx.set("shared", i);
                        let _ = ctx.get::<u32>("shared");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let value = *ctx.get::<u32>("shared").expect("written by some thread");
        assert!(value < 8);
    }
}

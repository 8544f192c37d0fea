use std::time::Duration;

/// Timeout applied when no explicit timeout is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Per-request configuration for building a [`RequestContext`].
///
/// The timeout is carried as a value rather than a process-wide constant,
/// so individual routes can override it without touching shared state.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use request_scope::{ContextConfig, DEFAULT_TIMEOUT};
///
/// let config = ContextConfig::default();
/// assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
///
/// let slow = ContextConfig::default()
///     .with_timeout(Duration::from_secs(30))
///     .with_request_id("req-42");
/// assert_eq!(slow.timeout(), Duration::from_secs(30));
/// assert_eq!(slow.request_id(), Some("req-42"));
/// ```
///
/// [`RequestContext`]: crate::RequestContext
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    timeout: Duration,
    request_id: Option<String>,
}

impl ContextConfig {
    /// Creates a configuration with the given timeout and no request id.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            request_id: None,
        }
    }

    /// Replaces the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the request id used to correlate log lines.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the configured request id, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

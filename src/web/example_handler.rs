//! Example handlers demonstrating request-scoped context usage.
//!
//! This module shows realistic handler flows: an upstream step that records
//! request-derived data, a handler that fans work out to helper threads
//! sharing one context, and a handler that gives up when the deadline fires.
//!
//! **These examples are for documentation and testing only.**
//! They demonstrate proper usage patterns without requiring actual HTTP infrastructure.

use std::thread;
use std::time::Duration;

use crate::deadline::ExpiryCause;
use crate::error::Error;
use crate::store::Key;

use super::{extract_context, try_extract_context, ContextCarrier};

/// Authenticated user id, recorded by [`record_identity`].
pub const USER_ID: Key<String> = Key::new("user");

/// Trace id, recorded by [`record_identity`].
pub const TRACE_ID: Key<String> = Key::new("trace_id");

/// Display name loaded by the profile helper thread.
pub const DISPLAY_NAME: Key<String> = Key::new("display_name");

/// Upstream step that attaches identity data to the request context.
///
/// Returns `false` if no context is installed; the failure has already been
/// logged by [`extract_context`].
///
/// # Examples
///
/// ```
/// use request_scope::web::{install_context, HandlerContext};
/// use request_scope::web::example_handler::{record_identity, USER_ID};
/// use request_scope::ContextConfig;
///
/// let mut carrier = HandlerContext::new();
/// let ctx = install_context(&mut carrier, &ContextConfig::default());
///
/// assert!(record_identity(&carrier, "alice", "trace-1"));
/// assert_eq!(ctx.get_key(&USER_ID).as_deref().map(String::as_str), Some("alice"));
/// ```
pub fn record_identity<C>(carrier: &C, user_id: &str, trace_id: &str) -> bool
where
    C: ContextCarrier + ?Sized,
{
    let Some(ctx) = extract_context(Some(carrier)) else {
        return false;
    };
    ctx.set_key(&USER_ID, user_id.to_string());
    ctx.set_key(&TRACE_ID, trace_id.to_string());
    true
}

/// Result of the profile handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileResult {
    /// Authenticated user id
    pub user_id: String,
    /// Display name produced by the helper thread
    pub display_name: String,
    /// Trace id, if one was recorded upstream
    pub trace_id: Option<String>,
}

/// Handles a profile lookup.
///
/// This handler demonstrates:
/// - Strict extraction (wiring errors surface as `Err`)
/// - Reading identity written by an upstream step
/// - A helper thread writing into the same context
///
/// Returns `Ok(None)` for anonymous requests.
///
/// # Errors
///
/// Returns [`Error::Extract`] if no `RequestContext` is installed.
///
/// # Examples
///
/// ```
/// use request_scope::web::{install_context, HandlerContext};
/// use request_scope::web::example_handler::{handle_profile, record_identity};
/// use request_scope::ContextConfig;
///
/// let mut carrier = HandlerContext::new();
/// install_context(&mut carrier, &ContextConfig::default());
/// record_identity(&carrier, "alice", "trace-1");
///
/// let profile = handle_profile(&carrier).unwrap().expect("authenticated");
/// assert_eq!(profile.display_name, "ALICE");
/// ```
pub fn handle_profile<C>(carrier: &C) -> Result<Option<ProfileResult>, Error>
where
    C: ContextCarrier + ?Sized,
{
    let ctx = try_extract_context(Some(carrier))?;

    let Some(user_id) = ctx.get_key(&USER_ID) else {
        return Ok(None);
    };

    // Helper writes its result into the shared bag
    thread::scope(|scope| {
        scope.spawn(|| {
            ctx.set_key(&DISPLAY_NAME, user_id.to_uppercase());
        });
    });

    let display_name = ctx
        .get_key(&DISPLAY_NAME)
        .map(|name| (*name).clone())
        .unwrap_or_default();

    Ok(Some(ProfileResult {
        user_id: (*user_id).clone(),
        display_name,
        trace_id: ctx.get_key(&TRACE_ID).map(|id| (*id).clone()),
    }))
}

/// Outcome of the report handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Every step finished before the deadline
    Completed {
        /// Number of steps run
        steps: usize,
    },
    /// The deadline fired first
    Abandoned {
        /// Steps finished before expiry
        steps: usize,
        /// Why the context expired
        cause: ExpiryCause,
    },
    /// No context was installed
    NoContext,
}

/// Handles a report made of `steps` units of `step_time` each.
///
/// This handler demonstrates:
/// - Soft extraction with a defined fallback
/// - A worker checking the shared deadline between steps
/// - A watchdog thread blocking on the deadline signal
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use request_scope::web::{install_context, HandlerContext};
/// use request_scope::web::example_handler::{handle_report, ReportOutcome};
/// use request_scope::ContextConfig;
///
/// let mut carrier = HandlerContext::new();
/// install_context(&mut carrier, &ContextConfig::default());
///
/// let outcome = handle_report(&carrier, 3, Duration::from_millis(1));
/// assert_eq!(outcome, ReportOutcome::Completed { steps: 3 });
/// ```
pub fn handle_report<C>(carrier: &C, steps: usize, step_time: Duration) -> ReportOutcome
where
    C: ContextCarrier + ?Sized,
{
    let Some(ctx) = extract_context(Some(carrier)) else {
        return ReportOutcome::NoContext;
    };

    let signal = ctx.signal();
    thread::scope(|scope| {
        let worker = scope.spawn(|| {
            let mut done = 0;
            while done < steps {
                if ctx.is_expired() {
                    break;
                }
                thread::sleep(step_time);
                done += 1;
                ctx.set("report.steps", done);
            }
            // Releases the watchdog once the work is over
            ctx.cancel();
            done
        });

        let watchdog = scope.spawn(|| signal.wait());

        let done = worker.join().unwrap_or(0);
        let cause = watchdog.join().unwrap_or(ExpiryCause::Cancelled);

        if done == steps {
            ReportOutcome::Completed { steps: done }
        } else {
            ReportOutcome::Abandoned { steps: done, cause }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextConfig;
    use crate::web::{install_context, HandlerContext, CONTEXT_KEY};

    fn carrier_with_context(timeout: Duration) -> HandlerContext {
        let mut carrier = HandlerContext::new();
        install_context(&mut carrier, &ContextConfig::new(timeout));
        carrier
    }

    #[test]
    fn record_identity_without_context_fails() {
        let carrier = HandlerContext::new();
        assert!(!record_identity(&carrier, "alice", "t-1"));
    }

    #[test]
    fn profile_for_authenticated_user() {
        let carrier = carrier_with_context(Duration::from_secs(5));
        assert!(record_identity(&carrier, "bob", "trace-9"));

        let profile = handle_profile(&carrier).unwrap().unwrap();
        assert_eq!(profile.user_id, "bob");
        assert_eq!(profile.display_name, "BOB");
        assert_eq!(profile.trace_id.as_deref(), Some("trace-9"));
    }

    #[test]
    fn profile_for_anonymous_request() {
        let carrier = carrier_with_context(Duration::from_secs(5));
        assert_eq!(handle_profile(&carrier).unwrap(), None);
    }

    #[test]
    fn profile_without_context_is_an_error() {
        let carrier = HandlerContext::new();
        assert!(matches!(handle_profile(&carrier), Err(Error::Extract(_))));
    }

    #[test]
    fn report_completes_within_deadline() {
        let carrier = carrier_with_context(Duration::from_secs(10));
        let outcome = handle_report(&carrier, 4, Duration::from_millis(1));
        assert_eq!(outcome, ReportOutcome::Completed { steps: 4 });
    }

    #[test]
    fn report_is_abandoned_at_deadline() {
        let carrier = carrier_with_context(Duration::from_millis(50));
        let outcome = handle_report(&carrier, 1_000, Duration::from_millis(10));

        match outcome {
            ReportOutcome::Abandoned { steps, cause } => {
                assert!(steps < 1_000);
                assert_eq!(cause, ExpiryCause::DeadlineExceeded);
            }
            other => panic!("expected Abandoned, got {:?}", other),
        }
    }

    #[test]
    fn report_progress_is_visible_in_context() {
        let carrier = carrier_with_context(Duration::from_secs(10));
        handle_report(&carrier, 2, Duration::from_millis(1));

        let ctx = try_extract_context(Some(&carrier)).unwrap();
        assert_eq!(ctx.get::<usize>("report.steps").as_deref(), Some(&2));
    }

    #[test]
    fn report_without_context_falls_back() {
        let mut carrier = HandlerContext::new();
        carrier.insert(CONTEXT_KEY, "bogus");
        assert_eq!(
            handle_report(&carrier, 1, Duration::from_millis(1)),
            ReportOutcome::NoContext
        );
    }
}

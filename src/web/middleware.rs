//! Installing and extracting request contexts.
//!
//! This module provides the boundary layer between a framework's per-request
//! carrier and [`RequestContext`]. It handles:
//! - Building a context from configuration and installing it in the carrier
//! - Retrieving the installed context from handler code
//!
//! # Integration Flow
//!
//! ```text
//! Incoming request
//!   ↓
//! Framework creates its request-handling context (the carrier)
//!   ↓
//! install_context() stores a RequestContext under "context"
//!   ↓
//! Handler calls extract_context() / try_extract_context()
//!   ↓
//! Handler and its helpers share the RequestContext
//! ```

use crate::config::ContextConfig;
use crate::context::RequestContext;
use crate::error::{ExtractError, ExtractErrorKind};

use super::{ContextCarrier, ContextSlot};

/// Key under which a [`RequestContext`] is stored in its carrier.
///
/// Every component that installs a context for later extraction must use
/// exactly this key.
pub const CONTEXT_KEY: &str = "context";

/// Builds a context from `config` and installs it in `carrier`.
///
/// The deadline clock starts here. Returns a handle to the installed context
/// so the caller can cancel it once the response is written.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use request_scope::web::{install_context, HandlerContext, CONTEXT_KEY};
/// use request_scope::ContextConfig;
///
/// let mut carrier = HandlerContext::new();
/// let config = ContextConfig::default().with_timeout(Duration::from_secs(2));
///
/// let ctx = install_context(&mut carrier, &config);
/// assert!(carrier.contains_key(CONTEXT_KEY));
/// assert_eq!(ctx.timeout(), Duration::from_secs(2));
/// ```
pub fn install_context<C>(carrier: &mut C, config: &ContextConfig) -> RequestContext
where
    C: ContextSlot + ?Sized,
{
    let ctx = RequestContext::from_config(config);
    attach_context(carrier, ctx.clone());
    ctx
}

/// Installs an existing context in `carrier`, replacing any previous one.
pub fn attach_context<C>(carrier: &mut C, ctx: RequestContext)
where
    C: ContextSlot + ?Sized,
{
    carrier.set(CONTEXT_KEY, Box::new(ctx));
}

/// Retrieves the installed context, reporting why if it cannot.
///
/// Nothing is logged; the caller decides what a failure means.
///
/// # Errors
///
/// - [`ExtractErrorKind::NoCarrier`] if `carrier` is `None`
/// - [`ExtractErrorKind::MissingKey`] if nothing is stored under [`CONTEXT_KEY`]
/// - [`ExtractErrorKind::WrongType`] if the stored value is not a `RequestContext`
///
/// # Examples
///
/// ```
/// use request_scope::web::{try_extract_context, HandlerContext, CONTEXT_KEY};
/// use request_scope::ExtractErrorKind;
///
/// let mut carrier = HandlerContext::new();
/// carrier.insert(CONTEXT_KEY, "not a context");
///
/// let err = try_extract_context(Some(&carrier)).unwrap_err();
/// assert_eq!(err.kind, ExtractErrorKind::WrongType);
/// ```
pub fn try_extract_context<C>(carrier: Option<&C>) -> Result<RequestContext, ExtractError>
where
    C: ContextCarrier + ?Sized,
{
    let carrier = carrier.ok_or_else(|| {
        ExtractError::new(
            ExtractErrorKind::NoCarrier,
            "no request-handling context supplied",
        )
    })?;

    let value = carrier.get(CONTEXT_KEY).ok_or_else(|| {
        ExtractError::new(
            ExtractErrorKind::MissingKey,
            format!("nothing stored under '{}'", CONTEXT_KEY),
        )
    })?;

    value
        .downcast_ref::<RequestContext>()
        .cloned()
        .ok_or_else(|| {
            ExtractError::new(
                ExtractErrorKind::WrongType,
                format!("value under '{}' is not a RequestContext", CONTEXT_KEY),
            )
        })
}

/// Retrieves the installed context, or `None` if there is none.
///
/// Every failure is logged once at error level and then swallowed, so
/// handlers can fall back gracefully. Never panics.
///
/// # Examples
///
/// ```
/// use request_scope::web::{extract_context, install_context, HandlerContext};
/// use request_scope::ContextConfig;
///
/// let mut carrier = HandlerContext::new();
/// assert!(extract_context(Some(&carrier)).is_none());
/// assert!(extract_context(None::<&HandlerContext>).is_none());
///
/// install_context(&mut carrier, &ContextConfig::default());
/// assert!(extract_context(Some(&carrier)).is_some());
/// ```
pub fn extract_context<C>(carrier: Option<&C>) -> Option<RequestContext>
where
    C: ContextCarrier + ?Sized,
{
    match try_extract_context(carrier) {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            tracing::error!(kind = %err.kind, "failed to get request context: {}", err.message);
            None
        }
    }
}

//! Request-scoped execution context.
//!
//! This crate provides a per-request carrier of:
//! - **A deadline signal**: expires a fixed time after construction or on
//!   explicit cancellation, and every thread working on the request observes
//!   the same expiry
//! - **A key/value bag**: thread-safe, lazily allocated storage for
//!   request-derived data such as identity or trace ids
//!
//! # Core Types
//!
//! - [`RequestContext`]: The per-request object, shared by cheap clones
//! - [`DeadlineSignal`]: One-way active → expired signal
//! - [`Key<T>`]: String key bound to a value type
//! - [`ContextConfig`]: Explicit per-request timeout configuration
//! - [`web`]: Installing and extracting contexts from a framework carrier
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use request_scope::{ExpiryCause, RequestContext};
//!
//! let ctx = RequestContext::new(Duration::from_secs(1));
//! ctx.set("user", "alice".to_string());
//!
//! assert_eq!(ctx.get::<String>("user").as_deref().map(String::as_str), Some("alice"));
//! assert!(ctx.get::<String>("missing").is_none());
//!
//! ctx.cancel();
//! assert_eq!(ctx.cause(), Some(ExpiryCause::Cancelled));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod deadline;
mod error;
mod store;
pub mod web;

pub use config::{ContextConfig, DEFAULT_TIMEOUT};
pub use context::{ContextBuilder, RequestContext};
pub use deadline::{DeadlineSignal, ExpiryCause};
pub use error::{Error, ExtractError, ExtractErrorKind};
pub use store::{Key, StoredValue};

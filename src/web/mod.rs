//! Web framework integration surface.
//!
//! This module provides the boundary between a web framework's per-request
//! handling context and [`RequestContext`](crate::RequestContext). It handles:
//! - Installing a freshly built context under the well-known key
//! - Retrieving that context from handler code that only sees the carrier
//!
//! # Design Principles
//!
//! 1. **No Framework Dependencies**: This module contains no framework-specific code.
//!    It defines the [`ContextCarrier`] and [`ContextSlot`] capabilities that
//!    framework-specific code implements.
//!
//! 2. **One Well-Known Key**: Contexts live under [`CONTEXT_KEY`] (`"context"`).
//!    Installers and extractors agree on nothing else.
//!
//! 3. **Soft Failure by Default**: [`extract_context`] logs and returns `None`
//!    instead of failing the request. [`try_extract_context`] reports the
//!    reason for callers that prefer a typed error.
//!
//! # Example Flow
//!
//! ```
//! use std::time::Duration;
//! use request_scope::web::{extract_context, install_context, HandlerContext};
//! use request_scope::ContextConfig;
//!
//! // 1. Framework creates its per-request carrier
//! let mut carrier = HandlerContext::new();
//!
//! // 2. Upstream middleware installs the request context
//! let config = ContextConfig::default().with_timeout(Duration::from_secs(2));
//! install_context(&mut carrier, &config);
//!
//! // 3. Handler code retrieves it and shares it with helpers
//! let ctx = extract_context(Some(&carrier)).expect("installed above");
//! ctx.set("user", "alice".to_string());
//!
//! let helper = ctx.clone();
//! std::thread::spawn(move || assert!(helper.get::<String>("user").is_some()))
//!     .join()
//!     .unwrap();
//! ```

mod adapter;
pub mod example_handler;
mod extract;
mod middleware;

pub use adapter::HandlerContext;
pub use extract::{ContextCarrier, ContextSlot};
pub use middleware::{
    attach_context, extract_context, install_context, try_extract_context, CONTEXT_KEY,
};

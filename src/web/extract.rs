//! Carrier traits for web integration.
//!
//! This module defines the capability a framework's per-request context must
//! offer so a [`RequestContext`](crate::RequestContext) can be stored in it and
//! read back out.

use std::any::Any;
use std::collections::HashMap;

/// Read access to a framework-owned, per-request value map.
///
/// This trait is the boundary between a web framework's request-handling
/// context and request-scope. Framework integrations implement it so the
/// accessor functions can look up the installed context.
///
/// # Design Notes
///
/// This trait intentionally does NOT:
/// - Create contexts (that's `install_context`'s job)
/// - Interpret stored values (the accessor downcasts)
///
/// It ONLY exposes a string-keyed lookup.
///
/// # Examples
///
/// ```
/// use std::any::Any;
/// use request_scope::web::ContextCarrier;
///
/// // Example framework-specific implementation
/// struct MyFrameworkContext {
///     installed: Option<Box<dyn Any + Send + Sync>>,
/// }
///
/// impl ContextCarrier for MyFrameworkContext {
///     fn get(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
///         if key == "context" {
///             self.installed.as_deref()
///         } else {
///             None
///         }
///     }
/// }
/// ```
pub trait ContextCarrier {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<&(dyn Any + Send + Sync)>;
}

/// Write access to a framework-owned, per-request value map.
///
/// Needed only by the upstream step that installs a context; handler code
/// only ever reads through [`ContextCarrier`].
pub trait ContextSlot {
    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Box<dyn Any + Send + Sync>);
}

impl ContextCarrier for HashMap<String, Box<dyn Any + Send + Sync>> {
    fn get(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        HashMap::get(self, key).map(|value| &**value)
    }
}

impl ContextSlot for HashMap<String, Box<dyn Any + Send + Sync>> {
    fn set(&mut self, key: &str, value: Box<dyn Any + Send + Sync>) {
        self.insert(key.to_string(), value);
    }
}

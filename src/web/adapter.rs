//! Minimal framework-neutral request-handling context.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use super::{ContextCarrier, ContextSlot};

/// A framework-neutral, per-request value map.
///
/// `HandlerContext` stands in for the request-handling context a web
/// framework creates for every incoming request. It holds arbitrary values
/// under string keys, which is all the accessor functions need.
///
/// # Design Notes
///
/// This type intentionally contains simple, owned data to avoid coupling to
/// any specific framework. Real integrations implement [`ContextCarrier`]
/// (and [`ContextSlot`]) on the framework's own type instead.
///
/// # Examples
///
/// ```
/// use request_scope::web::{install_context, extract_context, HandlerContext};
/// use request_scope::ContextConfig;
///
/// let mut carrier = HandlerContext::new();
/// carrier.insert("route", "/users/:id");
///
/// let installed = install_context(&mut carrier, &ContextConfig::default());
/// let ctx = extract_context(Some(&carrier)).expect("context installed");
///
/// assert!(ctx.ptr_eq(&installed));
/// assert_eq!(carrier.value::<&str>("route"), Some(&"/users/:id"));
/// ```
#[derive(Default)]
pub struct HandlerContext {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl HandlerContext {
    /// Creates an empty handler context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Returns the value under `key` if present and of type `T`.
    pub fn value<T>(&self, key: &str) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        self.values.get(key)?.downcast_ref::<T>()
    }

    /// Removes the value under `key`, returning whether one was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Returns `true` if a value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ContextCarrier for HandlerContext {
    fn get(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get(key).map(|value| &**value)
    }
}

impl ContextSlot for HandlerContext {
    fn set(&mut self, key: &str, value: Box<dyn Any + Send + Sync>) {
        self.values.insert(key.to_string(), value);
    }
}

impl fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("HandlerContext").field("keys", &keys).finish()
    }
}

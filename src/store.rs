//! Lock-guarded key/value bag.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;

/// A value stored in the bag.
pub type StoredValue = Arc<dyn Any + Send + Sync>;

/// A string key bound to the type of value stored under it.
///
/// Reading through a `Key<T>` can only ever yield a `T`, so the
/// "wrong type stored" case cannot arise between callers that share the key.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use request_scope::{Key, RequestContext};
///
/// const USER_ID: Key<u64> = Key::new("user_id");
///
/// let ctx = RequestContext::new(Duration::from_secs(1));
/// ctx.set_key(&USER_ID, 42);
/// assert_eq!(ctx.get_key(&USER_ID).as_deref(), Some(&42));
/// ```
pub struct Key<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    /// Creates a typed key.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    /// Returns the string name of this key.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.name).finish()
    }
}

/// String-keyed map behind a reader/writer lock.
///
/// The map is not allocated until the first write. Every access goes
/// through `entries`; readers take the shared lock, writers the exclusive one.
#[derive(Default)]
pub(crate) struct KeyStore {
    entries: RwLock<Option<HashMap<String, StoredValue>>>,
}

impl KeyStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts `value`, replacing any previous value for `key`.
    pub(crate) fn set(&self, key: String, value: StoredValue) {
        let mut entries = self.entries.write();
        entries.get_or_insert_with(HashMap::new).insert(key, value);
    }

    pub(crate) fn get(&self, key: &str) -> Option<StoredValue> {
        let entries = self.entries.read();
        entries.as_ref()?.get(key).cloned()
    }

    pub(crate) fn remove(&self, key: &str) -> Option<StoredValue> {
        let mut entries = self.entries.write();
        entries.as_mut()?.remove(key)
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        let entries = self.entries.read();
        entries.as_ref().is_some_and(|map| map.contains_key(key))
    }

    pub(crate) fn len(&self) -> usize {
        let entries = self.entries.read();
        entries.as_ref().map_or(0, HashMap::len)
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        let entries = self.entries.read();
        entries
            .as_ref()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn is_materialized(&self) -> bool {
        self.entries.read().is_some()
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values are opaque; only the keys are shown.
        let mut keys = self.keys();
        keys.sort();
        f.debug_struct("KeyStore").field("keys", &keys).finish()
    }
}

use std::sync::Arc;
use tokio::time::Instant;

use crate::entry::{CacheEntry, downcast};
use crate::namespace::{Namespace, NamespaceTable};

/// Process-scoped cache state: one table per [`Namespace`].
///
/// Created once by whatever composes the application and shared by handle.
/// Only the engine and the invalidation methods below write to the tables.
#[derive(Default)]
pub struct CacheStore {
    admin: NamespaceTable,
    public: NamespaceTable,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn table(&self, namespace: Namespace) -> &NamespaceTable {
        match namespace {
            Namespace::Admin => &self.admin,
            Namespace::Public => &self.public,
        }
    }

    /// The cached value for `key`, if one has been stored under type `T`.
    ///
    /// Never triggers a fetch and ignores freshness.
    pub fn peek<T>(&self, namespace: Namespace, key: &str) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let table = self.table(namespace).lock();
        let payload = table.get(key)?.data.clone()?;
        downcast(payload, key).ok()
    }

    /// Whether an entry exists for `key`, populated or not.
    pub fn contains(&self, namespace: Namespace, key: &str) -> bool {
        self.table(namespace).lock().contains_key(key)
    }

    /// Whether a fetch for `key` is running.
    pub fn is_inflight(&self, namespace: Namespace, key: &str) -> bool {
        self.table(namespace)
            .lock()
            .get(key)
            .is_some_and(CacheEntry::is_inflight)
    }

    /// When the value for `key` was stored.
    pub fn fetched_at(&self, namespace: Namespace, key: &str) -> Option<Instant> {
        self.table(namespace)
            .lock()
            .get(key)
            .and_then(CacheEntry::fetched_at)
    }

    /// Number of entries in a namespace.
    pub fn len(&self, namespace: Namespace) -> usize {
        self.table(namespace).lock().len()
    }

    pub fn is_empty(&self, namespace: Namespace) -> bool {
        self.len(namespace) == 0
    }

    /// Remove every entry whose key starts with `prefix`.
    ///
    /// Plain string-prefix matching. A running fetch of a removed entry keeps
    /// going and its callers still get its result, but the result is never
    /// written back. Returns the number of entries removed.
    pub fn invalidate_prefix(&self, namespace: Namespace, prefix: &str) -> usize {
        let mut removed = 0;
        self.table(namespace).lock().retain(|key, _| {
            if !key.starts_with(prefix) {
                return true;
            }
            removed += 1;
            false
        });

        tracing::debug!(
            "Invalidated cache entries: namespace={}, prefix={}, removed={}",
            namespace,
            prefix,
            removed
        );
        removed
    }

    /// Remove exactly `key`. Returns whether it was present.
    pub fn invalidate_key(&self, namespace: Namespace, key: &str) -> bool {
        let removed = self.table(namespace).lock().remove(key);
        match removed {
            Some(_) => {
                tracing::debug!(
                    "Invalidated cache entry: namespace={}, key={}",
                    namespace,
                    key
                );
                true
            }
            None => false,
        }
    }

    /// Drop a whole namespace, e.g. the admin data on sign-out.
    pub fn clear(&self, namespace: Namespace) -> usize {
        self.invalidate_prefix(namespace, "")
    }
}

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::entry::CacheEntry;

/// The two independent partitions of the cache.
///
/// Administrative data is fetched with the moderator's bearer token and has its
/// own refresh cadence, so it never shares a table with public browsing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Admin,
    Public,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Admin => "admin",
            Namespace::Public => "public",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyed entries of one namespace.
///
/// Every read-decide-write sequence takes the lock once and never holds it
/// across an `.await`.
#[derive(Default)]
pub(crate) struct NamespaceTable {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl NamespaceTable {
    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Each mutation under the lock is a whole assignment, so a panic
        // elsewhere cannot leave an entry half written.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

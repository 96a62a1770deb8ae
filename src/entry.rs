use futures::future::{BoxFuture, Shared};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;

/// Type-erased cached value.
///
/// Entries of one namespace hold different resource types, so values are
/// stored as `Arc<dyn Any>` and downcast back when handed to a caller. Cloning
/// only bumps the reference count, which keeps repeated hits pointer-equal.
pub(crate) type Payload = Arc<dyn Any + Send + Sync>;

/// What a settled fetch hands to everyone awaiting it.
#[derive(Clone)]
pub(crate) struct Settlement {
    pub result: Result<Payload, FetchError>,
    /// Whether the result was written into the entry.
    pub committed: bool,
}

pub(crate) type SharedFetch = Shared<BoxFuture<'static, Settlement>>;

/// The running fetch for a key together with the means to cancel it.
///
/// Both live in one record so they are set and cleared as a unit.
pub(crate) struct Inflight {
    pub id: u64,
    pub handle: SharedFetch,
    pub cancel: CancellationToken,
}

/// A cache slot: the last good value, when it was stored, and any running fetch.
#[derive(Default)]
pub struct CacheEntry {
    pub(crate) data: Option<Payload>,
    pub(crate) fetched_at: Option<Instant>,
    pub(crate) inflight: Option<Inflight>,
}

impl CacheEntry {
    /// Whether a successful fetch has ever been stored.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// When the cached value was stored. `None` until the first success.
    pub fn fetched_at(&self) -> Option<Instant> {
        self.fetched_at
    }

    /// Whether a fetch for this key is currently running.
    pub fn is_inflight(&self) -> bool {
        self.inflight.is_some()
    }

    /// Age of the cached value at `now`.
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.fetched_at
            .map(|at| now.saturating_duration_since(at))
    }

    /// Fresh means stored, and no older than `ttl`.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.data.is_some() && self.age(now).is_some_and(|age| age <= ttl)
    }

    /// Fail with `TypeMismatch` if the stored value is not a `T`.
    pub(crate) fn check_type<T>(&self, key: &str) -> Result<(), FetchError>
    where
        T: Send + Sync + 'static,
    {
        match &self.data {
            Some(data) if !(**data).is::<T>() => Err(FetchError::TypeMismatch {
                key: key.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Cancel the running fetch, if any, and forget it.
    pub(crate) fn cancel_inflight(&mut self) -> bool {
        match self.inflight.take() {
            Some(inflight) => {
                inflight.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Apply the outcome of fetch `id`.
    ///
    /// Ignored unless `id` is still the entry's running fetch. A failure only
    /// clears the in-flight record; the previous value stays. Returns whether
    /// a new value was stored.
    pub(crate) fn settle(&mut self, id: u64, result: &Result<Payload, FetchError>) -> bool {
        if !self.inflight.as_ref().is_some_and(|inflight| inflight.id == id) {
            return false;
        }
        self.inflight = None;

        match result {
            Ok(payload) => {
                self.data = Some(Arc::clone(payload));
                self.fetched_at = Some(Instant::now());
                true
            }
            Err(_) => false,
        }
    }
}

/// Recover the caller's type from a cached value.
pub(crate) fn downcast<T>(payload: Payload, key: &str) -> Result<Arc<T>, FetchError>
where
    T: Send + Sync + 'static,
{
    payload.downcast::<T>().map_err(|_| FetchError::TypeMismatch {
        key: key.to_string(),
    })
}

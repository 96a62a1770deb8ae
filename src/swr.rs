use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::entry::{CacheEntry, Inflight, Payload, Settlement, SharedFetch, downcast};
use crate::error::FetchError;
use crate::metrics::{FetchMetric, MetricsSink};
use crate::namespace::Namespace;
use crate::store::CacheStore;

/// Callback receiving the value of a successful background revalidation.
pub type RevalidateHook<T> = Arc<dyn Fn(Arc<T>) + Send + Sync>;

/// Callback receiving the error of a failed background revalidation.
pub type RevalidateErrorHook = Arc<dyn Fn(&FetchError) + Send + Sync>;

/// Per-call options for [`SwrEngine::fetch`].
///
/// Defaults: not forced, no callbacks.
pub struct FetchOptions<T> {
    /// Skip the cache, cancel any running fetch and start a new one.
    pub force: bool,
    /// Invoked when a background revalidation stored a new value.
    pub on_revalidate: Option<RevalidateHook<T>>,
    /// Invoked when a background revalidation failed. Failures are always
    /// logged; without this hook the caller never hears about them.
    pub on_revalidate_error: Option<RevalidateErrorHook>,
}

impl<T> Default for FetchOptions<T> {
    fn default() -> Self {
        FetchOptions {
            force: false,
            on_revalidate: None,
            on_revalidate_error: None,
        }
    }
}

impl<T> Clone for FetchOptions<T> {
    fn clone(&self) -> Self {
        FetchOptions {
            force: self.force,
            on_revalidate: self.on_revalidate.clone(),
            on_revalidate_error: self.on_revalidate_error.clone(),
        }
    }
}

impl<T> FetchOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a forced refresh.
    pub fn forced() -> Self {
        Self::new().force(true)
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn on_revalidate<F>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<T>) + Send + Sync + 'static,
    {
        self.on_revalidate = Some(Arc::new(hook));
        self
    }

    pub fn on_revalidate_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FetchError) + Send + Sync + 'static,
    {
        self.on_revalidate_error = Some(Arc::new(hook));
        self
    }
}

/// Stale-while-revalidate fetch engine over a [`CacheStore`].
///
/// For each key the engine keeps at most one fetch running, serves fresh
/// values without touching the network, serves stale values immediately while
/// refreshing them in the background, and blocks callers only on a true miss
/// or a forced refresh.
pub struct SwrEngine {
    store: Arc<CacheStore>,
    metrics: Option<Arc<dyn MetricsSink>>,
    next_fetch_id: Arc<AtomicU64>,
}

impl Clone for SwrEngine {
    fn clone(&self) -> Self {
        SwrEngine {
            store: Arc::clone(&self.store),
            metrics: self.metrics.clone(),
            next_fetch_id: Arc::clone(&self.next_fetch_id),
        }
    }
}

impl SwrEngine {
    pub fn new(store: Arc<CacheStore>) -> Self {
        SwrEngine {
            store,
            metrics: None,
            next_fetch_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Report engine decisions to `sink`.
    pub fn with_metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    fn emit(&self, metric: FetchMetric) {
        if let Some(sink) = &self.metrics {
            sink.emit(metric);
        }
    }

    /// Get the value for `key`, fetching it with `fetcher` when needed.
    ///
    /// In order:
    /// 1. A forced call cancels the running fetch for `key`, if any.
    /// 2. A value no older than `ttl` is returned as is.
    /// 3. An older value is returned as is, and a background fetch is started
    ///    unless one is already running. `on_revalidate` receives its result.
    /// 4. A running fetch is joined instead of starting a second one.
    /// 5. Otherwise a new fetch is started and awaited. Its error goes to the
    ///    callers awaiting it and never replaces the cached value.
    ///
    /// Paths 2 and 3 complete without suspending.
    pub async fn fetch<T, F, Fut>(
        &self,
        namespace: Namespace,
        key: &str,
        ttl: Duration,
        fetcher: F,
        options: FetchOptions<T>,
    ) -> Result<Arc<T>, FetchError>
    where
        T: Send + Sync + 'static,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let pending = {
            let mut table = self.store.table(namespace).lock();
            let entry = table.entry(key.to_string()).or_default();

            // A caller asking for the wrong type must not disturb the entry.
            entry.check_type::<T>(key)?;

            if options.force && entry.cancel_inflight() {
                tracing::debug!(
                    "Forced refresh superseded running fetch: namespace={}, key={}",
                    namespace,
                    key
                );
            }

            if !options.force
                && let Some(data) = entry.data.clone()
            {
                let value = downcast::<T>(data, key)?;
                if entry.is_fresh(Instant::now(), ttl) {
                    tracing::debug!("Cache hit: namespace={}, key={}", namespace, key);
                    self.emit(FetchMetric::Hit {
                        namespace,
                        key: key.to_string(),
                    });
                    return Ok(value);
                }

                let revalidating = entry.inflight.is_none();
                if revalidating {
                    let handle = self.start_fetch(namespace, key, entry, fetcher, true);
                    self.watch_revalidation(namespace, key, handle, options);
                }
                tracing::debug!(
                    "Serving stale value: namespace={}, key={}, revalidating={}",
                    namespace,
                    key,
                    revalidating
                );
                self.emit(FetchMetric::Stale {
                    namespace,
                    key: key.to_string(),
                    revalidating,
                });
                return Ok(value);
            }

            let running = match &entry.inflight {
                Some(inflight) if !options.force => Some(inflight.handle.clone()),
                _ => None,
            };
            match running {
                Some(handle) => {
                    tracing::debug!(
                        "Joining running fetch: namespace={}, key={}",
                        namespace,
                        key
                    );
                    self.emit(FetchMetric::Deduplicated {
                        namespace,
                        key: key.to_string(),
                    });
                    handle
                }
                None => {
                    tracing::debug!(
                        "Cache miss: namespace={}, key={}, forced={}",
                        namespace,
                        key,
                        options.force
                    );
                    self.emit(FetchMetric::Miss {
                        namespace,
                        key: key.to_string(),
                        forced: options.force,
                    });
                    self.start_fetch(namespace, key, entry, fetcher, false)
                }
            }
        };

        let settlement = pending.await;
        downcast(settlement.result?, key)
    }

    /// Remove every entry of `namespace` whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, namespace: Namespace, prefix: &str) -> usize {
        let count = self.store.invalidate_prefix(namespace, prefix);
        self.emit(FetchMetric::Invalidated {
            namespace,
            prefix: prefix.to_string(),
            count,
        });
        count
    }

    /// Remove exactly `key` from `namespace`.
    pub fn invalidate_key(&self, namespace: Namespace, key: &str) -> bool {
        let removed = self.store.invalidate_key(namespace, key);
        self.emit(FetchMetric::Invalidated {
            namespace,
            prefix: key.to_string(),
            count: usize::from(removed),
        });
        removed
    }

    /// Drop every entry of `namespace`.
    pub fn clear(&self, namespace: Namespace) -> usize {
        self.invalidate_prefix(namespace, "")
    }

    /// Spawn `fetcher` and record it as the running fetch of `entry`.
    ///
    /// Must be called with the namespace lock held, so the record is in place
    /// before the task can try to settle.
    fn start_fetch<T, F, Fut>(
        &self,
        namespace: Namespace,
        key: &str,
        entry: &mut CacheEntry,
        fetcher: F,
        background: bool,
    ) -> SharedFetch
    where
        T: Send + Sync + 'static,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let engine = self.clone();
        let task_key = key.to_string();

        let task = tokio::spawn(async move {
            let started = Instant::now();
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(FetchError::Cancelled),
                result = fetcher(token.clone()) => result,
            };
            let result = result.map(|value| Arc::new(value) as Payload);
            engine.settle(namespace, &task_key, id, result, started, background)
        });

        let store = Arc::clone(&self.store);
        let join_key = key.to_string();
        let handle = async move {
            match task.await {
                Ok(settlement) => settlement,
                Err(join_err) => {
                    // The task died before settling; release the key.
                    let result = Err(FetchError::Transport(format!(
                        "fetch task failed: {}",
                        join_err
                    )));
                    let mut table = store.table(namespace).lock();
                    if let Some(entry) = table.get_mut(&join_key) {
                        entry.settle(id, &result);
                    }
                    Settlement {
                        result,
                        committed: false,
                    }
                }
            }
        }
        .boxed()
        .shared();

        entry.inflight = Some(Inflight {
            id,
            handle: handle.clone(),
            cancel,
        });
        handle
    }

    fn settle(
        &self,
        namespace: Namespace,
        key: &str,
        id: u64,
        result: Result<Payload, FetchError>,
        started: Instant,
        background: bool,
    ) -> Settlement {
        let committed = {
            let mut table = self.store.table(namespace).lock();
            match table.get_mut(key) {
                Some(entry) => entry.settle(id, &result),
                None => false,
            }
        };

        match &result {
            Ok(_) if !committed => tracing::debug!(
                "Discarded superseded fetch result: namespace={}, key={}",
                namespace,
                key
            ),
            Err(err) if background => tracing::warn!(
                "Background revalidation failed: namespace={}, key={}, error={}",
                namespace,
                key,
                err
            ),
            Err(err) => tracing::debug!(
                "Fetch failed: namespace={}, key={}, error={}",
                namespace,
                key,
                err
            ),
            Ok(_) => {}
        }

        self.emit(FetchMetric::Settled {
            namespace,
            key: key.to_string(),
            ok: result.is_ok(),
            committed,
            latency_ms: started.elapsed().as_secs_f64() * 1000.0,
        });

        Settlement { result, committed }
    }

    /// Deliver a background revalidation's outcome to the caller's hooks.
    fn watch_revalidation<T>(
        &self,
        namespace: Namespace,
        key: &str,
        handle: SharedFetch,
        options: FetchOptions<T>,
    ) where
        T: Send + Sync + 'static,
    {
        let FetchOptions {
            on_revalidate,
            on_revalidate_error,
            ..
        } = options;
        if on_revalidate.is_none() && on_revalidate_error.is_none() {
            return;
        }

        let key = key.to_string();
        tokio::spawn(async move {
            let settlement = handle.await;
            match settlement.result {
                Ok(payload) if settlement.committed => {
                    let Some(hook) = on_revalidate else {
                        return;
                    };
                    match downcast::<T>(payload, &key) {
                        Ok(value) => hook(value),
                        Err(err) => tracing::warn!(
                            "Revalidated value not delivered: namespace={}, key={}, error={}",
                            namespace,
                            key,
                            err
                        ),
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    if let Some(hook) = on_revalidate_error {
                        hook(&err);
                    }
                }
            }
        });
    }
}

//! Metrics hook for the fetch engine.
//!
//! The engine reports every decision it takes (hit, stale serve, dedup, miss),
//! every settlement and every invalidation to an optional user-provided sink.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vibecoder_client::{CacheStore, FetchMetric, MetricsSink, SwrEngine};
//!
//! let sink = Arc::new(MyMetricsSink::new());
//! let engine = SwrEngine::new(Arc::new(CacheStore::new())).with_metrics(sink);
//! ```

use async_trait::async_trait;

use crate::namespace::Namespace;

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchMetric {
    /// Served a value younger than its TTL.
    Hit { namespace: Namespace, key: String },
    /// Served an expired value; `revalidating` tells whether this call started
    /// the background refresh.
    Stale {
        namespace: Namespace,
        key: String,
        revalidating: bool,
    },
    /// Joined a fetch already running for the key.
    Deduplicated { namespace: Namespace, key: String },
    /// Started a blocking fetch (no usable value, or forced).
    Miss {
        namespace: Namespace,
        key: String,
        forced: bool,
    },
    /// A fetch finished.
    Settled {
        namespace: Namespace,
        key: String,
        ok: bool,
        /// Whether the result was written into the entry.
        committed: bool,
        latency_ms: f64,
    },
    /// Entries were removed by prefix or exact key.
    Invalidated {
        namespace: Namespace,
        prefix: String,
        count: usize,
    },
}

/// Receiver of engine metrics.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Called inline on the engine's hot path, sometimes with a table lock
    /// held. Implementations must be quick and must not call back into the
    /// engine.
    fn emit(&self, metric: FetchMetric);

    /// Flush any buffered metrics.
    async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

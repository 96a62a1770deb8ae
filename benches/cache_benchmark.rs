use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use vibecoder_client::{CacheStore, FetchOptions, Namespace, SwrEngine};

mod common;
use common::{BenchConfig, BenchProject, FakeBackend, KeyGenerator, detail_key};

const TTL: Duration = Duration::from_secs(30);

fn engine() -> SwrEngine {
    SwrEngine::new(Arc::new(CacheStore::new()))
}

async fn load(
    engine: &SwrEngine,
    backend: &FakeBackend,
    id: &str,
    ttl: Duration,
) -> Arc<BenchProject> {
    let backend = backend.clone();
    let project_id = id.to_string();
    engine
        .fetch(
            Namespace::Public,
            &detail_key(id),
            ttl,
            move |_cancel| async move { backend.get_project(&project_id).await },
            FetchOptions::new(),
        )
        .await
        .unwrap()
}

/// Benchmark 1: Hot Cache (all hits, pure lookup cost)
fn bench_hot_cache(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("hot_cache");
    group.sample_size(config.sample_size);

    let backend = FakeBackend::new(config.num_keys, 0);
    let ids = KeyGenerator::new(config.num_keys).sequential();
    group.throughput(Throughput::Elements(ids.len() as u64));

    let engine = engine();
    rt.block_on(async {
        for id in &ids {
            load(&engine, &backend, id, TTL).await;
        }
    });

    group.bench_function("sequential", |b| {
        b.to_async(&rt).iter(|| async {
            for id in &ids {
                black_box(load(&engine, &backend, id, TTL).await);
            }
        });
    });

    group.finish();
}

/// Benchmark 2: Stale Serve (every read expired, refreshed in the background)
fn bench_stale_serve(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("stale_serve");
    group.sample_size(config.sample_size.min(50));

    let backend = FakeBackend::new(config.num_keys, config.backend_latency_ms);
    let ids = KeyGenerator::new(1000.min(config.num_keys)).sequential();
    group.throughput(Throughput::Elements(ids.len() as u64));

    let engine = engine();
    rt.block_on(async {
        join_all(ids.iter().map(|id| load(&engine, &backend, id, TTL))).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
    });

    group.bench_function("sequential", |b| {
        b.to_async(&rt).iter(|| async {
            for id in &ids {
                black_box(load(&engine, &backend, id, Duration::ZERO).await);
            }
        });
    });

    group.finish();
}

/// Benchmark 3: Cold Cache (every read goes to the backend)
fn bench_cold_cache(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cold_cache");
    group.sample_size(config.sample_size.min(20)); // Fewer samples due to backend latency
    group.measurement_time(Duration::from_secs(20));

    let backend = FakeBackend::new(config.num_keys, config.backend_latency_ms);
    let ids = KeyGenerator::new(1000.min(config.num_keys)).sequential();
    group.throughput(Throughput::Elements(ids.len() as u64));

    group.bench_function("concurrent", |b| {
        b.to_async(&rt).iter(|| async {
            let engine = engine();
            black_box(join_all(ids.iter().map(|id| load(&engine, &backend, id, TTL))).await);
        });
    });

    group.finish();
}

/// Benchmark 4: Deduplication (many callers, one key, one backend request)
fn bench_dedup(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("dedup");
    group.sample_size(config.sample_size.min(20));

    let backend = FakeBackend::new(1, config.backend_latency_ms);

    for callers in [1, 16, 256] {
        group.throughput(Throughput::Elements(callers as u64));
        group.bench_with_input(BenchmarkId::new("callers", callers), &callers, |b, &n| {
            b.to_async(&rt).iter(|| async {
                let engine = engine();
                black_box(join_all((0..n).map(|_| load(&engine, &backend, "p0", TTL))).await);
            });
        });
    }

    group.finish();
}

/// Benchmark 5: Mixed Workload (Zipf reads with periodic invalidation)
fn bench_mixed_workload(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("mixed_workload");
    group.sample_size(config.sample_size.min(50));

    let backend = FakeBackend::new(config.num_keys, 0);
    let reads = KeyGenerator::new(config.num_keys).zipf_random(1000);
    group.throughput(Throughput::Elements(reads.len() as u64));

    let engine = engine();
    group.bench_function("zipf_with_invalidation", |b| {
        b.to_async(&rt).iter(|| async {
            for (i, id) in reads.iter().enumerate() {
                if i % 100 == 0 {
                    engine.invalidate_prefix(Namespace::Public, "projectDetail?id=p1");
                }
                black_box(load(&engine, &backend, id, TTL).await);
            }
        });
    });

    group.finish();
}

fn run_benchmarks(c: &mut Criterion) {
    let config = BenchConfig::new();

    bench_hot_cache(c, &config);
    bench_stale_serve(c, &config);
    bench_cold_cache(c, &config);
    bench_dedup(c, &config);
    bench_mixed_workload(c, &config);
}

criterion_group!(benches, run_benchmarks);
criterion_main!(benches);

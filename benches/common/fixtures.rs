use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use vibecoder_client::{FetchError, KeyBuilder};

/// Project detail as served by the fake backend.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchProject {
    pub id: String,
    pub title: String,
    pub like_count: u64,
}

impl BenchProject {
    pub fn new(id: usize) -> Self {
        Self {
            id: format!("p{}", id),
            title: format!("Project {}", id),
            like_count: (id % 1000) as u64,
        }
    }
}

/// Simulated backend with configurable latency
#[derive(Clone)]
pub struct FakeBackend {
    data: Arc<HashMap<String, BenchProject>>,
    latency_ms: u64,
    request_count: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn new(num_projects: usize, latency_ms: u64) -> Self {
        let data = (0..num_projects)
            .map(|i| {
                let project = BenchProject::new(i);
                (project.id.clone(), project)
            })
            .collect();

        Self {
            data: Arc::new(data),
            latency_ms,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn get_project(&self, id: &str) -> Result<BenchProject, FetchError> {
        self.request_count.fetch_add(1, Ordering::Relaxed);

        // Simulate network latency
        tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;

        self.data
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::http(404, "Project not found"))
    }

    #[allow(dead_code)]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }
}

/// Cache key of a project detail, as the public accessors build it.
pub fn detail_key(id: &str) -> String {
    KeyBuilder::new("projectDetail").param("id", id).build()
}

/// Generate project ids for different workload patterns
pub struct KeyGenerator {
    num_keys: usize,
}

impl KeyGenerator {
    pub fn new(num_keys: usize) -> Self {
        Self { num_keys }
    }

    /// Every id once, in order
    pub fn sequential(&self) -> Vec<String> {
        (0..self.num_keys).map(|i| format!("p{}", i)).collect()
    }

    /// Ids with a Zipf-like distribution (80% of reads on 20% of projects)
    pub fn zipf_random(&self, count: usize) -> Vec<String> {
        let mut rng = rand::thread_rng();
        let hot = (self.num_keys / 5).max(1);

        (0..count)
            .map(|_| {
                let id = if rng.gen_bool(0.8) {
                    rng.gen_range(0..hot)
                } else {
                    rng.gen_range(hot.min(self.num_keys - 1)..self.num_keys)
                };
                format!("p{}", id)
            })
            .collect()
    }
}

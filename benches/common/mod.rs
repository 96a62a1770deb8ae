pub mod config;
pub mod fixtures;

pub use config::BenchConfig;
pub use fixtures::{BenchProject, FakeBackend, KeyGenerator, detail_key};

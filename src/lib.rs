//! vibecoder-client - stale-while-revalidate data layer for the VibeCoder client
//!
//! This library provides:
//! - An in-memory stale-while-revalidate (SWR) engine over two isolated
//!   namespaces (admin and public)
//! - Deduplication of concurrent fetches for the same key
//! - Background revalidation with optional completion hooks
//! - Prefix and exact-key invalidation; a fetch still running for a removed
//!   key answers its callers but never writes back
//! - Typed accessors for every backend resource, each invalidating what its
//!   mutations touch
//!
//! # Example
//!
//! ```ignore
//! use vibecoder_client::{Client, ClientConfig, FetchOptions, ReportQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vibecoder_client::FetchError> {
//!     let client = Client::builder()
//!         .config(ClientConfig::from_env()?)
//!         .build()?;
//!
//!     client.auth().login("admin@example.com", "secret").await?;
//!
//!     // First call fetches; calls within the TTL are served from memory, and
//!     // later calls get the stale page at once while a refresh runs.
//!     let reports = client
//!         .admin()
//!         .get_reports(&ReportQuery::default(), FetchOptions::new())
//!         .await?;
//!
//!     // Mutations drop the affected keys, so the next read is fresh.
//!     client.admin().update_report(&reports.items[0].id, "resolved").await?;
//!     Ok(())
//! }
//! ```

mod auth;
mod builder;
mod config;
mod entry;
mod error;
mod http;
mod key;
mod metrics;
pub mod models;
mod namespace;
pub mod resources;
mod store;
mod swr;

// Re-export public API
pub use auth::{TokenProvider, TokenStore};
pub use builder::{Client, ClientBuilder};
pub use config::{ClientConfig, DEFAULT_API_BASE, TtlConfig};
pub use entry::CacheEntry;
pub use error::FetchError;
pub use http::{ApiRequest, HttpClient, Method, ReqwestClient, decode};
pub use key::{KeyBuilder, ParamValue, build_key};
pub use metrics::{FetchMetric, MetricsSink};
pub use namespace::Namespace;
pub use resources::{
    AdminProjectQuery, AdminResources, AuthApi, ProjectListQuery, PublicResources, ReportQuery,
};
pub use store::CacheStore;
pub use swr::{FetchOptions, RevalidateErrorHook, RevalidateHook, SwrEngine};

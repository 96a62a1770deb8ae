//! Builder API for assembling a [`Client`].
//!
//! The builder wires one shared [`CacheStore`] and [`SwrEngine`] into the
//! admin, public and session accessors, so all of them see the same entries.

use std::sync::Arc;

use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::http::{HttpClient, ReqwestClient};
use crate::metrics::MetricsSink;
use crate::resources::{AdminResources, AuthApi, Backend, PublicResources};
use crate::store::CacheStore;
use crate::swr::SwrEngine;

/// Builder for [`Client`].
///
/// # Example
///
/// ```ignore
/// use vibecoder_client::{ClientBuilder, ClientConfig, FetchOptions};
///
/// let client = ClientBuilder::new()
///     .config(ClientConfig::from_env()?)
///     .build()?;
///
/// client.auth().login("admin@example.com", "secret").await?;
/// let users = client.admin().get_admin_users(200, FetchOptions::new()).await?;
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    config: Option<ClientConfig>,
    http: Option<Arc<dyn HttpClient>>,
    tokens: Option<Arc<TokenStore>>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` instead of [`ClientConfig::default`].
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the `reqwest` transport, e.g. with a test double.
    pub fn http(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Share a token store, e.g. one restored from a previous session.
    pub fn tokens(mut self, tokens: Arc<TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    pub fn build(self) -> Result<Client, FetchError> {
        let config = self.config.unwrap_or_default();
        let http = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestClient::new(
                config.api_base.clone(),
                config.request_timeout,
            )?),
        };
        let tokens = self.tokens.unwrap_or_default();

        let store = Arc::new(CacheStore::new());
        let mut engine = SwrEngine::new(Arc::clone(&store));
        if let Some(sink) = self.metrics {
            engine = engine.with_metrics(sink);
        }

        let backend = Backend {
            engine: engine.clone(),
            http,
            tokens: tokens.clone(),
        };
        tracing::debug!("Client built: api_base={}", config.api_base);

        Ok(Client {
            admin: AdminResources::new(backend.clone(), config.ttl.clone()),
            public: PublicResources::new(backend.clone(), config.ttl.clone()),
            auth: AuthApi::new(backend, Arc::clone(&tokens)),
            engine,
            tokens,
            config,
        })
    }
}

/// Entry point of the data layer: cached resources plus the session.
#[derive(Clone)]
pub struct Client {
    admin: AdminResources,
    public: PublicResources,
    auth: AuthApi,
    engine: SwrEngine,
    tokens: Arc<TokenStore>,
    config: ClientConfig,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn admin(&self) -> &AdminResources {
        &self.admin
    }

    pub fn public(&self) -> &PublicResources {
        &self.public
    }

    pub fn auth(&self) -> &AuthApi {
        &self.auth
    }

    /// The engine behind the accessors, for resources they do not cover.
    pub fn engine(&self) -> &SwrEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        self.engine.store()
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

//! Client configuration.
//!
//! Defaults suit a local backend; every value can be overridden from the
//! environment with [`ClientConfig::from_env`].

use std::env;
use std::time::Duration;
use url::Url;

use crate::error::FetchError;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Freshness windows per resource class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlConfig {
    /// Moderation queue and audit actions.
    pub volatile: Duration,
    /// Users, projects, policy and page content in the admin console.
    pub admin: Duration,
    /// Slow-moving page content (policy, about).
    pub content: Duration,
    /// Public project list and detail.
    pub public: Duration,
    /// Public comment threads.
    pub comments: Duration,
}

impl Default for TtlConfig {
    fn default() -> Self {
        TtlConfig {
            volatile: Duration::from_secs(15),
            admin: Duration::from_secs(5 * 60),
            content: Duration::from_secs(10 * 60),
            public: Duration::from_secs(30),
            comments: Duration::from_secs(15),
        }
    }
}

/// Configuration for [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend.
    pub api_base: Url,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
    pub ttl: TtlConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_base: Url::parse(DEFAULT_API_BASE).expect("default API base is a valid URL"),
            request_timeout: Duration::from_secs(10),
            ttl: TtlConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// - `VIBECODER_API_BASE`: backend base URL
    /// - `VIBECODER_HTTP_TIMEOUT_MS`: request timeout
    /// - `VIBECODER_TTL_VOLATILE_MS`, `VIBECODER_TTL_ADMIN_MS`,
    ///   `VIBECODER_TTL_CONTENT_MS`, `VIBECODER_TTL_PUBLIC_MS`,
    ///   `VIBECODER_TTL_COMMENTS_MS`: freshness windows
    pub fn from_env() -> Result<Self, FetchError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<L>(lookup: L) -> Result<Self, FetchError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();

        if let Some(base) = lookup("VIBECODER_API_BASE") {
            config.api_base = Url::parse(&base).map_err(|e| {
                FetchError::Config(format!("VIBECODER_API_BASE '{}': {}", base, e))
            })?;
        }

        let millis = |name: &str, target: &mut Duration| -> Result<(), FetchError> {
            if let Some(raw) = lookup(name) {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| FetchError::Config(format!("{} must be milliseconds, got '{}'", name, raw)))?;
                *target = Duration::from_millis(ms);
            }
            Ok(())
        };

        millis("VIBECODER_HTTP_TIMEOUT_MS", &mut config.request_timeout)?;
        millis("VIBECODER_TTL_VOLATILE_MS", &mut config.ttl.volatile)?;
        millis("VIBECODER_TTL_ADMIN_MS", &mut config.ttl.admin)?;
        millis("VIBECODER_TTL_CONTENT_MS", &mut config.ttl.content)?;
        millis("VIBECODER_TTL_PUBLIC_MS", &mut config.ttl.public)?;
        millis("VIBECODER_TTL_COMMENTS_MS", &mut config.ttl.comments)?;

        Ok(config)
    }
}

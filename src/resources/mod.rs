//! Resource accessors: one method per logical resource, binding its key, TTL
//! and fetcher to the engine, and invalidating what each mutation touches.

mod admin;
mod public;
mod session;

pub use admin::{AdminProjectQuery, AdminResources, ReportQuery};
pub use public::{ProjectListQuery, PublicResources};
pub use session::AuthApi;

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::auth::TokenProvider;
use crate::error::FetchError;
use crate::http::{ApiRequest, HttpClient, decode};
use crate::key::KeyBuilder;
use crate::namespace::Namespace;
use crate::swr::{FetchOptions, SwrEngine};

/// Resource kinds used as cache key roots.
///
/// Within a namespace no kind is a prefix of another, so invalidating a kind
/// by prefix never reaches an unrelated resource.
pub mod keys {
    pub const REPORTS: &str = "reports";
    pub const ACTIONS: &str = "actions";
    pub const USERS: &str = "users";
    pub const ADMIN_PROJECTS: &str = "adminProjects";
    pub const POLICY: &str = "policy";
    pub const ADMIN_ABOUT: &str = "adminAbout";

    pub const PROJECTS_LIST: &str = "projectsList";
    pub const PROJECT_DETAIL: &str = "projectDetail";
    pub const COMMENTS: &str = "comments";
    pub const MY_PROJECTS: &str = "myProjects";
    pub const ABOUT: &str = "about";

    pub const ADMIN_KINDS: [&str; 6] = [REPORTS, ACTIONS, USERS, ADMIN_PROJECTS, POLICY, ADMIN_ABOUT];
    pub const PUBLIC_KINDS: [&str; 5] = [PROJECTS_LIST, PROJECT_DETAIL, COMMENTS, MY_PROJECTS, ABOUT];
}

/// Whether a request carries the signed-in user's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Anonymous,
    Required,
}

/// Plumbing shared by all accessors.
#[derive(Clone)]
pub(crate) struct Backend {
    pub engine: SwrEngine,
    pub http: Arc<dyn HttpClient>,
    pub tokens: Arc<dyn TokenProvider>,
}

impl Backend {
    fn bearer(&self, auth: Auth) -> Result<Option<String>, FetchError> {
        match auth {
            Auth::Anonymous => Ok(None),
            Auth::Required => self
                .tokens
                .bearer_token()
                .map(Some)
                .ok_or(FetchError::Unauthorized),
        }
    }

    /// Cached read through the engine.
    ///
    /// The token is looked up when the fetch actually runs, so a background
    /// refresh uses whoever is signed in at that moment.
    pub async fn read<T>(
        &self,
        namespace: Namespace,
        key: &str,
        ttl: Duration,
        auth: Auth,
        request: ApiRequest,
        options: FetchOptions<T>,
    ) -> Result<Arc<T>, FetchError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.bearer(auth)?;

        let backend = self.clone();
        let fetcher = move |cancel: CancellationToken| async move {
            let request = request.bearer(backend.bearer(auth)?);
            let value = backend.http.send(request, cancel).await?;
            decode::<T>(value)
        };
        self.engine
            .fetch(namespace, key, ttl, fetcher, options)
            .await
    }

    /// Uncached call, used by mutations and session endpoints.
    pub async fn send<T>(&self, auth: Auth, request: ApiRequest) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let request = request.bearer(self.bearer(auth)?);
        let value = self.http.send(request, CancellationToken::new()).await?;
        decode(value)
    }

    /// Uncached call whose response body is ignored.
    pub async fn send_unit(&self, auth: Auth, request: ApiRequest) -> Result<(), FetchError> {
        let request = request.bearer(self.bearer(auth)?);
        self.http.send(request, CancellationToken::new()).await?;
        Ok(())
    }

    pub fn invalidate(&self, namespace: Namespace, prefix: &str) {
        self.engine.invalidate_prefix(namespace, prefix);
    }

    /// Every public entry showing project `id`, plus the admin project table.
    pub fn invalidate_project(&self, id: &str) {
        self.invalidate(Namespace::Public, keys::PROJECTS_LIST);
        self.engine
            .invalidate_key(Namespace::Public, &project_detail_key(id));
        self.invalidate(Namespace::Public, keys::MY_PROJECTS);
        self.invalidate(Namespace::Admin, keys::ADMIN_PROJECTS);
    }
}

pub(crate) fn project_detail_key(id: &str) -> String {
    KeyBuilder::new(keys::PROJECT_DETAIL).param("id", id).build()
}

/// Prefix of every comment key of one project, whatever its sort.
pub(crate) fn comments_prefix(project_id: &str) -> String {
    KeyBuilder::new(keys::COMMENTS)
        .param("projectId", project_id)
        .prefix()
}

/// Percent-encode one path segment.
pub(crate) fn segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes()).collect()
}

use serde_json::json;
use std::sync::Arc;

use super::{Auth, Backend, comments_prefix, keys, segment};
use crate::config::TtlConfig;
use crate::error::FetchError;
use crate::http::ApiRequest;
use crate::key::KeyBuilder;
use crate::models::{
    AboutContent, AdminUser, AuditAction, ListPage, Policy, Project, ProjectUpdate, Report,
    UserUpdate,
};
use crate::namespace::Namespace;
use crate::swr::FetchOptions;

/// Filter for the moderation queue. `status: None` lists every report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub status: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ReportQuery {
    fn default() -> Self {
        ReportQuery {
            status: None,
            limit: 50,
            offset: 0,
        }
    }
}

impl ReportQuery {
    fn key(&self) -> String {
        KeyBuilder::new(keys::REPORTS)
            .param("status", self.status.as_deref().unwrap_or("all"))
            .param("limit", self.limit)
            .param("offset", self.offset)
            .build()
    }
}

/// Filter for the admin project table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminProjectQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for AdminProjectQuery {
    fn default() -> Self {
        AdminProjectQuery {
            status: None,
            search: None,
            limit: 100,
            offset: 0,
        }
    }
}

impl AdminProjectQuery {
    fn key(&self) -> String {
        KeyBuilder::new(keys::ADMIN_PROJECTS)
            .param_opt("status", self.status.as_deref())
            .param_opt("search", self.search.as_deref())
            .param("limit", self.limit)
            .param("offset", self.offset)
            .build()
    }
}

/// Admin console resources. Every call carries the bearer token.
#[derive(Clone)]
pub struct AdminResources {
    backend: Backend,
    ttl: TtlConfig,
}

impl AdminResources {
    pub(crate) fn new(backend: Backend, ttl: TtlConfig) -> Self {
        AdminResources { backend, ttl }
    }

    pub async fn get_reports(
        &self,
        query: &ReportQuery,
        options: FetchOptions<ListPage<Report>>,
    ) -> Result<Arc<ListPage<Report>>, FetchError> {
        let request = ApiRequest::get("/api/admin/reports")
            .query_opt("status", query.status.as_deref())
            .query("limit", query.limit)
            .query("offset", query.offset);
        self.backend
            .read(
                Namespace::Admin,
                &query.key(),
                self.ttl.volatile,
                Auth::Required,
                request,
                options,
            )
            .await
    }

    pub async fn get_actions(
        &self,
        limit: u32,
        options: FetchOptions<ListPage<AuditAction>>,
    ) -> Result<Arc<ListPage<AuditAction>>, FetchError> {
        let key = KeyBuilder::new(keys::ACTIONS).param("limit", limit).build();
        let request = ApiRequest::get("/api/admin/actions").query("limit", limit);
        self.backend
            .read(
                Namespace::Admin,
                &key,
                self.ttl.volatile,
                Auth::Required,
                request,
                options,
            )
            .await
    }

    pub async fn get_admin_users(
        &self,
        limit: u32,
        options: FetchOptions<ListPage<AdminUser>>,
    ) -> Result<Arc<ListPage<AdminUser>>, FetchError> {
        let key = KeyBuilder::new(keys::USERS).param("limit", limit).build();
        let request = ApiRequest::get("/api/admin/users").query("limit", limit);
        self.backend
            .read(
                Namespace::Admin,
                &key,
                self.ttl.admin,
                Auth::Required,
                request,
                options,
            )
            .await
    }

    pub async fn get_admin_projects(
        &self,
        query: &AdminProjectQuery,
        options: FetchOptions<ListPage<Project>>,
    ) -> Result<Arc<ListPage<Project>>, FetchError> {
        let request = ApiRequest::get("/api/admin/projects")
            .query_opt("status", query.status.as_deref())
            .query_opt("search", query.search.as_deref())
            .query("limit", query.limit)
            .query("offset", query.offset);
        self.backend
            .read(
                Namespace::Admin,
                &query.key(),
                self.ttl.admin,
                Auth::Required,
                request,
                options,
            )
            .await
    }

    pub async fn get_policy(
        &self,
        options: FetchOptions<Policy>,
    ) -> Result<Arc<Policy>, FetchError> {
        self.backend
            .read(
                Namespace::Admin,
                keys::POLICY,
                self.ttl.content,
                Auth::Required,
                ApiRequest::get("/api/admin/policy"),
                options,
            )
            .await
    }

    pub async fn get_about_content(
        &self,
        options: FetchOptions<AboutContent>,
    ) -> Result<Arc<AboutContent>, FetchError> {
        self.backend
            .read(
                Namespace::Admin,
                keys::ADMIN_ABOUT,
                self.ttl.content,
                Auth::Required,
                ApiRequest::get("/api/admin/about"),
                options,
            )
            .await
    }

    // ========================================================================
    // Mutations
    //
    // Affected entries are dropped once the backend has answered, success or
    // not, so the next read always goes to the network.
    // ========================================================================

    pub async fn update_report(&self, id: &str, status: &str) -> Result<Report, FetchError> {
        let request = ApiRequest::patch(format!("/api/admin/reports/{}", segment(id)))
            .json(&json!({ "status": status }))?;
        let result = self.backend.send(Auth::Required, request).await;

        self.backend.invalidate(Namespace::Admin, keys::REPORTS);
        self.backend.invalidate(Namespace::Admin, keys::ACTIONS);
        result
    }

    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<AdminUser, FetchError> {
        let request =
            ApiRequest::patch(format!("/api/admin/users/{}", segment(id))).json(update)?;
        let result = self.backend.send(Auth::Required, request).await;

        self.backend.invalidate(Namespace::Admin, keys::USERS);
        self.backend.invalidate(Namespace::Admin, keys::ACTIONS);
        result
    }

    pub async fn update_project(
        &self,
        id: &str,
        update: &ProjectUpdate,
    ) -> Result<Project, FetchError> {
        let request =
            ApiRequest::patch(format!("/api/admin/projects/{}", segment(id))).json(update)?;
        let result = self.backend.send(Auth::Required, request).await;

        self.invalidate_project(id);
        result
    }

    /// Hide a project from the public listing, or restore it.
    pub async fn hide_project(&self, id: &str, hidden: bool) -> Result<Project, FetchError> {
        let update = ProjectUpdate {
            status: Some(if hidden { "hidden" } else { "active" }.to_string()),
            ..Default::default()
        };
        self.update_project(id, &update).await
    }

    pub async fn delete_project(&self, id: &str) -> Result<(), FetchError> {
        let request = ApiRequest::delete(format!("/api/admin/projects/{}", segment(id)));
        let result = self.backend.send_unit(Auth::Required, request).await;

        self.invalidate_project(id);
        self.backend
            .invalidate(Namespace::Public, &comments_prefix(id));
        result
    }

    pub async fn update_policy(&self, content: &str) -> Result<Policy, FetchError> {
        let request = ApiRequest::put("/api/admin/policy").json(&json!({ "content": content }))?;
        let result = self.backend.send(Auth::Required, request).await;

        self.backend.invalidate(Namespace::Admin, keys::POLICY);
        self.backend.invalidate(Namespace::Admin, keys::ACTIONS);
        result
    }

    pub async fn update_about_content(
        &self,
        title: &str,
        body: &str,
    ) -> Result<AboutContent, FetchError> {
        let request = ApiRequest::put("/api/admin/about")
            .json(&json!({ "title": title, "body": body }))?;
        let result = self.backend.send(Auth::Required, request).await;

        self.backend.invalidate(Namespace::Admin, keys::ADMIN_ABOUT);
        self.backend.invalidate(Namespace::Admin, keys::ACTIONS);
        self.backend.invalidate(Namespace::Public, keys::ABOUT);
        result
    }

    fn invalidate_project(&self, id: &str) {
        self.backend.invalidate_project(id);
        self.backend.invalidate(Namespace::Admin, keys::ACTIONS);
    }
}

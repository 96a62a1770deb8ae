use std::sync::Arc;

use super::{Auth, Backend, comments_prefix, keys, project_detail_key, segment};
use crate::config::TtlConfig;
use crate::error::FetchError;
use crate::http::ApiRequest;
use crate::key::KeyBuilder;
use crate::models::{
    AboutContent, Comment, CommentSort, LikeCount, ListPage, Project, ProjectCreate, Report,
    ReportCreate,
};
use crate::namespace::Namespace;
use crate::swr::FetchOptions;

/// Filters of the public project list. Unset filters are left out of both the
/// request and the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectListQuery {
    pub sort: Option<String>,
    pub platform: Option<String>,
    pub tag: Option<String>,
}

impl ProjectListQuery {
    fn key(&self) -> String {
        KeyBuilder::new(keys::PROJECTS_LIST)
            .param_opt("sort", self.sort.as_deref())
            .param_opt("platform", self.platform.as_deref())
            .param_opt("tag", self.tag.as_deref())
            .build()
    }
}

/// Resources of the public site.
#[derive(Clone)]
pub struct PublicResources {
    backend: Backend,
    ttl: TtlConfig,
}

impl PublicResources {
    pub(crate) fn new(backend: Backend, ttl: TtlConfig) -> Self {
        PublicResources { backend, ttl }
    }

    pub async fn get_projects(
        &self,
        query: &ProjectListQuery,
        options: FetchOptions<ListPage<Project>>,
    ) -> Result<Arc<ListPage<Project>>, FetchError> {
        let request = ApiRequest::get("/api/projects")
            .query_opt("sort", query.sort.as_deref())
            .query_opt("platform", query.platform.as_deref())
            .query_opt("tag", query.tag.as_deref());
        self.backend
            .read(
                Namespace::Public,
                &query.key(),
                self.ttl.public,
                Auth::Anonymous,
                request,
                options,
            )
            .await
    }

    pub async fn get_project(
        &self,
        id: &str,
        options: FetchOptions<Project>,
    ) -> Result<Arc<Project>, FetchError> {
        let request = ApiRequest::get(format!("/api/projects/{}", segment(id)));
        self.backend
            .read(
                Namespace::Public,
                &project_detail_key(id),
                self.ttl.public,
                Auth::Anonymous,
                request,
                options,
            )
            .await
    }

    pub async fn get_comments(
        &self,
        project_id: &str,
        sort: CommentSort,
        options: FetchOptions<ListPage<Comment>>,
    ) -> Result<Arc<ListPage<Comment>>, FetchError> {
        let key = KeyBuilder::new(keys::COMMENTS)
            .param("projectId", project_id)
            .param("sort", sort.as_str())
            .build();
        let request = ApiRequest::get(format!("/api/projects/{}/comments", segment(project_id)))
            .query("sort", sort.as_str());
        self.backend
            .read(
                Namespace::Public,
                &key,
                self.ttl.comments,
                Auth::Anonymous,
                request,
                options,
            )
            .await
    }

    /// Projects of the signed-in user.
    pub async fn get_my_projects(
        &self,
        options: FetchOptions<ListPage<Project>>,
    ) -> Result<Arc<ListPage<Project>>, FetchError> {
        self.backend
            .read(
                Namespace::Public,
                keys::MY_PROJECTS,
                self.ttl.public,
                Auth::Required,
                ApiRequest::get("/api/me/projects"),
                options,
            )
            .await
    }

    pub async fn get_about(
        &self,
        options: FetchOptions<AboutContent>,
    ) -> Result<Arc<AboutContent>, FetchError> {
        self.backend
            .read(
                Namespace::Public,
                keys::ABOUT,
                self.ttl.content,
                Auth::Anonymous,
                ApiRequest::get("/api/about"),
                options,
            )
            .await
    }

    pub async fn create_project(&self, project: &ProjectCreate) -> Result<Project, FetchError> {
        let request = ApiRequest::post("/api/projects").json(project)?;
        let result = self.backend.send(Auth::Required, request).await;

        self.backend.invalidate(Namespace::Public, keys::PROJECTS_LIST);
        self.backend.invalidate(Namespace::Public, keys::MY_PROJECTS);
        self.backend.invalidate(Namespace::Admin, keys::ADMIN_PROJECTS);
        result
    }

    pub async fn like_project(&self, id: &str) -> Result<LikeCount, FetchError> {
        let request = ApiRequest::post(format!("/api/projects/{}/like", segment(id)));
        let result = self.backend.send(Auth::Required, request).await;

        self.backend.invalidate_project(id);
        result
    }

    pub async fn unlike_project(&self, id: &str) -> Result<LikeCount, FetchError> {
        let request = ApiRequest::delete(format!("/api/projects/{}/like", segment(id)));
        let result = self.backend.send(Auth::Required, request).await;

        self.backend.invalidate_project(id);
        result
    }

    pub async fn post_comment(&self, project_id: &str, content: &str) -> Result<Comment, FetchError> {
        let request = ApiRequest::post(format!("/api/projects/{}/comments", segment(project_id)))
            .json(&serde_json::json!({ "content": content }))?;
        let result = self.backend.send(Auth::Required, request).await;

        self.backend
            .invalidate(Namespace::Public, &comments_prefix(project_id));
        self.backend
            .engine
            .invalidate_key(Namespace::Public, &project_detail_key(project_id));
        self.backend.invalidate(Namespace::Public, keys::PROJECTS_LIST);
        result
    }

    /// Flag a comment for moderation. The admin queue is dropped so the
    /// report shows up on its next read.
    pub async fn report_comment(
        &self,
        comment_id: &str,
        report: &ReportCreate,
    ) -> Result<Report, FetchError> {
        let request =
            ApiRequest::post(format!("/api/comments/{}/report", segment(comment_id))).json(report)?;
        let result = self.backend.send(Auth::Required, request).await;

        self.backend.invalidate(Namespace::Admin, keys::REPORTS);
        result
    }
}

//! Integration tests for the client against a mock backend over real HTTP.

use httpmock::{Mock, MockServer};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;
use vibecoder_client::{
    Client, ClientConfig, FetchError, FetchOptions, Namespace, ProjectListQuery, ReportQuery,
    TtlConfig,
};

// ============================================================================
// Fixtures
// ============================================================================

fn project(id: &str, likes: u64) -> Value {
    json!({
        "id": id,
        "title": format!("Project {}", id),
        "summary": "A vibe-coded app",
        "platform": "web",
        "tags": ["rust"],
        "author_id": "1",
        "author_nickname": "devkim",
        "like_count": likes,
        "comment_count": 0,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

fn report(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "target_type": "comment",
        "target_id": "c1",
        "reason": "spam",
        "reporter_id": "2",
        "status": status,
        "created_at": "2024-01-01T00:00:00Z"
    })
}

fn admin_user(id: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{}@example.com", id),
        "nickname": id,
        "role": "user",
        "status": "active",
        "created_at": "2024-01-01T00:00:00Z"
    })
}

// ============================================================================
// Helper Functions
// ============================================================================

fn client_for(server: &MockServer, ttl: TtlConfig) -> Client {
    let config = ClientConfig {
        api_base: Url::parse(&server.base_url()).unwrap(),
        request_timeout: Duration::from_secs(5),
        ttl,
    };
    Client::builder().config(config).build().unwrap()
}

async fn mock_projects(server: &MockServer, likes: u64) -> Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/projects");
            then.status(200)
                .json_body(json!({ "items": [project("p1", likes)] }));
        })
        .await
}

async fn sign_in(server: &MockServer, client: &Client) {
    server
        .mock_async(|when, then| {
            when.method("POST").path("/api/auth/login");
            then.status(200).json_body(json!({
                "access_token": "admin-token",
                "user": { "id": "1", "email": "admin@example.com", "nickname": "admin", "role": "admin" }
            }));
        })
        .await;
    client
        .auth()
        .login("admin@example.com", "secret")
        .await
        .unwrap();
}

// ============================================================================
// Public Resources
// ============================================================================

#[tokio::test]
async fn test_projects_miss_then_hit() {
    let server = MockServer::start_async().await;
    let mock = mock_projects(&server, 1).await;
    let client = client_for(&server, TtlConfig::default());

    let first = client
        .public()
        .get_projects(&ProjectListQuery::default(), FetchOptions::new())
        .await
        .unwrap();
    let second = client
        .public()
        .get_projects(&ProjectListQuery::default(), FetchOptions::new())
        .await
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn test_stale_projects_are_served_while_revalidating() {
    let server = MockServer::start_async().await;
    let mut mock = mock_projects(&server, 1).await;
    let ttl = TtlConfig {
        public: Duration::from_millis(50),
        ..TtlConfig::default()
    };
    let client = client_for(&server, ttl);
    let query = ProjectListQuery::default();

    client
        .public()
        .get_projects(&query, FetchOptions::new())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    mock.delete_async().await;
    let mock = mock_projects(&server, 2).await;

    // Served from memory: the old like count comes back at once.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let options = FetchOptions::new().on_revalidate(move |page| {
        let _ = tx.send(page);
    });
    let stale = client.public().get_projects(&query, options).await.unwrap();
    assert_eq!(stale.items[0].like_count, 1);

    let refreshed = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.items[0].like_count, 2);

    let fresh = client
        .public()
        .get_projects(&query, FetchOptions::new())
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&fresh, &refreshed));
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn test_error_detail_reaches_caller() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/projects/missing");
            then.status(404)
                .json_body(json!({ "detail": "Project not found" }));
        })
        .await;
    let client = client_for(&server, TtlConfig::default());

    let err = client
        .public()
        .get_project("missing", FetchOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::http(404, "Project not found"));
    assert!(client.store().peek::<Value>(Namespace::Public, "projectDetail?id=missing").is_none());
}

// ============================================================================
// Admin Resources
// ============================================================================

#[tokio::test]
async fn test_update_report_then_reports_are_not_stale() {
    let server = MockServer::start_async().await;
    let client = client_for(&server, TtlConfig::default());
    sign_in(&server, &client).await;

    let mut open = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/api/admin/reports")
                .header("authorization", "Bearer admin-token");
            then.status(200)
                .json_body(json!({ "items": [report("r1", "open")] }));
        })
        .await;
    let patch = server
        .mock_async(|when, then| {
            when.method("PATCH")
                .path("/api/admin/reports/r1")
                .json_body(json!({ "status": "resolved" }));
            then.status(200).json_body(report("r1", "resolved"));
        })
        .await;

    let before = client
        .admin()
        .get_reports(&ReportQuery::default(), FetchOptions::new())
        .await
        .unwrap();
    assert_eq!(before.items[0].status, "open");

    client.admin().update_report("r1", "resolved").await.unwrap();
    patch.assert_async().await;

    open.delete_async().await;
    let resolved = server
        .mock_async(|when, then| {
            when.method("GET").path("/api/admin/reports");
            then.status(200)
                .json_body(json!({ "items": [report("r1", "resolved")] }));
        })
        .await;

    let after = client
        .admin()
        .get_reports(&ReportQuery::default(), FetchOptions::new())
        .await
        .unwrap();
    assert_eq!(after.items[0].status, "resolved");
    resolved.assert_async().await;
}

#[tokio::test]
async fn test_simultaneous_admin_user_reads_share_one_request() {
    let server = MockServer::start_async().await;
    let client = client_for(&server, TtlConfig::default());
    sign_in(&server, &client).await;

    let users = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/api/admin/users")
                .query_param("limit", "200");
            then.status(200)
                .delay(Duration::from_millis(100))
                .json_body(json!({ "items": [admin_user("u1"), admin_user("u2")] }));
        })
        .await;

    let (a, b) = tokio::join!(
        client.admin().get_admin_users(200, FetchOptions::new()),
        client.admin().get_admin_users(200, FetchOptions::new()),
    );

    assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    assert_eq!(users.hits_async().await, 1);
}

#[tokio::test]
async fn test_logout_drops_admin_cache() {
    let server = MockServer::start_async().await;
    let client = client_for(&server, TtlConfig::default());
    sign_in(&server, &client).await;

    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/admin/policy");
            then.status(200).json_body(json!({ "content": "Be kind." }));
        })
        .await;
    client.admin().get_policy(FetchOptions::new()).await.unwrap();
    assert_eq!(client.store().len(Namespace::Admin), 1);

    client.auth().logout();

    assert!(client.store().is_empty(Namespace::Admin));
    let err = client
        .admin()
        .get_policy(FetchOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::Unauthorized);
}

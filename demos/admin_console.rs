//! Example walking through an admin console session against a running backend.
//!
//! Configure with `VIBECODER_API_BASE`, sign in with `ADMIN_EMAIL` and
//! `ADMIN_PASSWORD`, and set `RUST_LOG=vibecoder_client=debug` to watch the
//! cache decide between hits, stale serves and misses.

use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vibecoder_client::models::{ListPage, Report};
use vibecoder_client::{Client, ClientConfig, FetchOptions, ReportQuery};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = Client::builder().config(ClientConfig::from_env()?).build()?;

    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    let session = client.auth().login(&email, &password).await?;
    println!("Signed in as {}", session.user.nickname);

    // Dashboard: queue, audit log and member list load together. Calls for
    // the same key made while one is in flight share its request.
    let queue = ReportQuery::default();
    let (reports, actions, users) = tokio::join!(
        client.admin().get_reports(&queue, FetchOptions::new()),
        client.admin().get_actions(20, FetchOptions::new()),
        client.admin().get_admin_users(200, FetchOptions::new()),
    );
    let (reports, actions, users) = (reports?, actions?, users?);
    println!(
        "{} reports, {} recent actions, {} users",
        reports.items.len(),
        actions.items.len(),
        users.items.len()
    );

    // Switching tabs within the TTL is served from memory.
    let again = client.admin().get_reports(&queue, FetchOptions::new()).await?;
    println!("Reports again: {} (no request)", again.items.len());

    // Resolve the first open report; the queue is refetched on the next read.
    if let Some(report) = reports.items.iter().find(|r| r.status == "open") {
        client.admin().update_report(&report.id, "resolved").await?;
        let fresh = client.admin().get_reports(&queue, FetchOptions::new()).await?;
        println!("Resolved {}; queue now has {} reports", report.id, fresh.items.len());
    }

    // Past the TTL the stale queue comes back at once and is refreshed behind it.
    tokio::time::sleep(client.config().ttl.volatile + Duration::from_millis(100)).await;
    let options = FetchOptions::<ListPage<Report>>::new()
        .on_revalidate(|page| println!("Queue refreshed in background: {} reports", page.items.len()))
        .on_revalidate_error(|err| eprintln!("Queue refresh failed: {}", err));
    let stale = client.admin().get_reports(&queue, options).await?;
    println!("Stale queue served: {} reports", stale.items.len());
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Manual refresh button.
    let forced = client
        .admin()
        .get_admin_users(200, FetchOptions::forced())
        .await?;
    println!("Reloaded {} users", forced.items.len());

    client.auth().logout();
    Ok(())
}

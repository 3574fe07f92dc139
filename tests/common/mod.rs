#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use class_site_api::auth::SharedSecret;
use class_site_api::config::DEFAULT_MAX_BODY_BYTES;
use class_site_api::database::MemoryStore;
use class_site_api::{app, Deployment};

pub const SECRET: &str = "6745Q-";

/// A server bound to a free local port, stopped when dropped
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(deployment: Deployment) -> Result<Self> {
        Self::spawn_with_body_limit(deployment, DEFAULT_MAX_BODY_BYTES).await
    }

    pub async fn spawn_with_body_limit(deployment: Deployment, max_body_bytes: usize) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        let router = app(SharedSecret::new(SECRET), deployment, max_body_bytes);

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self { port, base_url, handle })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Comma-separated header value as lowercase items, for order-insensitive checks
pub fn header_list(headers: &reqwest::header::HeaderMap, name: &str) -> Vec<String> {
    let mut items: Vec<String> = headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .split(',')
        .map(|item| item.trim().to_ascii_lowercase())
        .filter(|item| !item.is_empty())
        .collect();
    items.sort();
    items
}

/// Both handlers over a fresh in-memory store
pub async fn memory_server() -> Result<(TestServer, MemoryStore)> {
    let store = MemoryStore::new();
    let server = TestServer::spawn(Deployment::All(Arc::new(store.clone()))).await?;
    Ok((server, store))
}

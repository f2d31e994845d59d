//! Tests against a running server over HTTP.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use cas_integration_tests::{client_config, init_tracing, logout_body, logout_xml, FORM};
use cas_server::{Server, ServerConfig};
use cas_ticket::{MemoryTicketStore, TicketRecord, TicketStore};
use reqwest::header::{CONTENT_TYPE, COOKIE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use tokio::sync::oneshot;

/// A server running on a random local port.
struct TestServer {
    base_url: String,
    http: Client,
    store: Arc<MemoryTicketStore>,
    _shutdown_tx: oneshot::Sender<()>,
}

impl TestServer {
    async fn start() -> anyhow::Result<Self> {
        init_tracing();

        // Find available port for server
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        drop(listener);

        let mut config = ServerConfig::for_testing(client_config());
        config.port = port;

        let store = Arc::new(MemoryTicketStore::new());
        let server = Server::with_store(config, store.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            tokio::select! {
                result = server.run() => {
                    if let Err(e) = result {
                        tracing::error!("Server error: {}", e);
                    }
                }
                _ = shutdown_rx => {}
            }
        });

        let http = Client::builder().redirect(Policy::none()).build()?;
        let base_url = format!("http://127.0.0.1:{port}");

        // Wait for the server to accept connections
        for _ in 0..50 {
            if http.get(format!("{base_url}/health/live")).send().await.is_ok() {
                return Ok(Self {
                    base_url,
                    http,
                    store,
                    _shutdown_tx: shutdown_tx,
                });
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not start on port {port}")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[tokio::test]
async fn test_health_endpoint() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let response = server.http.get(server.url("/health")).send().await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "UP");

    let response = server.http.get(server.url("/health/ready")).send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_single_logout_over_http() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let index = cas_integration_tests::session_index("ST-1-http");
    server
        .store
        .put(&TicketRecord::new(index.clone(), "alice"))
        .await?;

    let response = server
        .http
        .get(server.url("/me"))
        .header(COOKIE, "_cas_session=ST-1-http")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let me: serde_json::Value = response.json().await?;
    assert_eq!(me["user"], "alice");

    let response = server
        .http
        .post(server.url("/"))
        .header(CONTENT_TYPE, FORM)
        .body(logout_body(&logout_xml("ST-1-http")))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");
    assert!(server.store.get(&index).await?.is_none());

    let response = server
        .http
        .get(server.url("/me"))
        .header(COOKIE, "_cas_session=ST-1-http")
        .send()
        .await?;
    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(location.starts_with("https://cas.example.com/cas/login?service="));
    Ok(())
}

#[tokio::test]
async fn test_session_status_without_login() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let response = server.http.get(server.url("/session")).send().await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["authenticated"], false);
    assert!(body["user"].is_null());
    Ok(())
}

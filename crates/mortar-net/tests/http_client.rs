use std::time::Duration;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use mortar_cache::FetchRequest;
use mortar_net::{HttpClient, Net, NetOptions};
use rstest::*;
use tokio::net::TcpListener;
use url::Url;

// ============================================================================
// Test server infrastructure
// ============================================================================

struct TestServer {
    base_url: Url,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    async fn new(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let server = axum::serve(listener, router).with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        });

        tokio::spawn(async move {
            server.await.unwrap();
        });

        tokio::time::sleep(Duration::from_millis(100)).await;

        Self {
            base_url: Url::parse(&format!("http://{}", addr)).unwrap(),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn url(&self, path: &str) -> Url {
        self.base_url.join(path).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

// ============================================================================
// Test endpoints
// ============================================================================

async fn csv_endpoint() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/csv")],
        "id,name\n3001,Brick",
    )
}

async fn missing_endpoint() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not here")
}

async fn echo_cache_control(headers: HeaderMap) -> impl IntoResponse {
    let cache_control = headers
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string();
    cache_control
}

fn router() -> Router {
    Router::new()
        .route("/Data/parts.csv", get(csv_endpoint))
        .route("/missing", get(missing_endpoint))
        .route("/echo-cache-control", get(echo_cache_control))
}

// ============================================================================
// Tests
// ============================================================================

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn fetch_returns_body_and_status() {
    let server = TestServer::new(router()).await;
    let client = HttpClient::new(NetOptions::default());

    let request = FetchRequest::get(server.url("/Data/parts.csv"));
    let resp = client.fetch(&request).await.unwrap();

    assert_eq!(resp.status, 200);
    assert!(resp.is_ok());
    assert_eq!(resp.body_string(), "id,name\n3001,Brick");
    assert_eq!(resp.headers.get("content-type"), Some("text/csv"));
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn error_status_is_a_response_not_an_error() {
    let server = TestServer::new(router()).await;
    let client = HttpClient::new(NetOptions::default());

    let request = FetchRequest::get(server.url("/missing"));
    let resp = client.fetch(&request).await.unwrap();

    assert_eq!(resp.status, 404);
    assert!(!resp.is_ok());
    assert_eq!(resp.body_string(), "not here");
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn fetch_no_store_sends_cache_bypass_header() {
    let server = TestServer::new(router()).await;
    let client = HttpClient::new(NetOptions::default());

    let request = FetchRequest::get(server.url("/echo-cache-control"));
    let resp = client.fetch_no_store(&request).await.unwrap();
    assert_eq!(resp.body_string(), "no-store");

    let resp = client.fetch(&request).await.unwrap();
    assert_eq!(resp.body_string(), "none");
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let client = HttpClient::new(NetOptions {
        request_timeout: Duration::from_secs(2),
        ..NetOptions::default()
    });

    // Reserved TEST-NET-1 address: nothing listens there.
    let request = FetchRequest::get(Url::parse("http://192.0.2.1:9/").unwrap());
    let result = client.fetch(&request).await;
    assert!(result.is_err());
}

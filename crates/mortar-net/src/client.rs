#![forbid(unsafe_code)]

use async_trait::async_trait;
use mortar_cache::{FetchRequest, Headers, Method, ResponseKind, StoredResponse};
use reqwest::Client;
use tracing::trace;

use crate::{
    error::{NetError, NetResult},
    traits::Net,
    types::NetOptions,
};

/// Real HTTP client over reqwest.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    options: NetOptions,
}

impl HttpClient {
    /// # Panics
    ///
    /// Panics if the `reqwest::Client` builder fails to build.
    #[must_use]
    pub fn new(options: NetOptions) -> Self {
        let inner = Client::builder()
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .build()
            .expect("failed to build reqwest client");
        Self { inner, options }
    }

    fn method_of(request: &FetchRequest) -> reqwest::Method {
        match request.method {
            Method::Get | Method::Other => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    async fn execute(&self, request: &FetchRequest, no_store: bool) -> NetResult<StoredResponse> {
        let mut req = self
            .inner
            .request(Self::method_of(request), request.url.clone())
            .timeout(self.options.request_timeout);

        if no_store {
            req = req.header("Cache-Control", "no-store").header("Pragma", "no-cache");
        }

        let resp = req.send().await.map_err(NetError::from)?;
        let status = resp.status();

        let mut headers = Headers::new();
        for (name, value) in resp.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str(), value);
            }
        }

        let body = resp.bytes().await.map_err(NetError::from)?;
        trace!(url = %request.url, status = status.as_u16(), len = body.len(), "fetched");

        Ok(StoredResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            kind: ResponseKind::Basic,
        })
    }
}

#[async_trait]
impl Net for HttpClient {
    async fn fetch(&self, request: &FetchRequest) -> NetResult<StoredResponse> {
        self.execute(request, false).await
    }

    async fn fetch_no_store(&self, request: &FetchRequest) -> NetResult<StoredResponse> {
        self.execute(request, true).await
    }
}

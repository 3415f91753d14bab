#![forbid(unsafe_code)]

//! The three generic caching strategies plus the navigation handler.
//!
//! Every function here resolves to *some* [`StoredResponse`]; a request that
//! was intercepted is never answered with an error value. Failures become a
//! synthesized 503 JSON body carrying the failing URL, or a literal offline
//! page for navigations (a human should see a readable notice, not raw
//! JSON).
//!
//! Stores are clone-then-put: the stored copy is cloned off the live
//! response, which stays unconsumed and goes back to the caller.

use std::sync::Arc;

use mortar_cache::{CacheNamespace, FetchRequest, StoredResponse};
use mortar_net::Net;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace};
use url::Url;

use crate::config::CachePolicy;

/// Everything a strategy invocation needs. Cheap to build per request; all
/// fields are shared handles.
pub(crate) struct StrategyCtx<N> {
    pub cache: CacheNamespace,
    pub net: Arc<N>,
    pub policy: CachePolicy,
    pub tracker: TaskTracker,
}

impl<N: Net + 'static> StrategyCtx<N> {
    /// Cache-first: serve from cache when present; only hit the network on
    /// a miss. Network failure on a miss synthesizes a 503.
    ///
    /// The second value reports whether this call stored a fresh entry;
    /// the maintenance sweep keys off stores, not hits.
    pub(crate) async fn cache_first(&self, request: &FetchRequest) -> (StoredResponse, bool) {
        if let Some(hit) = self.cache.match_request(request) {
            trace!(url = %request.url, "cache-first hit");
            return (hit, false);
        }

        match self.net.fetch(request).await {
            Ok(resp) => {
                let stored = self.should_store(&resp);
                if stored {
                    self.cache.put(request, resp.clone());
                }
                (resp, stored)
            }
            Err(err) => {
                debug!(url = %request.url, %err, "cache-first miss and network failed");
                (error_response(&request.url, "Network request failed"), false)
            }
        }
    }

    /// Network-first: live fetch, falling back to the cache, falling back
    /// to a synthesized 503.
    pub(crate) async fn network_first(&self, request: &FetchRequest) -> StoredResponse {
        match self.net.fetch(request).await {
            Ok(resp) => {
                if resp.is_ok() {
                    self.cache.put(request, resp.clone());
                }
                resp
            }
            Err(err) => {
                debug!(url = %request.url, %err, "network-first fetch failed, trying cache");
                self.cache.match_request(request).unwrap_or_else(|| {
                    error_response(
                        &request.url,
                        "Network request failed and no cached response available",
                    )
                })
            }
        }
    }

    /// Stale-while-revalidate: serve the cached copy immediately and
    /// refresh it in the background; with no cached copy, wait for the
    /// network.
    ///
    /// The cached response is returned without awaiting the revalidation
    /// fetch; that task is detached and swallows its own failures. If the
    /// worker is dropped before the refresh lands, the next matching
    /// request simply revalidates again.
    pub(crate) async fn stale_while_revalidate(&self, request: &FetchRequest) -> StoredResponse {
        let cached = self.cache.match_request(request);

        if let Some(hit) = cached {
            let net = Arc::clone(&self.net);
            let cache = self.cache.clone();
            let request = request.clone();
            self.tracker.spawn(async move {
                match net.fetch(&request).await {
                    Ok(fresh) if fresh.is_ok() => cache.put(&request, fresh),
                    Ok(fresh) => {
                        trace!(url = %request.url, status = fresh.status, "revalidation not stored")
                    }
                    Err(err) => trace!(url = %request.url, %err, "revalidation failed"),
                }
            });
            return hit;
        }

        match self.net.fetch(request).await {
            Ok(resp) => {
                if resp.is_ok() {
                    self.cache.put(request, resp.clone());
                }
                resp
            }
            Err(err) => {
                debug!(url = %request.url, %err, "swr miss and network failed");
                error_response(&request.url, "All requests failed")
            }
        }
    }

    /// Navigation handler: the strongest fallback chain, because losing a
    /// usable document offline is the highest-impact failure.
    ///
    /// Exact cache match → navigation-preload response (when enabled) →
    /// live fetch → cached root shell → literal offline page.
    pub(crate) async fn navigate(
        &self,
        request: &FetchRequest,
        preload: Option<StoredResponse>,
        shell_keys: &[String],
    ) -> StoredResponse {
        if let Some(hit) = self.cache.match_request(request) {
            return hit;
        }

        if self.policy.navigation_preload {
            if let Some(resp) = preload {
                if resp.is_ok() {
                    self.cache.put(request, resp.clone());
                }
                return resp;
            }
        }

        match self.net.fetch(request).await {
            Ok(resp) => {
                if resp.is_ok() {
                    self.cache.put(request, resp.clone());
                }
                resp
            }
            Err(err) => {
                debug!(url = %request.url, %err, "navigation fetch failed, trying shell");
                for key in shell_keys {
                    if let Some(shell) = self.cache.match_key(key) {
                        return shell;
                    }
                }
                offline_page(&request.url)
            }
        }
    }

    fn should_store(&self, resp: &StoredResponse) -> bool {
        resp.is_ok() || (self.policy.cache_opaque && resp.is_opaque())
    }
}

/// Synthesized failure for non-navigation requests: 503 with a JSON body
/// naming the failing URL.
pub(crate) fn error_response(url: &Url, message: &str) -> StoredResponse {
    let body = serde_json::json!({
        "error": message,
        "url": url.as_str(),
    })
    .to_string();
    StoredResponse::with_status(503, "Service Unavailable", body)
        .with_header("Content-Type", "application/json")
}

/// Synthesized failure for navigations: a minimal readable document.
pub(crate) fn offline_page(url: &Url) -> StoredResponse {
    let body = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <title>Offline</title></head><body>\
         <h1>You are offline</h1>\
         <p>The page at {url} is not available offline yet.</p>\
         </body></html>"
    );
    StoredResponse::with_status(503, "Service Unavailable", body)
        .with_header("Content-Type", "text/html; charset=utf-8")
}

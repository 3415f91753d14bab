#![forbid(unsafe_code)]

use async_trait::async_trait;
use mortar_cache::{FetchRequest, StoredResponse};

use crate::error::NetResult;

/// Network fetch seam for the worker.
///
/// Implementations must return a response for any reachable resource,
/// including HTTP error statuses; `Err` is reserved for transport failures
/// (unreachable host, timeout, connection reset).
#[async_trait]
pub trait Net: Send + Sync {
    /// Fetch the request normally.
    async fn fetch(&self, request: &FetchRequest) -> NetResult<StoredResponse>;

    /// Fetch with cache-bypass semantics: ask intermediaries not to serve
    /// or retain a cached copy. Used for forced refreshes and the version
    /// manifest.
    async fn fetch_no_store(&self, request: &FetchRequest) -> NetResult<StoredResponse>;
}

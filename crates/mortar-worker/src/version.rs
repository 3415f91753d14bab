#![forbid(unsafe_code)]

//! Cache identity: naming the active namespace for one worker incarnation.

use mortar_cache::FetchRequest;
use mortar_net::Net;
use parking_lot::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::error::{WorkerError, WorkerResult};

/// Version used when the manifest is unreachable or malformed.
pub const DEFAULT_VERSION: &str = "0";

/// Where the version string comes from.
#[derive(Clone, Debug)]
pub enum VersionSource {
    /// Literal version baked into the worker. Always succeeds.
    Static(String),
    /// Fetched at runtime from a small JSON manifest exposing a `version`
    /// field. Fetched with cache-bypass semantics so a stale intermediary
    /// copy cannot pin an old version.
    Manifest(Url),
}

/// Resolves the active cache namespace name.
///
/// The result is memoized per activation cycle: one manifest round-trip at
/// most, until [`reset`](Self::reset) starts the next cycle. Memoization is
/// a performance concern only — re-resolving is always safe.
///
/// Resolution never returns an error: any failure degrades to
/// [`DEFAULT_VERSION`].
#[derive(Debug)]
pub struct VersionResolver {
    prefix: String,
    source: VersionSource,
    resolved: Mutex<Option<String>>,
}

impl VersionResolver {
    #[must_use]
    pub fn new(prefix: &str, source: VersionSource) -> Self {
        Self {
            prefix: prefix.to_string(),
            source,
            resolved: Mutex::new(None),
        }
    }

    /// The version string for this activation cycle.
    pub async fn resolve<N: Net>(&self, net: &N) -> String {
        if let Some(version) = self.resolved.lock().clone() {
            return version;
        }

        let version = match &self.source {
            VersionSource::Static(version) => version.clone(),
            VersionSource::Manifest(url) => match self.fetch_manifest_version(url, net).await {
                Ok(version) => version,
                Err(err) => {
                    warn!(%err, "version manifest unavailable, using default");
                    DEFAULT_VERSION.to_string()
                }
            },
        };

        // Benign race: two concurrent resolves may both fetch; the last
        // writer wins and both observed a valid version.
        *self.resolved.lock() = Some(version.clone());
        version
    }

    /// Active cache namespace name: `<prefix>-v<version>`.
    pub async fn cache_name<N: Net>(&self, net: &N) -> String {
        let version = self.resolve(net).await;
        format!("{}-v{}", self.prefix, version)
    }

    /// True if `name` belongs to this worker's namespace family. Activation
    /// only ever deletes names this returns true for.
    #[must_use]
    pub fn owns(&self, name: &str) -> bool {
        name.starts_with(&format!("{}-v", self.prefix))
    }

    /// Forget the memoized version; the next resolve re-derives it. Called
    /// at the start of each activation cycle (and exercises the
    /// worker-restart re-derivation path).
    pub fn reset(&self) {
        *self.resolved.lock() = None;
    }

    async fn fetch_manifest_version<N: Net>(&self, url: &Url, net: &N) -> WorkerResult<String> {
        let request = FetchRequest::get(url.clone());
        let resp = net.fetch_no_store(&request).await?;
        if !resp.is_ok() {
            return Err(WorkerError::Manifest(format!(
                "manifest fetch returned status {}",
                resp.status
            )));
        }

        let value: serde_json::Value = serde_json::from_slice(&resp.body)?;
        let version = match value.get("version") {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                return Err(WorkerError::Manifest(
                    "manifest has no usable version field".to_string(),
                ))
            }
        };
        debug!(%version, "resolved version from manifest");
        Ok(version)
    }
}

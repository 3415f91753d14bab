#![forbid(unsafe_code)]

//! Install/activate phases.
//!
//! Install precaches the app shell best-effort and unconditionally forces
//! immediate activation eligibility — fast updates win over transactional
//! consistency with in-flight pages. Activation deletes every orphaned
//! namespace that belongs to this worker's prefix family and leaves foreign
//! caches alone. Neither phase can fail as a whole; individual asset or
//! deletion failures are swallowed.

use futures::future::join_all;
use mortar_cache::{CacheNamespace, CacheStorage, FetchRequest};
use mortar_net::Net;
use tracing::{debug, trace};

use crate::version::VersionResolver;

/// Worker lifecycle phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Installing,
    Installed,
    Activating,
    Activated,
}

/// Fetch-and-store each shell asset concurrently. Any single failure is
/// logged and dropped; install proceeds regardless.
pub(crate) async fn precache_shell<N: Net>(
    cache: &CacheNamespace,
    net: &N,
    requests: &[FetchRequest],
) {
    let attempts = requests.iter().map(|request| async move {
        match net.fetch(request).await {
            Ok(resp) if resp.is_ok() => {
                cache.put(request, resp);
                trace!(url = %request.url, "precached");
            }
            Ok(resp) => trace!(url = %request.url, status = resp.status, "precache skipped"),
            Err(err) => trace!(url = %request.url, %err, "precache failed"),
        }
    });
    join_all(attempts).await;
    debug!(cached = cache.len(), "precache complete");
}

/// Delete every namespace in the resolver's family except the active one.
/// Foreign namespaces (different prefix) are never touched. Returns the
/// number of deletions.
pub(crate) fn evict_stale_namespaces(
    storage: &CacheStorage,
    resolver: &VersionResolver,
    active: &str,
) -> usize {
    let mut deleted = 0;
    for name in storage.names() {
        if name != active && resolver.owns(&name) && storage.delete(&name) {
            debug!(%name, "deleted orphaned namespace");
            deleted += 1;
        }
    }
    deleted
}

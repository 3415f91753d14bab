#![forbid(unsafe_code)]

//! Cache maintenance: bounding image growth and forced refreshes.
//!
//! The image bound is soft and eventually consistent: sweeps run off the
//! request path, oldest entries go first (enumeration order approximates
//! insertion order), and overshoot between sweeps is expected.
//!
//! Forced refreshes re-fetch matching cached keys with cache-bypass
//! semantics and overwrite on success. Per-key failures are isolated: the
//! fan-out waits for every attempt regardless of individual outcomes, so a
//! refresh is idempotent — running it twice leaves the same observable
//! state as running it once.

use futures::future::join_all;
use mortar_cache::{CacheNamespace, FetchRequest};
use mortar_net::Net;
use tracing::{debug, trace};
use url::Url;

use crate::{
    classify::{is_reference_colors_url, is_reference_inventory_url, AssetClass, RouteTable},
    error::WorkerResult,
};

fn request_for_key(key: &str) -> WorkerResult<FetchRequest> {
    Ok(FetchRequest::get(Url::parse(key)?))
}

fn is_image_key(key: &str, routes: &RouteTable) -> bool {
    match request_for_key(key) {
        Ok(request) => matches!(
            routes.classify(&request),
            AssetClass::MinifigImage | AssetClass::GenericImage | AssetClass::CdnImage
        ),
        Err(_) => false,
    }
}

/// Delete the oldest image-class entries beyond `ceiling`. Returns the
/// number deleted.
pub(crate) fn sweep_images(cache: &CacheNamespace, routes: &RouteTable, ceiling: usize) -> usize {
    let image_keys: Vec<String> = cache
        .keys()
        .into_iter()
        .filter(|key| is_image_key(key, routes))
        .collect();

    let excess = image_keys.len().saturating_sub(ceiling);
    for key in image_keys.iter().take(excess) {
        cache.delete(key);
    }
    if excess > 0 {
        debug!(deleted = excess, ceiling, "image cache swept");
    }
    excess
}

/// Cached CSV keys, by path extension.
pub(crate) fn csv_keys(cache: &CacheNamespace) -> Vec<String> {
    cache
        .keys()
        .into_iter()
        .filter(|key| match request_for_key(key) {
            Ok(request) => request.url.path().to_ascii_lowercase().ends_with(".csv"),
            Err(_) => false,
        })
        .collect()
}

/// Cached reference-API keys (colors + inventories), proxied forms included.
pub(crate) fn reference_api_keys(cache: &CacheNamespace, routes: &RouteTable) -> Vec<String> {
    let policy = routes.policy();
    cache
        .keys()
        .into_iter()
        .filter(|key| {
            is_reference_colors_url(key, policy) || is_reference_inventory_url(key, policy)
        })
        .collect()
}

/// Re-fetch each key with cache bypass and overwrite on success. Failures
/// are per-key and swallowed.
pub(crate) async fn refresh_keys<N: Net>(cache: &CacheNamespace, net: &N, keys: Vec<String>) {
    let attempts = keys.iter().map(|key| async move {
        let request = match request_for_key(key) {
            Ok(request) => request,
            Err(err) => {
                trace!(%key, %err, "skipping unparseable cached key");
                return;
            }
        };
        match net.fetch_no_store(&request).await {
            Ok(resp) if resp.is_ok() => cache.put_key(key, resp),
            Ok(resp) => trace!(%key, status = resp.status, "refresh skipped"),
            Err(err) => trace!(%key, %err, "refresh failed"),
        }
    });
    join_all(attempts).await;
}

/// Drop every cached minifig image, then re-prime the configured roster.
/// Each fetch is independent; failures leave that figure absent until the
/// next on-demand request caches it again.
pub(crate) async fn refresh_minifigs<N: Net>(
    cache: &CacheNamespace,
    net: &N,
    routes: &RouteTable,
    roster: &[FetchRequest],
) {
    for key in cache.keys() {
        if let Ok(request) = request_for_key(&key) {
            if routes.classify(&request) == AssetClass::MinifigImage {
                cache.delete(&key);
            }
        }
    }

    let attempts = roster.iter().map(|request| async move {
        match net.fetch(request).await {
            Ok(resp) if resp.is_ok() => cache.put(request, resp),
            Ok(resp) => trace!(url = %request.url, status = resp.status, "minifig refresh skipped"),
            Err(err) => trace!(url = %request.url, %err, "minifig refresh failed"),
        }
    });
    join_all(attempts).await;
}

/// Helper for tests that need a synthetic stored entry.
#[cfg(test)]
pub(crate) fn seed(cache: &CacheNamespace, url: &str, body: &str) {
    cache.put_key(url, mortar_cache::StoredResponse::ok(body.to_string()));
}

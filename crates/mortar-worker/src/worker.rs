#![forbid(unsafe_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use mortar_cache::{CacheNamespace, CacheStorage, FetchRequest, Method, StoredResponse};
use mortar_net::Net;
use parking_lot::Mutex;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, trace};

use crate::{
    classify::{strategy_for, AssetClass, RouteTable, Strategy},
    config::WorkerConfig,
    control::{ControlEnvelope, ControlMessage},
    events::{ClientBus, ClientMessage},
    lifecycle::{evict_stale_namespaces, precache_shell, Phase},
    maintenance,
    strategy::StrategyCtx,
    version::VersionResolver,
};

/// The offline caching worker.
///
/// One `Worker` models one worker incarnation: it resolves its cache
/// identity once per activation cycle, intercepts GET requests through
/// [`handle_fetch`](Self::handle_fetch), and mutates cache state out of
/// band through [`handle_message`](Self::handle_message).
///
/// Intercepted requests always get a response; `None` from `handle_fetch`
/// means "not intercepted" (non-GET, or a bypassed direct reference-API
/// call) and the caller should let the platform fetch normally.
pub struct Worker<N> {
    config: WorkerConfig,
    storage: CacheStorage,
    net: Arc<N>,
    resolver: VersionResolver,
    routes: RouteTable,
    tracker: TaskTracker,
    cancel: CancellationToken,
    bus: ClientBus,
    phase: Mutex<Phase>,
    skip_waiting: AtomicBool,
}

impl<N: Net + 'static> Worker<N> {
    #[must_use]
    pub fn new(config: WorkerConfig, storage: CacheStorage, net: N) -> Self {
        Self::with_cancel(config, storage, net, CancellationToken::new())
    }

    #[must_use]
    pub fn with_cancel(
        config: WorkerConfig,
        storage: CacheStorage,
        net: N,
        cancel: CancellationToken,
    ) -> Self {
        let resolver = VersionResolver::new(&config.cache_prefix, config.version.clone());
        let routes = RouteTable::new(config.effective_route_policy());
        let bus = ClientBus::new(config.events_channel_capacity);
        Self {
            config,
            storage,
            net: Arc::new(net),
            resolver,
            routes,
            tracker: TaskTracker::new(),
            cancel,
            bus,
            phase: Mutex::new(Phase::Installing),
            skip_waiting: AtomicBool::new(false),
        }
    }

    /// Install phase: open the active namespace and precache the shell
    /// best-effort, then unconditionally force activation eligibility.
    pub async fn install(&self) {
        *self.phase.lock() = Phase::Installing;
        let cache = self.active_cache().await;
        precache_shell(&cache, self.net.as_ref(), &self.config.precache_requests()).await;
        // Deliberate: even a fully failed precache must not hold the new
        // version in waiting.
        self.skip_waiting.store(true, Ordering::Release);
        *self.phase.lock() = Phase::Installed;
        debug!(cache = cache.name(), "installed");
    }

    /// Activate phase: re-derive the cache identity, evict every orphaned
    /// namespace in our prefix family, and claim clients. Never fails.
    pub async fn activate(&self) {
        *self.phase.lock() = Phase::Activating;
        self.resolver.reset();
        let active = self.resolver.cache_name(self.net.as_ref()).await;
        let deleted = evict_stale_namespaces(&self.storage, &self.resolver, &active);
        // Ensure the active namespace exists even if install never ran.
        let _ = self.storage.open(&active);
        if self.config.policy.navigation_preload {
            trace!("navigation preload enabled");
        }
        *self.phase.lock() = Phase::Activated;
        // Claiming clients means control transferred: tell pages to reload.
        self.bus.broadcast(ClientMessage::ReloadPage);
        debug!(cache = %active, deleted, "activated");
    }

    /// Handle an intercepted request. `None` = pass through untouched.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Option<StoredResponse> {
        self.handle_fetch_with_preload(request, None).await
    }

    /// Like [`handle_fetch`](Self::handle_fetch), with the platform's
    /// navigation-preload response when one is available.
    pub async fn handle_fetch_with_preload(
        &self,
        request: &FetchRequest,
        preload: Option<StoredResponse>,
    ) -> Option<StoredResponse> {
        // Mutating requests must never be served from cache.
        if request.method != Method::Get {
            return None;
        }

        let class = self.routes.classify(request);

        if self.config.policy.bypass_direct_api
            && class != AssetClass::Navigation
            && self.routes.is_direct_reference_api(request)
        {
            trace!(url = %request.url, "passing through direct reference-API call");
            return None;
        }

        let cache = self.active_cache().await;
        let ctx = self.ctx(cache.clone());

        let resp = match strategy_for(class) {
            None => {
                let shell_keys = self.config.shell_fallback_keys();
                ctx.navigate(request, preload, &shell_keys).await
            }
            Some(Strategy::CacheFirst) => {
                let (resp, stored) = ctx.cache_first(request).await;
                // The sweep trigger keys off image stores, not hits.
                if stored && is_image_class(class) {
                    self.maybe_sweep(&cache);
                }
                resp
            }
            Some(Strategy::NetworkFirst) => ctx.network_first(request).await,
            Some(Strategy::StaleWhileRevalidate) => ctx.stale_while_revalidate(request).await,
        };
        trace!(url = %request.url, ?class, status = resp.status, "resolved");
        Some(resp)
    }

    /// Handle a posted control message. Unrecognized types are ignored.
    pub async fn handle_message(&self, envelope: ControlEnvelope) {
        let Some(message) = ControlMessage::parse(&envelope.data) else {
            trace!(data = %envelope.data, "ignoring unrecognized control message");
            return;
        };

        match message {
            ControlMessage::SkipWaiting => {
                self.skip_waiting.store(true, Ordering::Release);
            }
            ControlMessage::RefreshMinifigCache => {
                let cache = self.active_cache().await;
                maintenance::refresh_minifigs(
                    &cache,
                    self.net.as_ref(),
                    &self.routes,
                    &self.config.minifig_requests(),
                )
                .await;
            }
            ControlMessage::RefreshCsvCache => {
                let cache = self.active_cache().await;
                let keys = maintenance::csv_keys(&cache);
                maintenance::refresh_keys(&cache, self.net.as_ref(), keys).await;
            }
            ControlMessage::RefreshApiCache => {
                let cache = self.active_cache().await;
                let keys = maintenance::reference_api_keys(&cache, &self.routes);
                maintenance::refresh_keys(&cache, self.net.as_ref(), keys).await;
            }
            ControlMessage::GetVersion => {
                let version = self.version().await;
                self.send_reply(
                    envelope,
                    serde_json::json!({ "type": "VERSION", "version": version }),
                );
            }
            ControlMessage::GetVersionInfo => {
                let version = self.version().await;
                self.send_reply(
                    envelope,
                    serde_json::json!({
                        "type": "VERSION_INFO_RESPONSE",
                        "data": { "version": version },
                    }),
                );
            }
        }
    }

    /// The active namespace for this activation cycle.
    pub async fn active_cache(&self) -> CacheNamespace {
        let name = self.resolver.cache_name(self.net.as_ref()).await;
        self.storage.open(&name)
    }

    /// The resolved version string.
    pub async fn version(&self) -> String {
        self.resolver.resolve(self.net.as_ref()).await
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Whether install (or a page) requested immediate activation.
    #[must_use]
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    /// Subscribe to worker → page broadcasts.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ClientMessage> {
        self.bus.subscribe()
    }

    /// Routing table in use, for inspection.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Wait for all detached background work (revalidations, sweeps) to
    /// finish. Test hook; production callers never need it.
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Stop accepting detached work. In-flight tasks finish; a dropped
    /// revalidation just means the next matching request revalidates again.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
    }

    fn ctx(&self, cache: CacheNamespace) -> StrategyCtx<N> {
        StrategyCtx {
            cache,
            net: Arc::clone(&self.net),
            policy: self.config.policy.clone(),
            tracker: self.tracker.clone(),
        }
    }

    fn maybe_sweep(&self, cache: &CacheNamespace) {
        if self.cancel.is_cancelled() || !self.config.policy.sweep.fires() {
            return;
        }
        let cache = cache.clone();
        let routes = self.routes.clone();
        let ceiling = self.config.policy.image_cache_ceiling;
        self.tracker.spawn(async move {
            maintenance::sweep_images(&cache, &routes, ceiling);
        });
    }

    fn send_reply(&self, envelope: ControlEnvelope, value: serde_json::Value) {
        if let Some(reply) = envelope.reply {
            // The page may have dropped the port; nothing to do then.
            let _ = reply.send(value);
        }
    }
}

fn is_image_class(class: AssetClass) -> bool {
    matches!(
        class,
        AssetClass::MinifigImage | AssetClass::GenericImage | AssetClass::CdnImage
    )
}

impl<N> std::fmt::Debug for Worker<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("phase", &*self.phase.lock())
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

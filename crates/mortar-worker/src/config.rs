#![forbid(unsafe_code)]

use mortar_cache::{canonical_key, FetchRequest};
use url::Url;

use crate::{classify::RoutePolicy, version::VersionSource};

/// When the image-cache maintenance sweep runs after an image store.
///
/// The bound is soft either way: overshoot between sweeps is expected.
/// `Probability` keeps the sweep off most request paths; `Always` makes the
/// bound deterministic (and testable); `Never` disables it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SweepTrigger {
    Probability(f64),
    Always,
    Never,
}

impl SweepTrigger {
    #[must_use]
    pub fn fires(&self) -> bool {
        match self {
            Self::Probability(p) => rand::random::<f64>() < *p,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Tunable caching behavior.
#[derive(Clone, Debug)]
pub struct CachePolicy {
    /// Cache opaque (cross-origin, non-inspectable) responses in
    /// cache-first. Permissive deployments keep them; storage-frugal ones
    /// exclude them to bound growth.
    pub cache_opaque: bool,
    /// Soft ceiling on image-class entries in the active namespace.
    pub image_cache_ceiling: usize,
    /// Maintenance sweep trigger after a cache-first image store.
    pub sweep: SweepTrigger,
    /// Consult the platform navigation-preload response during navigation
    /// handling (toggled best-effort at activation).
    pub navigation_preload: bool,
    /// Skip interception entirely for direct (non-proxied) reference-API
    /// calls, deferring to the platform's native fetch.
    pub bypass_direct_api: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            cache_opaque: true,
            image_cache_ceiling: 200,
            sweep: SweepTrigger::Probability(0.1),
            navigation_preload: false,
            bypass_direct_api: false,
        }
    }
}

/// Worker configuration.
///
/// Defaults mirror the catalog deployment: a minimal app-shell precache
/// list (keeping install failure-proof when a file goes missing), the CSV
/// data set cached on first request, and the minifig image roster.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Cache namespace prefix; the active namespace is `<prefix>-v<version>`.
    pub cache_prefix: String,
    /// Where the active version string comes from.
    pub version: VersionSource,
    /// Base URL all relative asset paths resolve against.
    pub base_url: Url,
    /// Shell assets precached at install, relative to `base_url`.
    pub precache_paths: Vec<String>,
    /// CSV data files, relative to `base_url`. Not precached.
    pub csv_paths: Vec<String>,
    /// Minifig images re-primed by a forced refresh, relative to `base_url`.
    pub minifig_paths: Vec<String>,
    pub policy: CachePolicy,
    pub route_policy: RoutePolicy,
    /// Capacity of the client broadcast channel.
    pub events_channel_capacity: usize,
}

impl WorkerConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            cache_prefix: "catalog-cache".to_string(),
            version: VersionSource::Static("1".to_string()),
            base_url,
            precache_paths: default_precache_paths(),
            csv_paths: default_csv_paths(),
            minifig_paths: default_minifig_paths(),
            policy: CachePolicy::default(),
            route_policy: RoutePolicy::default(),
            events_channel_capacity: 16,
        }
    }

    /// Resolve a relative path against the base URL. Unresolvable paths are
    /// dropped by callers rather than aborting whatever batch they sit in.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<Url> {
        self.base_url.join(path).ok()
    }

    /// GET requests for the precache shell list.
    #[must_use]
    pub fn precache_requests(&self) -> Vec<FetchRequest> {
        self.requests_for(&self.precache_paths)
    }

    /// GET requests for the minifig image roster.
    #[must_use]
    pub fn minifig_requests(&self) -> Vec<FetchRequest> {
        self.requests_for(&self.minifig_paths)
    }

    /// Cache keys the navigation fallback tries, most specific first:
    /// the root document, then the explicit index document.
    #[must_use]
    pub fn shell_fallback_keys(&self) -> Vec<String> {
        let mut keys = vec![canonical_key(&self.base_url)];
        if let Some(index) = self.resolve("index.html") {
            keys.push(canonical_key(&index));
        }
        keys
    }

    /// Route policy with shell paths filled in from the precache list, so
    /// shell assets classify as `PrecacheShell` whatever their extension.
    #[must_use]
    pub(crate) fn effective_route_policy(&self) -> RoutePolicy {
        let mut policy = self.route_policy.clone();
        if policy.shell_paths.is_empty() {
            policy.shell_paths = self
                .precache_paths
                .iter()
                .filter_map(|p| self.resolve(p))
                .map(|u| u.path().to_string())
                .collect();
        }
        policy
    }

    fn requests_for(&self, paths: &[String]) -> Vec<FetchRequest> {
        paths
            .iter()
            .filter_map(|p| self.resolve(p))
            .map(FetchRequest::get)
            .collect()
    }
}

fn default_precache_paths() -> Vec<String> {
    [
        "",
        "index.html",
        "site.webmanifest",
        "apple-touch-icon.png",
        "favicon-32x32.png",
        "favicon-16x16.png",
        "favicon.ico",
        "android-chrome-192x192.png",
        "android-chrome-512x512.png",
        "ogimage.png",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_csv_paths() -> Vec<String> {
    [
        "Data/colors.csv",
        "Data/parts.csv",
        "Data/sets.csv",
        "Data/minifigs.csv",
        "Data/elements.csv",
        "Data/inventories.csv",
        "Data/inventory_minifigs.csv",
        "Data/inventory_sets.csv",
        "Data/part_categories.csv",
        "Data/part_relationships.csv",
        "Data/themes.csv",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_minifig_paths() -> Vec<String> {
    (1..=28).map(|i| format!("Minifig_png/fig-{i}.png")).collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn config() -> WorkerConfig {
        WorkerConfig::new(Url::parse("https://catalog.example.com/").unwrap())
    }

    #[rstest]
    fn precache_requests_resolve_against_base() {
        let config = config();
        let requests = config.precache_requests();
        assert_eq!(requests.len(), 10);
        assert_eq!(requests[0].url.as_str(), "https://catalog.example.com/");
        assert!(requests
            .iter()
            .any(|r| r.url.as_str().ends_with("/site.webmanifest")));
    }

    #[rstest]
    fn minifig_roster_covers_all_figures() {
        let config = config();
        let requests = config.minifig_requests();
        assert_eq!(requests.len(), 28);
        assert!(requests[0].url.path().ends_with("/Minifig_png/fig-1.png"));
        assert!(requests[27].url.path().ends_with("/Minifig_png/fig-28.png"));
    }

    #[rstest]
    fn shell_fallback_prefers_root_then_index() {
        let keys = config().shell_fallback_keys();
        assert_eq!(keys[0], "https://catalog.example.com/");
        assert_eq!(keys[1], "https://catalog.example.com/index.html");
    }

    #[rstest]
    fn effective_route_policy_fills_shell_paths() {
        let policy = config().effective_route_policy();
        assert!(policy.shell_paths.contains(&"/favicon.ico".to_string()));
        assert!(policy.shell_paths.contains(&"/".to_string()));
    }

    #[rstest]
    fn sweep_trigger_extremes() {
        assert!(SweepTrigger::Always.fires());
        assert!(!SweepTrigger::Never.fires());
        assert!(!SweepTrigger::Probability(0.0).fires());
        assert!(SweepTrigger::Probability(1.1).fires());
    }
}

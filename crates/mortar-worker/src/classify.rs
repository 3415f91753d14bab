#![forbid(unsafe_code)]

//! Asset classification and routing policy.
//!
//! Classification is an ordered, total table: every intercepted request maps
//! to exactly one [`AssetClass`], rows evaluated top-down, last row a
//! catch-all. Precedence (most specific first):
//!
//! 1. navigation
//! 2. precache shell (exact path match)
//! 3. reference-API colors endpoint (direct)
//! 4. reference-API inventory endpoints (direct)
//! 5. generic API path pattern (includes proxy-relayed reference-API calls)
//! 6. CSV data path
//! 7. minifig image path
//! 8. generic image extension
//! 9. static asset extension (css/js/html, root path)
//! 10. known external image CDN host
//! 11. widget asset path
//! 12. default
//!
//! A proxy indicator in the URL demotes a recognized reference-API call from
//! the stale-while-revalidate rows (3, 4) to the network-first row (5): the
//! relayed variant is just another API call.
//!
//! The class → strategy mapping ([`strategy_for`]) is the routing policy and
//! the primary tunable surface.

use mortar_cache::FetchRequest;

/// Reference-API endpoint shapes treated as semi-static reference data.
const COLORS_MARKER: &str = "/api/v3/lego/colors";
const INVENTORY_MARKERS: [(&str, &str); 2] = [
    ("/api/v3/lego/sets/", "/parts"),
    ("/api/v3/lego/minifigs/", "/parts"),
];

/// Generic API-ish path fragments (same-origin catalog endpoints).
const API_PATH_MARKERS: [&str; 4] = ["/api/", "/sets/", "/parts/", "/minifigs/"];

const CSV_DIR_MARKERS: [&str; 2] = ["/Data/", "/Downloads/"];
const MINIFIG_DIR_MARKER: &str = "/Minifig_png/";

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "svg"];
const STATIC_EXTENSIONS: [&str; 3] = ["css", "js", "html"];

/// Request category. Total: every request lands in exactly one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssetClass {
    /// Full-document navigation. Routed to the dedicated navigation handler.
    Navigation,
    /// Exact match against the precached app shell.
    PrecacheShell,
    /// Direct reference-API colors endpoint.
    ApiColors,
    /// Direct reference-API set/minifig inventory endpoint.
    ApiInventory,
    /// Any other API-shaped request, including proxy-relayed reference-API
    /// calls.
    ApiGeneric,
    /// Catalog CSV data file.
    CsvData,
    /// Minifig image.
    MinifigImage,
    /// Any other image by extension.
    GenericImage,
    /// Style/script/markup by extension, or the root path.
    StaticAsset,
    /// Image hosted on a known external CDN.
    CdnImage,
    /// Embedded widget asset.
    WidgetAsset,
    /// Everything else.
    Default,
}

/// Generic read/write policy for a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

/// Strategy assigned to a class. `None` means the dedicated navigation
/// handler, which is not one of the three generic strategies.
#[must_use]
pub fn strategy_for(class: AssetClass) -> Option<Strategy> {
    match class {
        AssetClass::Navigation => None,
        AssetClass::PrecacheShell
        | AssetClass::MinifigImage
        | AssetClass::GenericImage
        | AssetClass::StaticAsset
        | AssetClass::CdnImage
        | AssetClass::WidgetAsset => Some(Strategy::CacheFirst),
        AssetClass::ApiColors | AssetClass::ApiInventory | AssetClass::CsvData => {
            Some(Strategy::StaleWhileRevalidate)
        }
        AssetClass::ApiGeneric | AssetClass::Default => Some(Strategy::NetworkFirst),
    }
}

/// Host/path knobs for classification.
#[derive(Clone, Debug)]
pub struct RoutePolicy {
    /// Host of the third-party reference-data API.
    pub reference_api_host: String,
    /// Substring identifying reference-API calls even when relayed through
    /// a proxy (host check alone misses those).
    pub reference_api_marker: String,
    /// URL substrings marking a CORS-proxy relay.
    pub proxy_indicators: Vec<String>,
    /// Hosts serving catalog images from an external CDN.
    pub cdn_image_hosts: Vec<String>,
    /// Path fragment of embedded widget assets.
    pub widget_marker: String,
    /// Exact URL paths of the precached shell. Filled from the worker
    /// config when left empty.
    pub shell_paths: Vec<String>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            reference_api_host: "rebrickable.com".to_string(),
            reference_api_marker: "rebrickable.com/api/".to_string(),
            proxy_indicators: vec![
                "corsproxy.io".to_string(),
                "cors-anywhere".to_string(),
                "proxy".to_string(),
            ],
            cdn_image_hosts: vec!["cdn.rebrickable.com".to_string()],
            widget_marker: "/widgets/".to_string(),
            shell_paths: Vec::new(),
        }
    }
}

/// Marker-based colors-endpoint check used by forced refresh. Matches
/// proxied forms too: the relayed URL still carries the API marker.
pub(crate) fn is_reference_colors_url(url: &str, policy: &RoutePolicy) -> bool {
    url.contains(&policy.reference_api_marker) && url.contains(COLORS_MARKER)
}

/// Marker-based inventory-endpoint check, proxied forms included.
pub(crate) fn is_reference_inventory_url(url: &str, policy: &RoutePolicy) -> bool {
    url.contains(&policy.reference_api_marker)
        && INVENTORY_MARKERS
            .iter()
            .any(|(a, b)| url.contains(a) && url.contains(b))
}

/// Facts derived once per request; row predicates only read these.
struct Facts {
    path: String,
    host: String,
    is_navigation: bool,
    is_reference_api: bool,
    is_proxied: bool,
    is_colors: bool,
    is_inventory: bool,
}

impl Facts {
    fn of(request: &FetchRequest, policy: &RoutePolicy) -> Self {
        let url_str = request.url.as_str();
        let path = request.url.path().to_string();
        let host = request.url.host_str().unwrap_or_default().to_string();

        let is_reference_api =
            host == policy.reference_api_host || url_str.contains(&policy.reference_api_marker);
        let is_proxied = policy.proxy_indicators.iter().any(|m| url_str.contains(m));
        let is_colors = is_reference_api && url_str.contains(COLORS_MARKER);
        let is_inventory = is_reference_api
            && INVENTORY_MARKERS
                .iter()
                .any(|(a, b)| url_str.contains(a) && url_str.contains(b));

        Self {
            path,
            host,
            is_navigation: request.is_navigation(),
            is_reference_api,
            is_proxied,
            is_colors,
            is_inventory,
        }
    }

    fn extension(&self) -> Option<String> {
        let segment = self.path.rsplit('/').next()?;
        let (_, ext) = segment.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }
}

type Predicate = fn(&Facts, &RoutePolicy) -> bool;

struct Row {
    name: &'static str,
    class: AssetClass,
    predicate: Predicate,
}

static ROWS: &[Row] = &[
    Row {
        name: "navigation",
        class: AssetClass::Navigation,
        predicate: |f, _| f.is_navigation,
    },
    Row {
        name: "precache-shell",
        class: AssetClass::PrecacheShell,
        predicate: |f, p| p.shell_paths.iter().any(|s| *s == f.path),
    },
    Row {
        name: "api-colors",
        class: AssetClass::ApiColors,
        predicate: |f, _| f.is_colors && !f.is_proxied,
    },
    Row {
        name: "api-inventory",
        class: AssetClass::ApiInventory,
        predicate: |f, _| f.is_inventory && !f.is_proxied,
    },
    Row {
        name: "api-generic",
        class: AssetClass::ApiGeneric,
        predicate: |f, _| {
            f.is_reference_api || API_PATH_MARKERS.iter().any(|m| f.path.contains(m))
        },
    },
    Row {
        name: "csv-data",
        class: AssetClass::CsvData,
        predicate: |f, _| {
            CSV_DIR_MARKERS.iter().any(|m| f.path.contains(m))
                && f.path.to_ascii_lowercase().ends_with(".csv")
        },
    },
    Row {
        name: "minifig-image",
        class: AssetClass::MinifigImage,
        predicate: |f, _| f.path.contains(MINIFIG_DIR_MARKER),
    },
    Row {
        name: "generic-image",
        class: AssetClass::GenericImage,
        predicate: |f, _| {
            f.extension()
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        },
    },
    Row {
        name: "static-asset",
        class: AssetClass::StaticAsset,
        predicate: |f, _| {
            f.path == "/"
                || f.extension()
                    .is_some_and(|ext| STATIC_EXTENSIONS.contains(&ext.as_str()))
        },
    },
    Row {
        name: "cdn-image",
        class: AssetClass::CdnImage,
        predicate: |f, p| p.cdn_image_hosts.iter().any(|h| *h == f.host),
    },
    Row {
        name: "widget-asset",
        class: AssetClass::WidgetAsset,
        predicate: |f, p| f.path.contains(&p.widget_marker),
    },
    Row {
        name: "default",
        class: AssetClass::Default,
        predicate: |_, _| true,
    },
];

/// The ordered classification table.
///
/// Pure and deterministic: classification depends only on the request's
/// URL, mode, and destination, never on cache or network state.
#[derive(Clone, Debug)]
pub struct RouteTable {
    policy: RoutePolicy,
}

impl RouteTable {
    #[must_use]
    pub fn new(policy: RoutePolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Classify a request. Total: always returns a class.
    #[must_use]
    pub fn classify(&self, request: &FetchRequest) -> AssetClass {
        let facts = Facts::of(request, &self.policy);
        for row in ROWS {
            if (row.predicate)(&facts, &self.policy) {
                return row.class;
            }
        }
        // The last row is a catch-all.
        AssetClass::Default
    }

    /// True if a direct (non-proxied) reference-API call, the kind the
    /// `bypass_direct_api` policy leaves to the platform's native fetch.
    #[must_use]
    pub fn is_direct_reference_api(&self, request: &FetchRequest) -> bool {
        let facts = Facts::of(request, &self.policy);
        facts.is_reference_api && !facts.is_proxied
    }

    /// Row names in evaluation order, for inspection.
    #[must_use]
    pub fn row_names() -> Vec<&'static str> {
        ROWS.iter().map(|r| r.name).collect()
    }
}

#![forbid(unsafe_code)]

//! # Mortar
//!
//! Facade crate providing a unified API for offline-first catalog caching.
//!
//! ## Quick start
//!
//! ```ignore
//! use mortar::prelude::*;
//!
//! let config = WorkerConfig::new("https://catalog.example.com/".parse()?);
//! let worker = Worker::new(config, CacheStorage::new(), HttpClient::new(NetOptions::default()));
//!
//! worker.install().await;
//! worker.activate().await;
//!
//! // Intercept a request; `None` means "let it through".
//! let request = FetchRequest::get("https://catalog.example.com/Data/parts.csv".parse()?);
//! if let Some(response) = worker.handle_fetch(&request).await {
//!     println!("{}", response.status);
//! }
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod cache {
    pub use mortar_cache::*;
}

pub mod net {
    pub use mortar_net::*;
}

pub mod worker {
    pub use mortar_worker::*;
}

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use mortar_cache::{
        canonical_key, CacheNamespace, CacheStorage, Destination, FetchRequest, Headers, Method,
        RequestMode, ResponseKind, StoredResponse,
    };
    pub use mortar_net::{HttpClient, Net, NetError, NetOptions, NetResult};
    pub use mortar_worker::{
        strategy_for, AssetClass, CachePolicy, ClientMessage, ControlEnvelope, ControlMessage,
        Phase, RoutePolicy, RouteTable, Strategy, SweepTrigger, VersionSource, Worker,
        WorkerConfig, WorkerError, WorkerResult,
    };
}

#![forbid(unsafe_code)]

//! # mortar-worker
//!
//! Offline caching worker for a catalog client: intercepts GET requests,
//! classifies them, and serves them through cache-first, network-first, or
//! stale-while-revalidate policies backed by versioned cache namespaces.
//!
//! ## Shape
//!
//! - [`VersionResolver`] names the active cache namespace (static string or
//!   fetched version manifest; degrades to a default, never fails).
//! - [`Worker::install`] precaches the app shell best-effort and forces
//!   immediate activation eligibility.
//! - [`Worker::activate`] evicts orphaned namespaces (prefix-scoped) and
//!   claims clients.
//! - [`RouteTable`] is the ordered, total classification table; the
//!   class → strategy mapping is the routing policy.
//! - Strategies always resolve to *some* response: failures synthesize a
//!   503 JSON body (or a literal offline page for navigations) instead of
//!   propagating.
//! - Control messages ([`ControlMessage`]) mutate cache state out of band;
//!   unknown message types are ignored for forward compatibility.
//!
//! Background revalidation and maintenance sweeps run as detached tasks on
//! a [`tokio_util::task::TaskTracker`]; their failures are logged and
//! swallowed, never surfaced on the request path. The platform may drop the
//! worker between events; a lost in-flight revalidation just means the next
//! matching request revalidates again.

mod classify;
mod config;
mod control;
mod error;
mod events;
mod lifecycle;
mod maintenance;
mod strategy;
pub mod testing;
mod version;
mod worker;

pub use classify::{strategy_for, AssetClass, RoutePolicy, RouteTable, Strategy};
pub use config::{CachePolicy, SweepTrigger, WorkerConfig};
pub use control::{ControlEnvelope, ControlMessage};
pub use error::{WorkerError, WorkerResult};
pub use events::{ClientBus, ClientMessage};
pub use lifecycle::Phase;
pub use version::{VersionResolver, VersionSource, DEFAULT_VERSION};
pub use worker::Worker;

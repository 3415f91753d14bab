#![forbid(unsafe_code)]

//! # mortar-net
//!
//! Thin HTTP fetch layer for the offline worker.
//!
//! The [`Net`] trait is the seam the worker's strategies talk through: one
//! call, one full [`mortar_cache::StoredResponse`]. Non-2xx statuses come
//! back as responses (fetch semantics — the caller decides what an error
//! status means); only transport-level failures are [`NetError`].
//!
//! [`Net::fetch_no_store`] carries cache-bypass semantics for forced
//! refreshes and version-manifest reads: intermediaries are told not to
//! serve or keep a copy.

mod client;
mod error;
mod traits;
mod types;

pub use client::HttpClient;
pub use error::{NetError, NetResult};
pub use traits::Net;
pub use types::NetOptions;

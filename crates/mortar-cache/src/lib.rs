#![forbid(unsafe_code)]

//! # mortar-cache
//!
//! Versioned, in-memory request→response cache namespaces.
//!
//! ## Model
//!
//! [`CacheStorage`] is a registry of named [`CacheNamespace`]s. Exactly one
//! namespace is "active" at a time (the worker decides which); older
//! namespaces are orphaned on a version bump and deleted during activation.
//!
//! A namespace maps a canonicalized request URL to a [`StoredResponse`].
//! Writes are idempotent overwrites; enumeration order approximates
//! first-insert age, which is what eviction sweeps rely on.
//!
//! Entries carry no TTL. Staleness is bounded only by eviction and by
//! background revalidation in higher layers.
//!
//! All operations are infallible: the store is process-memory behind cheap
//! clonable handles, so there is nothing to propagate.

mod namespace;
mod request;
mod response;
mod storage;

pub use namespace::CacheNamespace;
pub use request::{canonical_key, Destination, FetchRequest, Method, RequestMode};
pub use response::{Headers, ResponseKind, StoredResponse};
pub use storage::CacheStorage;

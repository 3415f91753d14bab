#![forbid(unsafe_code)]

//! Request identity and metadata.
//!
//! Cache entries are keyed by [`canonical_key`]: the request URL with the
//! fragment stripped (a fragment never reaches the server, so two requests
//! differing only in fragment are the same resource). Query strings are
//! significant and kept.
//!
//! This module only derives identity; it performs no I/O.

use url::Url;

/// HTTP method. Only GET requests are ever served from cache; everything
/// else passes through to the network untouched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Other,
}

/// How the request was initiated, mirroring the platform request mode.
///
/// `Navigate` marks full-document loads (address bar, link follow, reload);
/// those get a dedicated handling path because losing a usable document
/// offline is the highest-impact failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    Cors,
    NoCors,
}

/// What kind of content the requester expects.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Destination {
    Document,
    Image,
    Script,
    Style,
    Data,
    Other,
}

/// An intercepted request: URL plus the metadata classification needs.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchRequest {
    pub url: Url,
    pub method: Method,
    pub mode: RequestMode,
    pub destination: Destination,
}

impl FetchRequest {
    /// A plain same-origin GET.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: Method::Get,
            mode: RequestMode::SameOrigin,
            destination: Destination::Other,
        }
    }

    /// A full-document navigation GET.
    #[must_use]
    pub fn navigate(url: Url) -> Self {
        Self {
            url,
            method: Method::Get,
            mode: RequestMode::Navigate,
            destination: Destination::Document,
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Cache key for this request.
    #[must_use]
    pub fn key(&self) -> String {
        canonical_key(&self.url)
    }

    #[must_use]
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
            || (self.destination == Destination::Document && self.method == Method::Get)
    }
}

/// Canonical cache key for a URL: serialized form with the fragment removed.
#[must_use]
pub fn canonical_key(url: &Url) -> String {
    if url.fragment().is_none() {
        return url.as_str().to_string();
    }
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

#![forbid(unsafe_code)]

use std::collections::HashMap;

use bytes::Bytes;

/// String header map with case-insensitive lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Insert a header. Names are stored lowercase.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.inner.insert(key.into().to_ascii_lowercase(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<HashMap<String, String>> for Headers {
    fn from(map: HashMap<String, String>) -> Self {
        let mut headers = Self::new();
        for (k, v) in map {
            headers.insert(k, v);
        }
        headers
    }
}

/// Visibility class of a stored response.
///
/// `Opaque` models a cross-origin response whose status and body are not
/// inspectable by the caller. Whether such responses are cached at all is a
/// policy decision made by the worker, not by this crate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResponseKind {
    Basic,
    Opaque,
}

/// An HTTP response as held by a cache namespace.
///
/// Bodies are [`Bytes`], so clones are cheap and a stored entry can be
/// handed out repeatedly without re-reading anything (unlike a live response
/// body, which is single-read — callers clone *before* storing).
#[derive(Clone, Debug, PartialEq)]
pub struct StoredResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
    pub kind: ResponseKind,
}

impl StoredResponse {
    /// A 200 OK response with the given body.
    #[must_use]
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::with_status(200, "OK", body)
    }

    #[must_use]
    pub fn with_status(status: u16, status_text: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status_text.to_string(),
            headers: Headers::new(),
            body: body.into(),
            kind: ResponseKind::Basic,
        }
    }

    /// An opaque cross-origin response: status 0, empty body, nothing to
    /// inspect.
    #[must_use]
    pub fn opaque() -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: Headers::new(),
            body: Bytes::new(),
            kind: ResponseKind::Opaque,
        }
    }

    /// Builder-style header attach.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// True for 2xx statuses. Always false for opaque responses.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.kind == ResponseKind::Basic && (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.kind == ResponseKind::Opaque
    }

    /// Body as lossy UTF-8, for diagnostics and tests.
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

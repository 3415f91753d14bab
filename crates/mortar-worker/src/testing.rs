#![forbid(unsafe_code)]

//! Scripted [`Net`] mock for worker tests.
//!
//! A manual mock rather than a mock crate: strategy tests need per-URL
//! scripts, call recording, and a hang-forever mode to prove that the
//! stale-while-revalidate path never blocks on the network. That is easier
//! to express (and read) as a small hand-rolled type.

use std::collections::HashMap;

use async_trait::async_trait;
use mortar_cache::{FetchRequest, StoredResponse};
use mortar_net::{Net, NetError, NetResult};
use parking_lot::Mutex;

/// What a scripted URL does when fetched.
#[derive(Clone, Debug)]
pub enum Scripted {
    /// Return this response.
    Respond(StoredResponse),
    /// Fail with a transport error.
    Fail,
    /// Never resolve. Used to prove a code path does not await the network.
    Hang,
}

/// One recorded fetch.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub key: String,
    pub no_store: bool,
}

/// Scripted network: URL → behavior, with call recording.
///
/// Unscripted URLs fail with a transport error (the worker must treat an
/// unreachable network as routine).
#[derive(Default)]
pub struct MockNet {
    scripts: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockNet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a URL to return a response on every fetch.
    pub fn respond(&self, url: &str, response: StoredResponse) {
        self.script(url, Scripted::Respond(response));
    }

    /// Script a URL to fail with a transport error.
    pub fn fail(&self, url: &str) {
        self.script(url, Scripted::Fail);
    }

    /// Script a URL to hang forever.
    pub fn hang(&self, url: &str) {
        self.script(url, Scripted::Hang);
    }

    pub fn script(&self, url: &str, behavior: Scripted) {
        self.scripts.lock().insert(url.to_string(), behavior);
    }

    /// All fetches seen so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of fetches for one URL.
    #[must_use]
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.key == url).count()
    }

    async fn run(&self, request: &FetchRequest, no_store: bool) -> NetResult<StoredResponse> {
        let key = request.key();
        self.calls.lock().push(RecordedCall {
            key: key.clone(),
            no_store,
        });

        let behavior = self.scripts.lock().get(&key).cloned();
        match behavior {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Hang) => {
                futures::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
            Some(Scripted::Fail) | None => Err(NetError::http(format!("unreachable: {key}"))),
        }
    }
}

#[async_trait]
impl Net for MockNet {
    async fn fetch(&self, request: &FetchRequest) -> NetResult<StoredResponse> {
        self.run(request, false).await
    }

    async fn fetch_no_store(&self, request: &FetchRequest) -> NetResult<StoredResponse> {
        self.run(request, true).await
    }
}

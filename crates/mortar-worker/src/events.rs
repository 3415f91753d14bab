#![forbid(unsafe_code)]

use tokio::sync::broadcast;

/// Message broadcast from the worker to every controlled page.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClientMessage {
    /// Control transferred to a new worker version; pages should reload.
    ReloadPage,
}

impl ClientMessage {
    /// Wire form posted to pages.
    #[must_use]
    pub fn to_value(self) -> serde_json::Value {
        match self {
            Self::ReloadPage => serde_json::json!({ "type": "RELOAD_PAGE" }),
        }
    }
}

/// Broadcast bus from the worker to its clients.
///
/// `broadcast()` is a sync call, safe from any context. With no subscribers
/// the message is silently dropped — a worker with no open pages has no one
/// to tell.
#[derive(Clone, Debug)]
pub struct ClientBus {
    tx: broadcast::Sender<ClientMessage>,
}

impl ClientBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn broadcast(&self, message: ClientMessage) {
        let _ = self.tx.send(message);
    }

    /// Subscribe to all future messages. Each subscriber gets an
    /// independent receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientMessage> {
        self.tx.subscribe()
    }
}

#![forbid(unsafe_code)]

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::{request::FetchRequest, response::StoredResponse};

struct Slot {
    seq: u64,
    response: StoredResponse,
}

#[derive(Default)]
struct NamespaceState {
    entries: HashMap<String, Slot>,
    next_seq: u64,
}

/// One named cache namespace: canonical URL → stored response.
///
/// ## Normative
/// - Writes are idempotent overwrites keyed by request identity; the last
///   writer for a key wins, no coordination needed.
/// - An overwrite keeps the entry's original slot, so [`keys`](Self::keys)
///   enumerates in first-insert order. Eviction sweeps treat that order as
///   age, approximating the platform cache enumeration order.
/// - Handles are cheap clones sharing one store.
#[derive(Clone)]
pub struct CacheNamespace {
    name: Arc<str>,
    state: Arc<Mutex<NamespaceState>>,
}

impl std::fmt::Debug for CacheNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheNamespace")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}

impl CacheNamespace {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            state: Arc::new(Mutex::new(NamespaceState::default())),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a response under the request's canonical key.
    pub fn put(&self, request: &FetchRequest, response: StoredResponse) {
        self.put_key(&request.key(), response);
    }

    /// Store a response under an already-canonical key.
    pub fn put_key(&self, key: &str, response: StoredResponse) {
        let mut state = self.state.lock();
        if let Some(slot) = state.entries.get_mut(key) {
            // Overwrite in place: the slot keeps its age.
            slot.response = response;
            return;
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(key.to_string(), Slot { seq, response });
    }

    /// Look up a response for the request. Returns a clone; the stored entry
    /// stays usable for later matches.
    #[must_use]
    pub fn match_request(&self, request: &FetchRequest) -> Option<StoredResponse> {
        self.match_key(&request.key())
    }

    #[must_use]
    pub fn match_key(&self, key: &str) -> Option<StoredResponse> {
        let state = self.state.lock();
        state.entries.get(key).map(|slot| slot.response.clone())
    }

    /// All keys, oldest first.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut keyed: Vec<(u64, &String)> = state
            .entries
            .iter()
            .map(|(key, slot)| (slot.seq, key))
            .collect();
        keyed.sort_unstable_by_key(|(seq, _)| *seq);
        keyed.into_iter().map(|(_, key)| key.clone()).collect()
    }

    /// Remove an entry. Returns whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        self.state.lock().entries.remove(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

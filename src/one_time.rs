use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::ids::{new_id, now_ms};

pub const OTM_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;
pub const FILE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// One-time message vault: ciphertext strings, readable exactly once.
pub type OtmStore = OneTimeStore<String>;
/// One-time file vault: raw bytes, downloadable exactly once.
pub type FileStore = OneTimeStore<Vec<u8>>;

struct Entry<T> {
    payload: T,
    created_at: i64,
}

/// A one-shot vault. Each entry is consumed by its first `take` and expires
/// after the store's TTL; a taken and an expired entry are indistinguishable
/// to callers.
#[derive(Clone)]
pub struct OneTimeStore<T> {
    ttl_ms: i64,
    entries: Arc<Mutex<HashMap<String, Entry<T>>>>,
}

impl<T> OneTimeStore<T> {
    pub fn new(ttl_ms: i64) -> Self {
        OneTimeStore {
            ttl_ms,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store a payload under a fresh id.
    pub fn put(&self, payload: T) -> String {
        let id = new_id();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            id.clone(),
            Entry {
                payload,
                created_at: now_ms(),
            },
        );
        id
    }

    /// Atomic compare-and-delete. The entry is removed under the lock, so of
    /// two concurrent takes exactly one observes the payload. An entry past
    /// its TTL is gone even if the sweeper has not visited yet.
    pub fn take(&self, id: &str) -> Option<T> {
        let entry = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.remove(id)
        }?;
        if now_ms() - entry.created_at > self.ttl_ms {
            return None;
        }
        Some(entry.payload)
    }

    /// Drop entries past TTL. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = now_ms();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, e| now - e.created_at <= self.ttl_ms);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

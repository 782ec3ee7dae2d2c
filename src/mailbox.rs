use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::ids::now_ms;
use crate::models::QueuedMessage;

pub const MESSAGE_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Delivered,
    /// The mailbox already holds this message id; the retry is a no-op.
    Duplicate,
}

/// Per-fingerprint store-and-forward queues. The mailbox is the source of
/// truth for delivery; live socket pushes are an optimization layered on top.
#[derive(Clone)]
pub struct Mailboxes {
    ttl_ms: i64,
    boxes: Arc<Mutex<HashMap<String, Vec<QueuedMessage>>>>,
}

impl Mailboxes {
    pub fn new() -> Self {
        Self::with_ttl(MESSAGE_TTL_MS)
    }

    pub fn with_ttl(ttl_ms: i64) -> Self {
        Mailboxes {
            ttl_ms,
            boxes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Append to the recipient's mailbox unless the message id is already
    /// present. The dedup check and the append share one locked section, so
    /// a concurrent retry can never double-store.
    pub fn enqueue(&self, to: &str, msg: QueuedMessage) -> EnqueueOutcome {
        let mut boxes = self.boxes.lock().unwrap_or_else(|e| e.into_inner());
        let mailbox = boxes.entry(to.to_string()).or_default();
        if mailbox.iter().any(|m| m.id == msg.id) {
            return EnqueueOutcome::Duplicate;
        }
        mailbox.push(msg);
        EnqueueOutcome::Delivered
    }

    /// All pending, non-expired messages in insertion order. Does not mutate;
    /// removal happens only through `ack` or the sweeper.
    pub fn fetch(&self, fingerprint: &str) -> Vec<QueuedMessage> {
        let now = now_ms();
        let boxes = self.boxes.lock().unwrap_or_else(|e| e.into_inner());
        boxes
            .get(fingerprint)
            .map(|mailbox| {
                mailbox
                    .iter()
                    .filter(|m| now - m.timestamp <= self.ttl_ms)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove exactly the named ids. An emptied mailbox is dropped from the
    /// map entirely.
    pub fn ack(&self, fingerprint: &str, ids: &[String]) {
        let mut boxes = self.boxes.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mailbox) = boxes.get_mut(fingerprint) {
            mailbox.retain(|m| !ids.contains(&m.id));
            if mailbox.is_empty() {
                boxes.remove(fingerprint);
            }
        }
    }

    /// Drop expired messages and emptied mailboxes. Returns how many
    /// messages were dropped.
    pub fn sweep(&self) -> usize {
        let now = now_ms();
        let mut boxes = self.boxes.lock().unwrap_or_else(|e| e.into_inner());
        let mut dropped = 0;
        boxes.retain(|_, mailbox| {
            let before = mailbox.len();
            mailbox.retain(|m| now - m.timestamp <= self.ttl_ms);
            dropped += before - mailbox.len();
            !mailbox.is_empty()
        });
        dropped
    }

    /// Number of fingerprints with a pending mailbox.
    pub fn mailbox_count(&self) -> usize {
        self.boxes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for Mailboxes {
    fn default() -> Self {
        Self::new()
    }
}

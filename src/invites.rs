use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::ids::now_ms;
use crate::models::InviteView;

pub const DEFAULT_INVITE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Two-party key-bundle rendezvous. The creator parks a public key bundle
/// under a client-chosen id; exactly one claimer may attach a counterpart
/// bundle, after which the record is readable by both sides until it expires.
struct InviteEntry {
    creator_bundle: String,
    claimer_bundle: Option<String>,
    expires_at: i64,
    claimed: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Duplicate,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Carries the creator's bundle.
    Claimed(String),
    Gone,
    AlreadyClaimed,
}

#[derive(Clone, Default)]
pub struct InviteStore {
    entries: Arc<Mutex<HashMap<String, InviteEntry>>>,
}

impl InviteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a creator bundle. The invite id is client-chosen; reusing a live
    /// one is a conflict.
    pub fn create(
        &self,
        invite_id: &str,
        creator_bundle: String,
        expires_at: Option<i64>,
    ) -> CreateOutcome {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.contains_key(invite_id) {
            return CreateOutcome::Duplicate;
        }
        entries.insert(
            invite_id.to_string(),
            InviteEntry {
                creator_bundle,
                claimer_bundle: None,
                expires_at: expires_at.unwrap_or_else(|| now_ms() + DEFAULT_INVITE_TTL_MS),
                claimed: false,
            },
        );
        CreateOutcome::Created
    }

    /// Read-only view, valid before and after the claim. Expired entries are
    /// deleted on sight.
    pub fn get(&self, invite_id: &str) -> Option<InviteView> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let expired = entries.get(invite_id).map(|e| now_ms() > e.expires_at)?;
        if expired {
            entries.remove(invite_id);
            return None;
        }
        entries.get(invite_id).map(|e| InviteView {
            invite_id: invite_id.to_string(),
            public_key_bundle: e.creator_bundle.clone(),
            claimed: e.claimed,
            claimer_bundle: e.claimer_bundle.clone(),
        })
    }

    /// The only transition out of `unclaimed`, and it fires exactly once:
    /// the whole check-and-set runs under the store lock.
    pub fn claim(&self, invite_id: &str, claimer_bundle: String) -> ClaimOutcome {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let expired = match entries.get(invite_id) {
            None => return ClaimOutcome::Gone,
            Some(e) => now_ms() > e.expires_at,
        };
        if expired {
            entries.remove(invite_id);
            return ClaimOutcome::Gone;
        }
        let Some(entry) = entries.get_mut(invite_id) else {
            return ClaimOutcome::Gone;
        };
        if entry.claimed {
            return ClaimOutcome::AlreadyClaimed;
        }
        entry.claimed = true;
        entry.claimer_bundle = Some(claimer_bundle);
        ClaimOutcome::Claimed(entry.creator_bundle.clone())
    }

    /// Drop entries past their expiry. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = now_ms();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, e| now <= e.expires_at);
        before - entries.len()
    }
}

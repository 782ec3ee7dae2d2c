use serde::Serialize;

use crate::invites::InviteStore;
use crate::mailbox::Mailboxes;
use crate::one_time::{FileStore, OtmStore};

/// Interval between TTL sweeps (seconds).
const SWEEP_INTERVAL_SECS: u64 = 60;

/// Result of one sweep across every store.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub otm_expired: usize,
    pub files_expired: usize,
    pub invites_expired: usize,
    pub messages_expired: usize,
}

impl SweepResult {
    pub fn total(&self) -> usize {
        self.otm_expired + self.files_expired + self.invites_expired + self.messages_expired
    }
}

/// Spawns a background task that periodically drops expired entries from the
/// one-time stores, the invite store, and the mailboxes.
pub fn spawn_sweep_task(
    otm: OtmStore,
    files: FileStore,
    invites: InviteStore,
    mailboxes: Mailboxes,
) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS)).await;
            run_sweep(&otm, &files, &invites, &mailboxes);
        }
    });
}

/// Execute one sweep. Reused by the manual `/admin/sweep` trigger.
pub fn run_sweep(
    otm: &OtmStore,
    files: &FileStore,
    invites: &InviteStore,
    mailboxes: &Mailboxes,
) -> SweepResult {
    let result = SweepResult {
        otm_expired: otm.sweep(),
        files_expired: files.sweep(),
        invites_expired: invites.sweep(),
        messages_expired: mailboxes.sweep(),
    };
    if result.total() > 0 {
        eprintln!(
            "🧹 Sweep: dropped {} expired entries (otm={}, files={}, invites={}, messages={})",
            result.total(),
            result.otm_expired,
            result.files_expired,
            result.invites_expired,
            result.messages_expired
        );
    }
    result
}

use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex};

pub const ROOMS_CREATED: &str = "rooms_created";
pub const OTM_CREATED: &str = "otm_created";
pub const FILES_CREATED: &str = "files_created";
pub const CHAT_INVITES_CREATED: &str = "chat_invites_created";
pub const CHAT_MESSAGES_SENT: &str = "chat_messages_sent";

const ALL_COUNTERS: [&str; 5] = [
    ROOMS_CREATED,
    OTM_CREATED,
    FILES_CREATED,
    CHAT_INVITES_CREATED,
    CHAT_MESSAGES_SENT,
];

#[derive(Debug)]
pub enum TotalsError {
    /// No sink configured; `/metrics` answers 503.
    Disabled,
    Read(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsSnapshot {
    pub rooms_created: i64,
    pub otm_created: i64,
    pub files_created: i64,
    pub chat_invites_created: i64,
    pub chat_messages_sent: i64,
}

/// Usage totals, the only state that survives a restart. Increments are
/// fire-and-forget; a write failure is logged and the request proceeds.
#[derive(Clone)]
pub struct Totals {
    conn: Option<Arc<Mutex<Connection>>>,
}

impl Totals {
    /// `None` means no sink is configured: increments become no-ops and
    /// reads report `Disabled`.
    pub fn new(path: Option<&str>) -> Self {
        let Some(path) = path else {
            return Totals { conn: None };
        };
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path).expect("Failed to open totals sink");
        Self::migrate(&conn);
        Totals {
            conn: Some(Arc::new(Mutex::new(conn))),
        }
    }

    fn migrate(conn: &Connection) {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             CREATE TABLE IF NOT EXISTS totals (
                name TEXT PRIMARY KEY,
                value INTEGER NOT NULL
             );",
        )
        .expect("Failed to migrate totals sink");

        // Every counter row exists from startup, at zero.
        for name in ALL_COUNTERS {
            conn.execute(
                "INSERT OR IGNORE INTO totals (name, value) VALUES (?1, 0)",
                [name],
            )
            .expect("Failed to seed totals");
        }
    }

    pub fn increment(&self, name: &str) {
        let Some(conn) = &self.conn else { return };
        let conn = conn.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = conn.execute("UPDATE totals SET value = value + 1 WHERE name = ?1", [name])
        {
            eprintln!("⚠️  Totals increment failed for {name}: {e}");
        }
    }

    pub fn read(&self) -> Result<TotalsSnapshot, TotalsError> {
        let Some(conn) = &self.conn else {
            return Err(TotalsError::Disabled);
        };
        let conn = conn.lock().unwrap_or_else(|e| e.into_inner());
        let get = |name: &str| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT value FROM totals WHERE name = ?1", [name], |r| {
                r.get(0)
            })
        };
        let snapshot = (|| {
            Ok::<_, rusqlite::Error>(TotalsSnapshot {
                rooms_created: get(ROOMS_CREATED)?,
                otm_created: get(OTM_CREATED)?,
                files_created: get(FILES_CREATED)?,
                chat_invites_created: get(CHAT_INVITES_CREATED)?,
                chat_messages_sent: get(CHAT_MESSAGES_SENT)?,
            })
        })()
        .map_err(|e| TotalsError::Read(e.to_string()))?;
        Ok(snapshot)
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rocket_ws as ws;
use tokio::sync::mpsc::UnboundedSender;

use crate::models::QueuedMessage;

struct ChatConn {
    conn_id: String,
    tx: UnboundedSender<ws::Message>,
}

/// Live chat sockets, one per fingerprint. Registration is last-writer-wins:
/// a new socket for the same fingerprint silently displaces the old mapping.
#[derive(Clone, Default)]
pub struct ChatSockets {
    conns: Arc<Mutex<HashMap<String, ChatConn>>>,
}

impl ChatSockets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, fingerprint: &str, conn_id: &str, tx: UnboundedSender<ws::Message>) {
        let mut conns = self.conns.lock().unwrap_or_else(|e| e.into_inner());
        conns.insert(
            fingerprint.to_string(),
            ChatConn {
                conn_id: conn_id.to_string(),
                tx,
            },
        );
    }

    /// Clear the mapping, but only if `conn_id` still owns it. A close
    /// arriving from a displaced socket must not evict its replacement.
    pub fn remove(&self, fingerprint: &str, conn_id: &str) {
        let mut conns = self.conns.lock().unwrap_or_else(|e| e.into_inner());
        if conns
            .get(fingerprint)
            .is_some_and(|c| c.conn_id == conn_id)
        {
            conns.remove(fingerprint);
        }
    }

    /// Best-effort live push. The mailbox already holds the message, so a
    /// failed or absent socket costs nothing.
    pub fn push_new_message(&self, fingerprint: &str, msg: &QueuedMessage) {
        let conns = self.conns.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(conn) = conns.get(fingerprint) {
            let frame = serde_json::json!({
                "type": "newMessage",
                "message": { "id": msg.id, "from": msg.from, "payload": msg.payload },
            });
            let _ = conn.tx.send(ws::Message::Text(frame.to_string()));
        }
    }
}

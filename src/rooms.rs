use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rocket_ws as ws;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// How long an empty room stays addressable before it is destroyed.
pub const DESTROY_GRACE: Duration = Duration::from_secs(5);

struct Room {
    members: HashMap<String, UnboundedSender<ws::Message>>,
    destroy_timer: Option<JoinHandle<()>>,
}

#[derive(Debug)]
pub enum JoinOutcome {
    Joined { created: bool },
    /// The room id was burned earlier in this process lifetime.
    Burned,
}

/// Ephemeral room registry. Members are held as outbound frame senders, so
/// fan-out never blocks on a slow peer and every critical section is a plain
/// lock-and-release. Burned ids accumulate for the life of the process.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<Mutex<HashMap<String, Room>>>,
    burned: Arc<Mutex<HashSet<String>>>,
    grace: Duration,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_grace(DESTROY_GRACE)
    }

    /// A registry with a custom destruction grace period.
    pub fn with_grace(grace: Duration) -> Self {
        RoomRegistry {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            burned: Arc::new(Mutex::new(HashSet::new())),
            grace,
        }
    }

    pub fn is_burned(&self, room_id: &str) -> bool {
        self.burned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(room_id)
    }

    /// True while the room is addressable (members present or destruction
    /// timer still pending).
    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(room_id)
    }

    /// Add a member. Burned ids are rejected outright; otherwise the room is
    /// created on demand, a pending destruction timer is cancelled, and a
    /// presence frame goes to every member, the newcomer included.
    pub fn join(
        &self,
        room_id: &str,
        member_id: &str,
        tx: UnboundedSender<ws::Message>,
    ) -> JoinOutcome {
        let (created, recipients, count) = {
            let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
            // Checked under the rooms lock: burn seals the id before it
            // touches this map, so a sealed id can never be re-inserted here.
            if self.is_burned(room_id) {
                return JoinOutcome::Burned;
            }
            let created = !rooms.contains_key(room_id);
            let room = rooms.entry(room_id.to_string()).or_insert_with(|| Room {
                members: HashMap::new(),
                destroy_timer: None,
            });
            if let Some(timer) = room.destroy_timer.take() {
                timer.abort();
            }
            room.members.insert(member_id.to_string(), tx);
            let recipients: Vec<_> = room.members.values().cloned().collect();
            (created, recipients, room.members.len())
        };
        let frame = Self::presence_frame(room_id, count);
        for tx in recipients {
            let _ = tx.send(frame.clone());
        }
        JoinOutcome::Joined { created }
    }

    /// Forward a frame verbatim to every other member. The frame is never
    /// inspected here; routing decisions happen before relay is called.
    pub fn relay(&self, room_id: &str, sender_id: &str, frame: ws::Message) {
        let recipients: Vec<_> = {
            let rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
            rooms
                .get(room_id)
                .map(|room| {
                    room.members
                        .iter()
                        .filter(|(id, _)| id.as_str() != sender_id)
                        .map(|(_, tx)| tx.clone())
                        .collect()
                })
                .unwrap_or_default()
        };
        for tx in recipients {
            let _ = tx.send(frame.clone());
        }
    }

    /// Burn protocol: seal the id against rejoins, tell every member
    /// (sender included) that the room is gone, close their sockets, and
    /// drop the room.
    pub fn burn(&self, room_id: &str) {
        self.burned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(room_id.to_string());
        let members: Vec<_> = {
            let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
            match rooms.remove(room_id) {
                Some(room) => {
                    if let Some(timer) = room.destroy_timer {
                        timer.abort();
                    }
                    room.members.into_values().collect()
                }
                None => Vec::new(),
            }
        };
        let destroyed = Self::destroyed_frame(room_id);
        for tx in members {
            let _ = tx.send(destroyed.clone());
            let _ = tx.send(ws::Message::Close(None));
        }
    }

    /// Drop a member. The remainder hears updated presence; an emptied room
    /// gets a destruction timer instead of dying immediately, so a quick
    /// rejoin keeps it alive.
    pub fn leave(&self, room_id: &str, member_id: &str) {
        let survivors = {
            let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
            let Some(room) = rooms.get_mut(room_id) else {
                return;
            };
            room.members.remove(member_id);
            if room.members.is_empty() {
                let registry = self.clone();
                let rid = room_id.to_string();
                room.destroy_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(registry.grace).await;
                    registry.remove_if_empty(&rid);
                }));
                None
            } else {
                let recipients: Vec<_> = room.members.values().cloned().collect();
                Some((recipients, room.members.len()))
            }
        };
        if let Some((recipients, count)) = survivors {
            let frame = Self::presence_frame(room_id, count);
            for tx in recipients {
                let _ = tx.send(frame.clone());
            }
        }
    }

    fn remove_if_empty(&self, room_id: &str) {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        if rooms.get(room_id).is_some_and(|r| r.members.is_empty()) {
            rooms.remove(room_id);
        }
    }

    pub fn presence_frame(room_id: &str, count: usize) -> ws::Message {
        ws::Message::Text(
            serde_json::json!({"type": "presence", "roomId": room_id, "count": count}).to_string(),
        )
    }

    pub fn destroyed_frame(room_id: &str) -> ws::Message {
        ws::Message::Text(
            serde_json::json!({"type": "roomDestroyed", "roomId": room_id}).to_string(),
        )
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

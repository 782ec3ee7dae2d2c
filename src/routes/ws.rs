use rocket::futures::{SinkExt, StreamExt};
use rocket::{get, FromForm, State};
use rocket_ws as ws;
use tokio::sync::mpsc;

use crate::ids;
use crate::live::ChatSockets;
use crate::mailbox::Mailboxes;
use crate::rooms::{JoinOutcome, RoomRegistry};
use crate::totals::{self, Totals};

#[derive(FromForm)]
pub struct WsQuery {
    #[field(name = "roomId")]
    room_id: Option<String>,
    #[field(name = "chatFingerprint")]
    chat_fingerprint: Option<String>,
}

/// WebSocket entry point. `chatFingerprint` selects a chat socket and wins
/// over `roomId`; with neither present the socket is closed immediately.
/// A plain (non-upgrade) GET falls through to the banner route.
#[get("/?<q..>")]
pub fn ws_entry(
    ws: ws::WebSocket,
    q: WsQuery,
    rooms: &State<RoomRegistry>,
    sockets: &State<ChatSockets>,
    mailboxes: &State<Mailboxes>,
    totals: &State<Totals>,
) -> ws::Channel<'static> {
    let rooms = rooms.inner().clone();
    let sockets = sockets.inner().clone();
    let mailboxes = mailboxes.inner().clone();
    let totals = totals.inner().clone();
    let WsQuery {
        room_id,
        chat_fingerprint,
    } = q;

    ws.channel(move |mut stream| {
        Box::pin(async move {
            if let Some(fingerprint) = chat_fingerprint {
                chat_session(stream, fingerprint, sockets, mailboxes).await
            } else if let Some(room_id) = room_id {
                room_session(stream, room_id, rooms, totals).await
            } else {
                let _ = stream.send(ws::Message::Close(None)).await;
                Ok(())
            }
        })
    })
}

/// Room socket lifecycle: join (or bounce off a burned id), relay frames,
/// leave on close. Outbound frames arrive through the member channel; the
/// loop ends after writing a queued Close.
async fn room_session(
    mut stream: ws::stream::DuplexStream,
    room_id: String,
    rooms: RoomRegistry,
    totals: Totals,
) -> ws::result::Result<()> {
    let member_id = ids::new_id();
    let (tx, mut rx) = mpsc::unbounded_channel::<ws::Message>();

    match rooms.join(&room_id, &member_id, tx) {
        JoinOutcome::Burned => {
            let _ = stream.send(RoomRegistry::destroyed_frame(&room_id)).await;
            let _ = stream.send(ws::Message::Close(None)).await;
            return Ok(());
        }
        JoinOutcome::Joined { created } => {
            if created {
                totals.increment(totals::ROOMS_CREATED);
            }
        }
    }

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(ws::Message::Text(text))) => {
                        if is_burn_control(&text, &room_id) {
                            rooms.burn(&room_id);
                        } else {
                            // Unparseable or non-control text is somebody's
                            // ciphertext; relay it untouched.
                            rooms.relay(&room_id, &member_id, ws::Message::Text(text));
                        }
                    }
                    Some(Ok(ws::Message::Binary(bytes))) => {
                        rooms.relay(&room_id, &member_id, ws::Message::Binary(bytes));
                    }
                    Some(Ok(ws::Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong handled by the transport
                    Some(Err(_)) => break,
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Some(msg) => {
                        let closing = matches!(msg, ws::Message::Close(_));
                        if stream.send(msg).await.is_err() {
                            break;
                        }
                        if closing {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    rooms.leave(&room_id, &member_id);
    Ok(())
}

/// Chat socket lifecycle: register for live pushes, confirm the connection,
/// then accept acks until close. A displaced registration keeps the old
/// socket readable; it just stops receiving pushes.
async fn chat_session(
    mut stream: ws::stream::DuplexStream,
    fingerprint: String,
    sockets: ChatSockets,
    mailboxes: Mailboxes,
) -> ws::result::Result<()> {
    let conn_id = ids::new_id();
    let (tx, mut rx) = mpsc::unbounded_channel::<ws::Message>();
    sockets.register(&fingerprint, &conn_id, tx);

    let hello = serde_json::json!({"type": "connected", "fingerprint": fingerprint});
    if stream.send(ws::Message::Text(hello.to_string())).await.is_err() {
        sockets.remove(&fingerprint, &conn_id);
        return Ok(());
    }

    let mut pushes_open = true;
    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(ws::Message::Text(text))) => {
                        if let Some(ids) = parse_ack(&text) {
                            mailboxes.ack(&fingerprint, &ids);
                        }
                    }
                    Some(Ok(ws::Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
            outgoing = rx.recv(), if pushes_open => {
                match outgoing {
                    Some(msg) => {
                        if stream.send(msg).await.is_err() {
                            break;
                        }
                    }
                    // Channel gone: a newer socket took over this
                    // fingerprint. Keep serving acks on this one.
                    None => pushes_open = false,
                }
            }
        }
    }

    sockets.remove(&fingerprint, &conn_id);
    Ok(())
}

/// Only the exact control shape burns; everything else — including text that
/// fails to parse as JSON — is relay traffic.
fn is_burn_control(text: &str, room_id: &str) -> bool {
    let Ok(v) = serde_json::from_str::<serde_json::Value>(text) else {
        return false;
    };
    v["type"] == "control" && v["action"] == "burnRoom" && v["roomId"] == room_id
}

/// `{type:"ack", messageIds:[...]}` → the ids; anything else is ignored.
fn parse_ack(text: &str) -> Option<Vec<String>> {
    let v: serde_json::Value = serde_json::from_str(text).ok()?;
    if v["type"] != "ack" {
        return None;
    }
    Some(
        v["messageIds"]
            .as_array()?
            .iter()
            .filter_map(|id| id.as_str().map(String::from))
            .collect(),
    )
}

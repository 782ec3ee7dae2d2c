use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::ids;
use crate::live::ChatSockets;
use crate::mailbox::{EnqueueOutcome, Mailboxes};
use crate::models::{AckMessages, QueuedMessage, SendChatMessage};
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::totals::{self, Totals};

use super::ClientIp;

const MAX_MESSAGE_BYTES: usize = 500 * 1024;
const MAX_ACK_BYTES: usize = 50 * 1024;

#[post("/chat/message", format = "json", data = "<body>")]
pub fn send_chat_message(
    mailboxes: &State<Mailboxes>,
    sockets: &State<ChatSockets>,
    totals: &State<Totals>,
    limiter: &State<RateLimiter>,
    config: &State<RateLimitConfig>,
    ip: ClientIp,
    body: Json<SendChatMessage>,
) -> Result<(Status, Json<serde_json::Value>), (Status, Json<serde_json::Value>)> {
    let rl = limiter.check(
        "chat",
        "message",
        &ip.0,
        config.chat_message_max,
        config.window_secs,
    );
    if !rl.allowed {
        return Err((
            Status::TooManyRequests,
            Json(serde_json::json!({
                "error": "rate_limited",
                "retry_after_secs": rl.retry_after_secs
            })),
        ));
    }

    let body = body.into_inner();
    let (Some(to), Some(payload), Some(message_id)) =
        (body.to, body.encrypted_message, body.message_id)
    else {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "malformed_request"})),
        ));
    };
    if to.trim().is_empty() || payload.is_empty() || message_id.trim().is_empty() {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "malformed_request"})),
        ));
    }
    if payload.len() > MAX_MESSAGE_BYTES {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "payload_too_large"})),
        ));
    }

    let msg = QueuedMessage {
        id: message_id,
        from: body.from.unwrap_or_else(|| "anonymous".to_string()),
        payload,
        timestamp: ids::now_ms(),
    };

    match mailboxes.enqueue(&to, msg.clone()) {
        EnqueueOutcome::Duplicate => Ok((
            Status::Ok,
            Json(serde_json::json!({"success": true, "duplicate": true})),
        )),
        EnqueueOutcome::Delivered => {
            totals.increment(totals::CHAT_MESSAGES_SENT);
            // Enqueue first, then push: the mailbox is the source of truth
            // and a recipient connecting mid-request still finds the message.
            sockets.push_new_message(&to, &msg);
            Ok((Status::Created, Json(serde_json::json!({"success": true}))))
        }
    }
}

#[get("/chat/messages/<fingerprint>")]
pub fn get_chat_messages(
    mailboxes: &State<Mailboxes>,
    fingerprint: &str,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({"messages": mailboxes.fetch(fingerprint)}))
}

#[post("/chat/messages/ack", format = "json", data = "<body>")]
pub fn ack_chat_messages(
    mailboxes: &State<Mailboxes>,
    body: Json<AckMessages>,
) -> Result<Json<serde_json::Value>, (Status, Json<serde_json::Value>)> {
    let body = body.into_inner();
    let (Some(fingerprint), Some(message_ids)) = (body.fingerprint, body.message_ids) else {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "malformed_request"})),
        ));
    };
    if fingerprint.trim().is_empty() {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "malformed_request"})),
        ));
    }
    if message_ids.iter().map(String::len).sum::<usize>() > MAX_ACK_BYTES {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "payload_too_large"})),
        ));
    }

    mailboxes.ack(&fingerprint, &message_ids);
    Ok(Json(serde_json::json!({"success": true})))
}

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::invites::{ClaimOutcome, CreateOutcome, InviteStore};
use crate::models::{ClaimInvite, CreateInvite, InviteView};
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::totals::{self, Totals};

use super::ClientIp;

/// Key bundles are a handful of public keys; anything bigger is abuse.
const MAX_BUNDLE: usize = 100 * 1024;

#[post("/chat/invite", format = "json", data = "<body>")]
pub fn create_invite(
    store: &State<InviteStore>,
    totals: &State<Totals>,
    limiter: &State<RateLimiter>,
    config: &State<RateLimitConfig>,
    ip: ClientIp,
    body: Json<CreateInvite>,
) -> Result<(Status, Json<serde_json::Value>), (Status, Json<serde_json::Value>)> {
    let rl = limiter.check(
        "chat",
        "invite",
        &ip.0,
        config.chat_invite_max,
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
    let (Some(invite_id), Some(bundle)) = (body.invite_id, body.public_key_bundle) else {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "malformed_request"})),
        ));
    };
    if invite_id.trim().is_empty() || bundle.is_empty() {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "malformed_request"})),
        ));
    }
    if bundle.len() > MAX_BUNDLE {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "payload_too_large"})),
        ));
    }

    match store.create(&invite_id, bundle, body.expires_at) {
        CreateOutcome::Duplicate => Err((
            Status::Conflict,
            Json(serde_json::json!({"error": "duplicate_invite"})),
        )),
        CreateOutcome::Created => {
            totals.increment(totals::CHAT_INVITES_CREATED);
            Ok((
                Status::Created,
                Json(serde_json::json!({"success": true, "inviteId": invite_id})),
            ))
        }
    }
}

#[get("/chat/invite/<id>")]
pub fn get_invite(
    store: &State<InviteStore>,
    id: &str,
) -> Result<Json<InviteView>, (Status, Json<serde_json::Value>)> {
    store.get(id).map(Json).ok_or((
        Status::NotFound,
        Json(serde_json::json!({"error": "not_found"})),
    ))
}

#[post("/chat/invite/<id>/claim", format = "json", data = "<body>")]
pub fn claim_invite(
    store: &State<InviteStore>,
    limiter: &State<RateLimiter>,
    config: &State<RateLimitConfig>,
    ip: ClientIp,
    id: &str,
    body: Json<ClaimInvite>,
) -> Result<Json<serde_json::Value>, (Status, Json<serde_json::Value>)> {
    let rl = limiter.check(
        "chat",
        "invite",
        &ip.0,
        config.chat_invite_max,
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

    let Some(claimer_bundle) = body.into_inner().claimer_bundle else {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "malformed_request"})),
        ));
    };
    if claimer_bundle.is_empty() {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "malformed_request"})),
        ));
    }
    if claimer_bundle.len() > MAX_BUNDLE {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "payload_too_large"})),
        ));
    }

    match store.claim(id, claimer_bundle) {
        ClaimOutcome::Claimed(creator_bundle) => Ok(Json(
            serde_json::json!({"success": true, "creatorBundle": creator_bundle}),
        )),
        ClaimOutcome::Gone => Err((
            Status::NotFound,
            Json(serde_json::json!({"error": "not_found"})),
        )),
        ClaimOutcome::AlreadyClaimed => Err((
            Status::Conflict,
            Json(serde_json::json!({"error": "already_claimed"})),
        )),
    }
}

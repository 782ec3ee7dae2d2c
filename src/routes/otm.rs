use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::models::CreateOtm;
use crate::one_time::OtmStore;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::totals::{self, Totals};

use super::ClientIp;

/// Ciphertext field cap; the 1 MiB JSON body limit is the hard cut.
const MAX_CIPHERTEXT: usize = 1024 * 1024;

#[post("/otm", format = "json", data = "<body>")]
pub fn create_otm(
    store: &State<OtmStore>,
    totals: &State<Totals>,
    limiter: &State<RateLimiter>,
    config: &State<RateLimitConfig>,
    ip: ClientIp,
    body: Json<CreateOtm>,
) -> Result<(Status, Json<serde_json::Value>), (Status, Json<serde_json::Value>)> {
    let rl = limiter.check("otm", "post", &ip.0, config.otm_post_max, config.window_secs);
    if !rl.allowed {
        return Err((
            Status::TooManyRequests,
            Json(serde_json::json!({
                "error": "rate_limited",
                "retry_after_secs": rl.retry_after_secs
            })),
        ));
    }

    let Some(ciphertext) = body.into_inner().ciphertext else {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "malformed_request"})),
        ));
    };
    if ciphertext.is_empty() {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "malformed_request"})),
        ));
    }
    if ciphertext.len() > MAX_CIPHERTEXT {
        return Err((
            Status::BadRequest,
            Json(serde_json::json!({"error": "payload_too_large"})),
        ));
    }

    let id = store.put(ciphertext);
    totals.increment(totals::OTM_CREATED);

    Ok((Status::Created, Json(serde_json::json!({"id": id}))))
}

/// One-shot read. A missing, consumed, and expired entry all answer the same
/// `{used:true}` so callers cannot probe which it was.
#[get("/otm/<id>")]
pub fn take_otm(
    store: &State<OtmStore>,
    limiter: &State<RateLimiter>,
    config: &State<RateLimitConfig>,
    ip: ClientIp,
    id: &str,
) -> Result<Json<serde_json::Value>, (Status, Json<serde_json::Value>)> {
    let rl = limiter.check("otm", "get", &ip.0, config.otm_get_max, config.window_secs);
    if !rl.allowed {
        return Err((
            Status::TooManyRequests,
            Json(serde_json::json!({
                "error": "rate_limited",
                "retry_after_secs": rl.retry_after_secs
            })),
        ));
    }

    match store.take(id) {
        Some(ciphertext) => Ok(Json(serde_json::json!({"ciphertext": ciphertext}))),
        None => Err((
            Status::NotFound,
            Json(serde_json::json!({"used": true})),
        )),
    }
}

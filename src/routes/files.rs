use rocket::data::{Data, ToByteUnit};
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::{get, post, Request, State};

use crate::one_time::FileStore;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::totals::{self, Totals};

use super::ClientIp;

/// Upload cap: the request stream is cut once this many bytes have arrived.
const MAX_FILE_MIB: u64 = 12;

/// Upload failures. Everything is a small JSON error except a truncated
/// stream, which answers 413 with no body at all.
pub enum UploadError {
    Rejected(Status, Json<serde_json::Value>),
    TooLarge,
}

impl<'r> Responder<'r, 'static> for UploadError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        match self {
            UploadError::Rejected(status, body) => (status, body).respond_to(req),
            UploadError::TooLarge => Response::build()
                .status(Status::PayloadTooLarge)
                .ok(),
        }
    }
}

#[post("/file", data = "<data>")]
pub async fn upload_file(
    store: &State<FileStore>,
    totals: &State<Totals>,
    limiter: &State<RateLimiter>,
    config: &State<RateLimitConfig>,
    ip: ClientIp,
    data: Data<'_>,
) -> Result<(Status, Json<serde_json::Value>), UploadError> {
    let rl = limiter.check(
        "file",
        "upload",
        &ip.0,
        config.file_upload_max,
        config.window_secs,
    );
    if !rl.allowed {
        return Err(UploadError::Rejected(
            Status::TooManyRequests,
            Json(serde_json::json!({
                "error": "rate_limited",
                "retry_after_secs": rl.retry_after_secs
            })),
        ));
    }

    let bytes = data
        .open(MAX_FILE_MIB.mebibytes())
        .into_bytes()
        .await
        .map_err(|_| {
            UploadError::Rejected(
                Status::BadRequest,
                Json(serde_json::json!({"error": "malformed_request"})),
            )
        })?;
    if !bytes.is_complete() {
        return Err(UploadError::TooLarge);
    }
    let bytes = bytes.into_inner();
    if bytes.is_empty() {
        return Err(UploadError::Rejected(
            Status::BadRequest,
            Json(serde_json::json!({"error": "malformed_request"})),
        ));
    }

    let id = store.put(bytes);
    totals.increment(totals::FILES_CREATED);

    Ok((Status::Created, Json(serde_json::json!({"id": id}))))
}

/// Single-use download; same `{used:true}` ambiguity as one-time messages.
#[get("/file/<id>")]
pub fn download_file(
    store: &State<FileStore>,
    limiter: &State<RateLimiter>,
    config: &State<RateLimitConfig>,
    ip: ClientIp,
    id: &str,
) -> Result<(ContentType, Vec<u8>), (Status, Json<serde_json::Value>)> {
    let rl = limiter.check(
        "file",
        "download",
        &ip.0,
        config.file_download_max,
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

    match store.take(id) {
        Some(bytes) => Ok((ContentType::Binary, bytes)),
        None => Err((
            Status::NotFound,
            Json(serde_json::json!({"used": true})),
        )),
    }
}

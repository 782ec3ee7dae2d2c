use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{catch, get, options, post, State};
use std::path::PathBuf;

use crate::invites::InviteStore;
use crate::mailbox::Mailboxes;
use crate::one_time::{FileStore, OtmStore};
use crate::sweeper::{self, SweepResult};
use crate::totals::{Totals, TotalsError, TotalsSnapshot};

#[get("/health")]
pub fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "blind-relay",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[get("/metrics")]
pub fn metrics(
    totals: &State<Totals>,
) -> Result<Json<TotalsSnapshot>, (Status, Json<serde_json::Value>)> {
    totals.read().map(Json).map_err(|e| match e {
        TotalsError::Disabled => (
            Status::ServiceUnavailable,
            Json(serde_json::json!({"error": "metrics_disabled"})),
        ),
        TotalsError::Read(e) => {
            eprintln!("⚠️  Totals read failed: {e}");
            (
                Status::InternalServerError,
                Json(serde_json::json!({"error": "metrics_read_failed"})),
            )
        }
    })
}

/// Manually trigger a TTL sweep across every store. Returns what was dropped.
#[post("/admin/sweep")]
pub fn run_sweep_now(
    otm: &State<OtmStore>,
    files: &State<FileStore>,
    invites: &State<InviteStore>,
    mailboxes: &State<Mailboxes>,
) -> Json<SweepResult> {
    Json(sweeper::run_sweep(otm, files, invites, mailboxes))
}

// Unmatched paths answer a 200 banner, not a 404. Deployed clients probe
// freely and treat anything non-2xx as an outage.

const BANNER: &str = "blind-relay: ciphertext in, ciphertext out.";

#[get("/<_path..>", rank = 100)]
pub fn banner_get(_path: PathBuf) -> &'static str {
    BANNER
}

#[post("/<_path..>", rank = 100)]
pub fn banner_post(_path: PathBuf) -> &'static str {
    BANNER
}

/// Preflight and bare OPTIONS on any path answer 204 with no body; the CORS
/// fairing supplies the headers.
#[options("/<_path..>", rank = 100)]
pub fn options_preflight(_path: PathBuf) -> Status {
    Status::NoContent
}

// --- Catchers ---

#[catch(400)]
pub fn bad_request() -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": "malformed_request"}))
}

// Rocket sends type-level deserialization failures here; the wire contract
// stays the same small error object.
#[catch(422)]
pub fn unprocessable() -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": "malformed_request"}))
}

// Body-size overruns produce no body at all.
#[catch(413)]
pub fn payload_too_large() -> &'static str {
    ""
}

#[catch(429)]
pub fn too_many_requests() -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": "rate_limited"}))
}

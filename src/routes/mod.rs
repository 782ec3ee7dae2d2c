// Route module decomposition — each surface in its own file.
// Shared request guards live here; route functions in submodules.

mod files;
mod invites;
mod messages;
mod otm;
mod system;
mod ws;

// --- Re-exports (all route functions and catchers used by lib.rs) ---

pub use files::{download_file, upload_file};
pub use invites::{claim_invite, create_invite, get_invite};
pub use messages::{ack_chat_messages, get_chat_messages, send_chat_message};
pub use otm::{create_otm, take_otm};
pub use system::{
    bad_request, banner_get, banner_post, health, metrics, options_preflight, payload_too_large,
    run_sweep_now, too_many_requests, unprocessable,
};
pub use ws::ws_entry;

// --- Shared request guards ---

use rocket::request::{FromRequest, Outcome, Request};

/// Client address for rate limiting: first `X-Forwarded-For` entry if the
/// header is present, otherwise the socket peer, otherwise "unknown".
pub struct ClientIp(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let ip = req
            .headers()
            .get_one("X-Forwarded-For")
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .or_else(|| req.remote().map(|r| r.ip().to_string()))
            .unwrap_or_else(|| "unknown".to_string());
        Outcome::Success(ClientIp(ip))
    }
}

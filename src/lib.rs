pub mod ids;
pub mod invites;
pub mod live;
pub mod mailbox;
pub mod models;
pub mod one_time;
pub mod rate_limit;
pub mod rooms;
pub mod routes;
pub mod sweeper;
pub mod totals;

use std::env;

use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};

use invites::InviteStore;
use live::ChatSockets;
use mailbox::Mailboxes;
use one_time::{FILE_TTL_MS, FileStore, OTM_TTL_MS, OtmStore};
use rate_limit::{RateLimitConfig, RateLimiter};
use rooms::RoomRegistry;
use totals::Totals;

pub fn rocket() -> rocket::Rocket<rocket::Build> {
    let totals_path = env::var("TOTALS_DB_PATH").ok();
    rocket_with_config(totals_path.as_deref(), RateLimitConfig::from_env())
}

pub fn rocket_with_totals(totals_path: Option<&str>) -> rocket::Rocket<rocket::Build> {
    rocket_with_config(totals_path, RateLimitConfig::from_env())
}

pub fn rocket_with_config(
    totals_path: Option<&str>,
    rate_config: RateLimitConfig,
) -> rocket::Rocket<rocket::Build> {
    let totals = Totals::new(totals_path);
    let otm = OtmStore::new(OTM_TTL_MS);
    let files = FileStore::new(FILE_TTL_MS);
    let invites = InviteStore::new();
    let mailboxes = Mailboxes::new();
    let chat_sockets = ChatSockets::new();
    let room_registry = RoomRegistry::new();

    let cors = CorsOptions {
        allowed_origins: AllowedOrigins::all(),
        allowed_methods: [Method::Get, Method::Post, Method::Options]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::some(&["Content-Type"]),
        send_wildcard: true,
        ..Default::default()
    }
    .to_cors()
    .expect("Failed to create CORS");

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001);

    // 1 MiB covers the largest JSON body (an OTM ciphertext); the file
    // route reads raw data under its own 12 MiB cap.
    let figment = rocket::Config::figment()
        .merge(("port", port))
        .merge(("limits.json", 1024 * 1024));

    rocket::custom(figment)
        .manage(totals)
        .manage(rate_config)
        .manage(RateLimiter::new())
        .manage(otm.clone())
        .manage(files.clone())
        .manage(invites.clone())
        .manage(mailboxes.clone())
        .manage(chat_sockets)
        .manage(room_registry)
        .attach(cors)
        .register(
            "/",
            rocket::catchers![
                routes::bad_request,
                routes::unprocessable,
                routes::payload_too_large,
                routes::too_many_requests,
            ],
        )
        .mount(
            "/",
            rocket::routes![
                routes::health,
                routes::metrics,
                routes::create_otm,
                routes::take_otm,
                routes::upload_file,
                routes::download_file,
                routes::create_invite,
                routes::get_invite,
                routes::claim_invite,
                routes::send_chat_message,
                routes::get_chat_messages,
                routes::ack_chat_messages,
                routes::run_sweep_now,
                routes::ws_entry,
                routes::banner_get,
                routes::banner_post,
                routes::options_preflight,
            ],
        )
        .attach(rocket::fairing::AdHoc::on_liftoff("TTL Sweeper", {
            move |_rocket| {
                Box::pin(async move {
                    sweeper::spawn_sweep_task(otm, files, invites, mailboxes);
                    println!("🧹 TTL sweeper started");
                })
            }
        }))
}

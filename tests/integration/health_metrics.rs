use crate::common::{test_client, test_client_without_totals};
use rocket::http::{ContentType, Status};

// --- Health ---

#[test]
fn test_health() {
    let client = test_client();
    let res = client.get("/health").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "blind-relay");
}

// --- Metrics ---

#[test]
fn test_metrics_start_at_zero() {
    let client = test_client();
    let res = client.get("/metrics").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    for key in [
        "roomsCreated",
        "otmCreated",
        "filesCreated",
        "chatInvitesCreated",
        "chatMessagesSent",
    ] {
        assert_eq!(body[key], 0, "{key} should start at zero");
    }
}

#[test]
fn test_metrics_disabled_without_sink() {
    let client = test_client_without_totals();
    let res = client.get("/metrics").dispatch();
    assert_eq!(res.status(), Status::ServiceUnavailable);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["error"], "metrics_disabled");
}

#[test]
fn test_metrics_count_creations() {
    let client = test_client();

    client
        .post("/otm")
        .header(ContentType::JSON)
        .body(r#"{"ciphertext": "A"}"#)
        .dispatch();
    client
        .post("/chat/invite")
        .header(ContentType::JSON)
        .body(r#"{"inviteId": "metrics-inv", "publicKeyBundle": "K1"}"#)
        .dispatch();
    client
        .post("/chat/message")
        .header(ContentType::JSON)
        .body(r#"{"to": "fpB", "encryptedMessage": "E1", "messageId": "m-metrics"}"#)
        .dispatch();

    let body: serde_json::Value = client.get("/metrics").dispatch().into_json().unwrap();
    assert_eq!(body["otmCreated"], 1);
    assert_eq!(body["chatInvitesCreated"], 1);
    assert_eq!(body["chatMessagesSent"], 1);
    assert_eq!(body["filesCreated"], 0);
}

#[test]
fn test_duplicate_message_not_counted_twice() {
    let client = test_client();
    for _ in 0..2 {
        client
            .post("/chat/message")
            .header(ContentType::JSON)
            .body(r#"{"to": "fpB", "encryptedMessage": "E1", "messageId": "m-dup"}"#)
            .dispatch();
    }
    let body: serde_json::Value = client.get("/metrics").dispatch().into_json().unwrap();
    assert_eq!(body["chatMessagesSent"], 1);
}

// --- Banner ---

#[test]
fn test_unmatched_route_banner() {
    let client = test_client();
    let res = client.get("/definitely/not/a/route").dispatch();
    assert_eq!(res.status(), Status::Ok);
    assert!(res.into_string().unwrap().contains("blind-relay"));

    let res = client.post("/also/not/a/route").dispatch();
    assert_eq!(res.status(), Status::Ok);
}

#[test]
fn test_plain_get_root_is_banner() {
    // A non-upgrade GET / is not a WebSocket handshake; it falls through.
    let client = test_client();
    let res = client.get("/").dispatch();
    assert_eq!(res.status(), Status::Ok);
    assert!(res.into_string().unwrap().contains("blind-relay"));
}

// --- OPTIONS / CORS preflight ---

#[test]
fn test_options_returns_204_no_body() {
    let client = test_client();
    for path in ["/otm", "/chat/invite", "/chat/message", "/file"] {
        let res = client.options(path).dispatch();
        assert_eq!(res.status(), Status::NoContent, "OPTIONS {path}");
        assert_eq!(res.into_string().unwrap_or_default(), "");
    }
}

#[test]
fn test_options_on_unmatched_path() {
    // The banner is a GET/POST affordance; OPTIONS stays 204 everywhere.
    let client = test_client();
    let res = client.options("/definitely/not/a/route").dispatch();
    assert_eq!(res.status(), Status::NoContent);
    assert_eq!(res.into_string().unwrap_or_default(), "");
}

#[test]
fn test_malformed_json_is_bad_request() {
    let client = test_client();
    let res = client
        .post("/otm")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

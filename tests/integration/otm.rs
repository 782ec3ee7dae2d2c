use crate::common::test_client;
use rocket::http::{ContentType, Status};

#[test]
fn test_otm_round_trip() {
    let client = test_client();

    let res = client
        .post("/otm")
        .header(ContentType::JSON)
        .body(r#"{"ciphertext": "A"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Created);
    let body: serde_json::Value = res.into_json().unwrap();
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));

    // First read observes the ciphertext.
    let res = client.get(format!("/otm/{id}")).dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["ciphertext"], "A");

    // Second read observes nothing, and cannot tell "consumed" from "never existed".
    let res = client.get(format!("/otm/{id}")).dispatch();
    assert_eq!(res.status(), Status::NotFound);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["used"], true);
}

#[test]
fn test_otm_unknown_id_looks_used() {
    let client = test_client();
    let res = client
        .get("/otm/00000000000000000000000000000000")
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["used"], true);
}

#[test]
fn test_otm_missing_ciphertext() {
    let client = test_client();
    let res = client
        .post("/otm")
        .header(ContentType::JSON)
        .body(r#"{}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["error"], "malformed_request");
}

#[test]
fn test_otm_empty_ciphertext() {
    let client = test_client();
    let res = client
        .post("/otm")
        .header(ContentType::JSON)
        .body(r#"{"ciphertext": ""}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_otm_each_entry_gets_distinct_id() {
    let client = test_client();
    let mut ids = std::collections::HashSet::new();
    for _ in 0..5 {
        let body: serde_json::Value = client
            .post("/otm")
            .header(ContentType::JSON)
            .body(r#"{"ciphertext": "x"}"#)
            .dispatch()
            .into_json()
            .unwrap();
        ids.insert(body["id"].as_str().unwrap().to_string());
    }
    assert_eq!(ids.len(), 5);
}

use crate::common::test_client;
use rocket::http::{ContentType, Status};

#[test]
fn test_file_round_trip() {
    let client = test_client();

    let res = client.post("/file").body(vec![0u8, 1, 2]).dispatch();
    assert_eq!(res.status(), Status::Created);
    let body: serde_json::Value = res.into_json().unwrap();
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 32);

    let res = client.get(format!("/file/{id}")).dispatch();
    assert_eq!(res.status(), Status::Ok);
    assert_eq!(res.content_type(), Some(ContentType::Binary));
    assert_eq!(res.into_bytes().unwrap(), vec![0u8, 1, 2]);

    // Single-use: the second download is gone.
    let res = client.get(format!("/file/{id}")).dispatch();
    assert_eq!(res.status(), Status::NotFound);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["used"], true);
}

#[test]
fn test_file_unknown_id_looks_used() {
    let client = test_client();
    let res = client
        .get("/file/ffffffffffffffffffffffffffffffff")
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["used"], true);
}

#[test]
fn test_file_empty_upload() {
    let client = test_client();
    let res = client.post("/file").dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_file_upload_over_cap_is_cut() {
    let client = test_client();
    // One byte past the 12 MiB cap: the stream is truncated and the
    // response carries no body at all.
    let res = client
        .post("/file")
        .body(vec![0u8; 12 * 1024 * 1024 + 1])
        .dispatch();
    assert_eq!(res.status(), Status::PayloadTooLarge);
    assert_eq!(res.into_string().unwrap_or_default(), "");
}

#[test]
fn test_file_payload_survives_exactly() {
    // Uploads are opaque bytes; nothing may decode or normalize them.
    let client = test_client();
    let payload: Vec<u8> = (0..=255).collect();

    let body: serde_json::Value = client
        .post("/file")
        .body(payload.clone())
        .dispatch()
        .into_json()
        .unwrap();
    let id = body["id"].as_str().unwrap();

    let res = client.get(format!("/file/{id}")).dispatch();
    assert_eq!(res.into_bytes().unwrap(), payload);
}

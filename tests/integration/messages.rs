use crate::common::test_client;
use rocket::http::{ContentType, Status};

#[test]
fn test_message_queue_flow() {
    let client = test_client();

    let res = client
        .post("/chat/message")
        .header(ContentType::JSON)
        .body(r#"{"to": "fpB", "from": "fpA", "encryptedMessage": "E1", "messageId": "m1"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Created);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["success"], true);

    // A retry with the same messageId is an idempotent success.
    let res = client
        .post("/chat/message")
        .header(ContentType::JSON)
        .body(r#"{"to": "fpB", "from": "fpA", "encryptedMessage": "E1", "messageId": "m1"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["duplicate"], true);

    // Exactly one copy is stored.
    let res = client.get("/chat/messages/fpB").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], "m1");
    assert_eq!(messages[0]["from"], "fpA");
    assert_eq!(messages[0]["payload"], "E1");
    assert!(messages[0]["timestamp"].is_i64());

    // Fetch does not consume.
    let body: serde_json::Value = client.get("/chat/messages/fpB").dispatch().into_json().unwrap();
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);

    // Ack drains the mailbox.
    let res = client
        .post("/chat/messages/ack")
        .header(ContentType::JSON)
        .body(r#"{"fingerprint": "fpB", "messageIds": ["m1"]}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let body: serde_json::Value = client.get("/chat/messages/fpB").dispatch().into_json().unwrap();
    assert!(body["messages"].as_array().unwrap().is_empty());
}

#[test]
fn test_messages_preserve_insertion_order() {
    let client = test_client();
    for i in 0..5 {
        client
            .post("/chat/message")
            .header(ContentType::JSON)
            .body(format!(
                r#"{{"to": "fpOrder", "encryptedMessage": "E{i}", "messageId": "m{i}"}}"#
            ))
            .dispatch();
    }
    let body: serde_json::Value = client
        .get("/chat/messages/fpOrder")
        .dispatch()
        .into_json()
        .unwrap();
    let ids: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["m0", "m1", "m2", "m3", "m4"]);
}

#[test]
fn test_ack_removes_only_named_ids() {
    let client = test_client();
    for id in ["a", "b", "c"] {
        client
            .post("/chat/message")
            .header(ContentType::JSON)
            .body(format!(
                r#"{{"to": "fpAck", "encryptedMessage": "E", "messageId": "{id}"}}"#
            ))
            .dispatch();
    }

    client
        .post("/chat/messages/ack")
        .header(ContentType::JSON)
        .body(r#"{"fingerprint": "fpAck", "messageIds": ["a", "c", "not-there"]}"#)
        .dispatch();

    let body: serde_json::Value = client
        .get("/chat/messages/fpAck")
        .dispatch()
        .into_json()
        .unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], "b");
}

#[test]
fn test_message_default_sender() {
    let client = test_client();
    client
        .post("/chat/message")
        .header(ContentType::JSON)
        .body(r#"{"to": "fpAnon", "encryptedMessage": "E1", "messageId": "m-anon"}"#)
        .dispatch();
    let body: serde_json::Value = client
        .get("/chat/messages/fpAnon")
        .dispatch()
        .into_json()
        .unwrap();
    assert_eq!(body["messages"][0]["from"], "anonymous");
}

#[test]
fn test_message_missing_fields() {
    let client = test_client();
    for body in [
        r#"{"encryptedMessage": "E1", "messageId": "m1"}"#,
        r#"{"to": "fpB", "messageId": "m1"}"#,
        r#"{"to": "fpB", "encryptedMessage": "E1"}"#,
        r#"{"to": "", "encryptedMessage": "E1", "messageId": "m1"}"#,
    ] {
        let res = client
            .post("/chat/message")
            .header(ContentType::JSON)
            .body(body)
            .dispatch();
        assert_eq!(res.status(), Status::BadRequest, "body: {body}");
    }
}

#[test]
fn test_ack_missing_fields() {
    let client = test_client();
    let res = client
        .post("/chat/messages/ack")
        .header(ContentType::JSON)
        .body(r#"{"fingerprint": "fpB"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);

    let res = client
        .post("/chat/messages/ack")
        .header(ContentType::JSON)
        .body(r#"{"messageIds": []}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn test_fetch_unknown_fingerprint_is_empty() {
    let client = test_client();
    let res = client.get("/chat/messages/nobody-home").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["messages"].as_array().unwrap().is_empty());
}

#[test]
fn test_same_message_id_different_mailboxes() {
    // Dedup is per-mailbox; two recipients can hold the same id.
    let client = test_client();
    for to in ["fpX", "fpY"] {
        let res = client
            .post("/chat/message")
            .header(ContentType::JSON)
            .body(format!(
                r#"{{"to": "{to}", "encryptedMessage": "E", "messageId": "shared"}}"#
            ))
            .dispatch();
        assert_eq!(res.status(), Status::Created);
    }
}

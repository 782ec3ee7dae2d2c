/// Generate an opaque resource id: 32 lowercase hex characters.
///
/// Ids are never parsed back; clients treat them as capability tokens.
pub fn new_id() -> String {
    format!("{:032x}", uuid::Uuid::new_v4().as_u128())
}

/// Current time in milliseconds. All TTL arithmetic runs on this scale.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

use serde::{Deserialize, Serialize};

// Request bodies keep every field optional and let the handlers validate
// presence, so a missing field answers 400 rather than Rocket's 422.

#[derive(Debug, Deserialize)]
pub struct CreateOtm {
    pub ciphertext: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvite {
    pub invite_id: Option<String>,
    pub public_key_bundle: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimInvite {
    pub claimer_bundle: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendChatMessage {
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    pub encrypted_message: Option<String>,
    pub message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckMessages {
    pub fingerprint: Option<String>,
    pub message_ids: Option<Vec<String>>,
}

/// A message parked in a recipient's mailbox. The same shape goes out in
/// `/chat/messages` responses and in live `newMessage` pushes.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueuedMessage {
    pub id: String,
    pub from: String,
    pub payload: String,
    pub timestamp: i64,
}

/// Public view of an invite. `claimer_bundle` serializes as an explicit null
/// until the invite is claimed.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InviteView {
    pub invite_id: String,
    pub public_key_bundle: String,
    pub claimed: bool,
    pub claimer_bundle: Option<String>,
}

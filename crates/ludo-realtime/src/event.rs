use serde::{Deserialize, Serialize};

/// Wire shape for every realtime channel message (§6 "Realtime channel").
/// `kind` is one of the event names below (`game:start`,
/// `dice:roll`, `move`, `turn:advance`, `room:slot-change`,
/// `room:team-names`, `room:chat`, `room:quick-message`,
/// `room:taunt-suggestions`); the remaining fields are populated per event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomEvent {
    pub room_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dice: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dice_value: Option<u8>,
}

impl RoomEvent {
    pub fn patch(room_id: impl Into<String>, kind: impl Into<String>, patch: serde_json::Value) -> Self {
        Self { room_id: room_id.into(), kind: kind.into(), patch: Some(patch), dice: None, color: None, token_id: None, dice_value: None }
    }
}

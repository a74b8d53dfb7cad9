use serde::{Deserialize, Serialize};

/// One entry of a room's append-only audit trail (§3 `GameEvent`, §5
/// "Events recorded to the append-only log may be written after the patch
/// is emitted; clients must treat the socket patch as the source of truth
/// and the log as an audit trail"). `kind` mirrors the realtime channel's
/// event names (`game:start`, `dice:roll`, `move`, `turn:advance`, ...) plus
/// the seat-lifecycle kinds that never reach the realtime channel
/// (`room:created`, `room:player-joined`, ...). Never mutated once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    pub room_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub actor_user_id: Option<String>,
    pub actor_seat_id: Option<String>,
    pub revision: Option<u64>,
    pub payload: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl GameEvent {
    pub fn new(room_id: impl Into<String>, kind: impl Into<String>, payload: serde_json::Value, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            room_id: room_id.into(),
            kind: kind.into(),
            actor_user_id: None,
            actor_seat_id: None,
            revision: None,
            payload,
            created_at: now,
        }
    }

    pub fn with_actor(mut self, user_id: impl Into<String>, seat_id: impl Into<String>) -> Self {
        self.actor_user_id = Some(user_id.into());
        self.actor_seat_id = Some(seat_id.into());
        self
    }

    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }
}

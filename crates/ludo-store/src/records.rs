use serde::{Deserialize, Serialize};

/// Durable projection of a room (§3 `Room`, minus the live seat list, which
/// lives in [`SeatDocument`] keyed by `(roomId, userId)` per §6). `gameBoard`
/// and `settings` are kept as opaque JSON: this crate does not know the
/// domain's `GameBoard`/`RoomSettings` shapes, only that they round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDocument {
    pub id: String,
    pub code: String,
    pub host_seat_id: Option<String>,
    pub status: String,
    pub current_player_index: Option<i64>,
    pub settings: serde_json::Value,
    pub game_board: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// The durable-write-behind flusher only ever replaces these four fields
/// (§4.5 "compose a durable-store upsert with `{status, currentPlayerIndex,
/// gameBoard}`" — `revision` travels inside `gameBoard` since it's part of
/// the runtime state blob).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatePatch {
    pub status: String,
    pub current_player_index: Option<i64>,
    pub game_board: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatDocument {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub color: String,
    pub position: i64,
    pub team_index: Option<i64>,
    pub status: String,
    pub ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDocument {
    pub room_id: String,
    pub team_index: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub id: String,
    pub display_name: String,
}

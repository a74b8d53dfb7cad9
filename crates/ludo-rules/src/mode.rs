use serde::Deserialize;
use serde::Serialize;

/// §3 `Room.settings.mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomMode {
    Individual,
    Team,
}

impl RoomMode {
    /// Team mode additionally requires `maxPlayers ∈ {4,6}` (§3).
    pub fn is_valid_for(self, max_players: usize) -> bool {
        match self {
            RoomMode::Individual => true,
            RoomMode::Team => matches!(max_players, 4 | 6),
        }
    }
}

use ludo_board::BASE;
use ludo_board::Color;
use ludo_board::FINISHED;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;

/// A token's coarse state (§3). `TokenStatus` has 5 variants per the
/// workspace's tagged-variant convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Base,
    Active,
    Safe,
    Home,
    Finished,
}

impl TokenStatus {
    pub fn is_done(self) -> bool {
        matches!(self, TokenStatus::Home | TokenStatus::Finished)
    }
    pub fn is_on_track(self) -> bool {
        matches!(self, TokenStatus::Active | TokenStatus::Safe)
    }
}

/// A single piece on the board (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: u8,
    pub color: Color,
    pub position: i8,
    pub status: TokenStatus,
    /// Cumulative movement counter since leaving base; `-1` sentinel right
    /// after a capture sends the token back to base (§9, preserved
    /// asymmetric with the `0` used on a fresh base release).
    pub steps: i32,
}

impl Token {
    pub fn in_base(id: u8, color: Color) -> Self {
        Self {
            id,
            color,
            position: BASE,
            status: TokenStatus::Base,
            steps: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_done() && self.position == FINISHED
    }
}

/// Per-color token arrays, only populated for the room's active colors.
pub type Tokens = HashMap<Color, [Token; 4]>;

/// Builds a fresh, all-in-base token map for the given active colors (§4.6
/// `updateRoomStatus`: "Initialize tokens for all configured colors to
/// base").
pub fn fresh_tokens(colors: &[Color]) -> Tokens {
    colors
        .iter()
        .map(|&color| {
            let arr = std::array::from_fn(|i| Token::in_base(i as u8, color));
            (color, arr)
        })
        .collect()
}

use serde::Deserialize;
use serde::Serialize;

/// A player-identifying color within a room.
///
/// Up to 8 colors are defined; only the subset named by
/// [`crate::color_order`] for a given player count is ever active (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Orange,
    Green,
    Purple,
    Yellow,
    Teal,
    Blue,
    Pink,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Red,
        Color::Orange,
        Color::Green,
        Color::Purple,
        Color::Yellow,
        Color::Teal,
        Color::Blue,
        Color::Pink,
    ];
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Green => "green",
            Color::Purple => "purple",
            Color::Yellow => "yellow",
            Color::Teal => "teal",
            Color::Blue => "blue",
            Color::Pink => "pink",
        };
        write!(f, "{label}")
    }
}

/// Canonical color-order table by player count (§4.1).
///
/// Turn rotation and team partition derive exclusively from this table,
/// never from insertion order in the durable store.
pub fn color_order(max_players: usize) -> &'static [Color] {
    match max_players {
        2 => &[Color::Red, Color::Yellow],
        3 => &[Color::Red, Color::Green, Color::Blue],
        4 => &[Color::Red, Color::Green, Color::Yellow, Color::Blue],
        5 => &[
            Color::Red,
            Color::Green,
            Color::Yellow,
            Color::Blue,
            Color::Orange,
        ],
        6 => &[
            Color::Red,
            Color::Green,
            Color::Yellow,
            Color::Blue,
            Color::Purple,
            Color::Orange,
        ],
        _ => &[],
    }
}

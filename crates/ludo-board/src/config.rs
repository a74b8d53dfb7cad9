use crate::color::Color;

/// Number of cells on the shared circular main track.
pub const MAIN_TRACK_LEN: i8 = 52;
/// Number of cells in a home-run lane, minus one (§3: `H`).
pub const HOME_RUN_LEN: i8 = 5;
/// Absolute position marking "finished" (§3).
pub const FINISHED: i8 = 58;
/// Absolute position marking "at home base" (§3).
pub const BASE: i8 = -1;
/// First absolute home-run position (local index 0).
pub const HOME_RUN_START: i8 = 52;

/// Cells on which captures are forbidden (§4.1).
///
/// Doubles, by construction here, as the universe of possible per-color
/// home-start positions (8 cells for up to 8 colors): the 4 canonical
/// entry points `{0,13,26,39}` spaced 13 apart, plus the 4 "star" cells
/// 8 cells past each entry `{8,21,34,47}` used by the 5th/6th color when
/// active.
pub const SAFE_INDICES: [i8; 8] = [0, 8, 13, 21, 26, 34, 39, 47];

/// Static board geometry, shared by every room.
#[derive(Debug, Clone, Copy)]
pub struct BoardConfig;

impl BoardConfig {
    /// The absolute track index where a color's tokens enter/re-enter play.
    pub fn home_start(color: Color) -> i8 {
        match color {
            Color::Red => 0,
            Color::Orange => 8,
            Color::Green => 13,
            Color::Purple => 21,
            Color::Yellow => 26,
            Color::Teal => 34,
            Color::Blue => 39,
            Color::Pink => 47,
        }
    }

    /// The main-track index this color turns off the main track from, after
    /// completing its lap. By convention this is the color's own home start
    /// (the board is laid out so each color loops all the way back to its
    /// own start square before peeling into its home-run lane).
    pub fn entry_track_index(color: Color) -> i8 {
        Self::home_start(color)
    }

    /// §4.2: `entryIndexAdjusted = (entryTrackIndex - 2 + 52) mod 52`.
    ///
    /// The magic offset of 2 aligns home-entry timing to this board's
    /// coordinate table and must be preserved bit-exact (§9).
    pub fn entry_index_adjusted(color: Color) -> i8 {
        rem_euclid52(Self::entry_track_index(color) - 2)
    }

    pub fn is_safe_index(position: i8) -> bool {
        SAFE_INDICES.contains(&position)
    }
}

/// Euclidean remainder mod the 52-cell track, for negative-safe wraparound.
pub fn rem_euclid52(n: i8) -> i8 {
    n.rem_euclid(MAIN_TRACK_LEN)
}

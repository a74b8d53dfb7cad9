use crate::mode::RoomMode;
use ludo_board::Color;

/// Controllable colors for the acting seat (§4.2).
///
/// Individual mode only ever controls the current color. Team mode also
/// controls the partner color seated opposite in the canonical order
/// (`(idx + n/2) mod n`); team-blockade rules only activate once
/// `controlled.len() > 1`.
pub fn controllable_colors(mode: RoomMode, current: Color, order: &[Color]) -> Vec<Color> {
    match mode {
        RoomMode::Individual => vec![current],
        RoomMode::Team => {
            let n = order.len();
            let Some(idx) = order.iter().position(|&c| c == current) else {
                return vec![current];
            };
            let partner_idx = (idx + n / 2) % n;
            let partner = order[partner_idx];
            if partner == current {
                vec![current]
            } else {
                vec![current, partner]
            }
        }
    }
}

/// Team `i` contains seats at positions `i` and `i + maxPlayers/2` (§3).
/// Derived from seat positions, never persisted as ground truth — the
/// caller may still snapshot it for display.
pub fn team_of(position: usize, max_players: usize) -> usize {
    let half = max_players / 2;
    if position >= half {
        position - half
    } else {
        position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::RoomMode;

    #[test]
    fn individual_mode_controls_only_current() {
        let order = ludo_board::color_order(4);
        let controlled = controllable_colors(RoomMode::Individual, order[0], order);
        assert_eq!(controlled, vec![order[0]]);
    }

    #[test]
    fn team_mode_controls_partner_opposite_in_order() {
        let order = ludo_board::color_order(4);
        let controlled = controllable_colors(RoomMode::Team, order[0], order);
        assert_eq!(controlled, vec![order[0], order[2]]);
    }

    #[test]
    fn team_of_pairs_opposite_positions() {
        assert_eq!(team_of(0, 4), 0);
        assert_eq!(team_of(2, 4), 0);
        assert_eq!(team_of(1, 4), 1);
        assert_eq!(team_of(3, 4), 1);
    }
}

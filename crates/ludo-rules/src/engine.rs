use crate::token::Token;
use crate::token::TokenStatus;
use crate::token::Tokens;
use ludo_board::BoardConfig;
use ludo_board::Color;
use ludo_board::FINISHED;
use ludo_board::HOME_RUN_LEN;
use ludo_board::HOME_RUN_START;
use ludo_board::MAIN_TRACK_LEN;
use ludo_board::rem_euclid52;
use ludo_core::Dice;
use std::collections::HashSet;

/// A lap is "complete" once accumulated steps plus the remaining distance to
/// the home arrow reach this threshold (§4.2).
const ROTATION_THRESHOLD: i32 = 50;

/// A legal move: which token, of which controlled color.
pub type MoveKey = (u8, Color);

/// Outcome of applying one token's move (§4.2 `applyMove`).
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub updated: Token,
    pub captured: Vec<(u8, Color)>,
}

fn teammates_on_cell(tokens: &Tokens, controlled: &[Color], mover: Token, cell: i8) -> usize {
    controlled
        .iter()
        .filter_map(|c| tokens.get(c))
        .flatten()
        .filter(|t| {
            !(t.color == mover.color && t.id == mover.id)
                && t.position == cell
                && t.status.is_on_track()
        })
        .count()
}

/// Computes the effective dice for a token, applying the forced-stack rule
/// (§4.2). Returns `None` when the move is illegal because of it (odd dice
/// on a stacked cell).
fn effective_dice(tokens: &Tokens, controlled: &[Color], token: Token, dice: Dice) -> Option<Dice> {
    if !(0..MAIN_TRACK_LEN).contains(&token.position) {
        return Some(dice);
    }
    if BoardConfig::is_safe_index(token.position) {
        return Some(dice);
    }
    if teammates_on_cell(tokens, controlled, token, token.position) == 0 {
        return Some(dice);
    }
    if dice % 2 != 0 {
        return None;
    }
    let half = dice / 2;
    if half < 1 { None } else { Some(half) }
}

fn enemy_blockade(tokens: &Tokens, allied: &[Color], cell: i8) -> bool {
    tokens
        .iter()
        .filter(|(c, _)| !allied.contains(c))
        .flat_map(|(_, arr)| arr.iter())
        .filter(|t| t.position == cell && t.status.is_on_track())
        .count()
        >= 2
}

/// Geometry derived once per (color, token) pair, shared by the legality
/// check and move application.
struct TrackGeometry {
    distance_to_arrow: i8,
    completes_lap: bool,
    overshoot: i8,
}

fn track_geometry(color: Color, token: Token) -> TrackGeometry {
    let entry_adjusted = BoardConfig::entry_index_adjusted(color);
    let distance_to_arrow = rem_euclid52(entry_adjusted - token.position);
    let completes_lap =
        token.steps + distance_to_arrow as i32 >= ROTATION_THRESHOLD;
    TrackGeometry {
        distance_to_arrow,
        completes_lap,
        overshoot: 0,
    }
}

/// Whether this token's move is legal, and if so, whether it resolves via
/// the home-entry branch rather than a plain continue (§4.2).
fn track_move_legality(
    tokens: &Tokens,
    controlled: &[Color],
    color: Color,
    token: Token,
    effective: Dice,
    is_stack_mover: bool,
) -> Option<bool> {
    let mut geom = track_geometry(color, token);
    geom.overshoot = effective as i8 - geom.distance_to_arrow;

    let home_entry_in_range =
        geom.completes_lap && effective as i8 > geom.distance_to_arrow && (1..=HOME_RUN_LEN + 1).contains(&geom.overshoot);

    if home_entry_in_range {
        // "continue" is ruled out; legality is decided by home-entry alone.
        let path_clear = (1..=geom.distance_to_arrow).all(|s| {
            let cell = rem_euclid52(token.position + s);
            BoardConfig::is_safe_index(cell) || !enemy_blockade(tokens, controlled, cell) || is_stack_mover
        });
        return if path_clear { Some(true) } else { None };
    }

    // Plain continue: every intermediate cell must be safe, unblockaded, or
    // the mover must be a breaking stack.
    let path_clear = (1..=effective as i8).all(|s| {
        let cell = rem_euclid52(token.position + s);
        BoardConfig::is_safe_index(cell) || !enemy_blockade(tokens, controlled, cell) || is_stack_mover
    });
    if path_clear { Some(false) } else { None }
}

/// Recovers the effective dice (post forced-stack halving, if any) for a
/// move already known to be legal — used by callers (the engagement dice
/// engine) that need to simulate a face's outcome without re-deriving
/// blockade/stack logic themselves.
pub fn legal_move_effective_dice(
    tokens: &Tokens,
    mv: MoveKey,
    dice: Dice,
    controlled: &[Color],
) -> Option<Dice> {
    let (id, color) = mv;
    let token = *tokens.get(&color)?.iter().find(|t| t.id == id)?;
    if token.status == TokenStatus::Base {
        return Some(dice);
    }
    effective_dice(tokens, controlled, token, dice)
}

/// §4.2 `findValidMoves`.
pub fn find_valid_moves(tokens: &Tokens, dice: Dice, controlled: &[Color]) -> HashSet<MoveKey> {
    let mut legal = HashSet::new();
    for &color in controlled {
        let Some(arr) = tokens.get(&color) else { continue };
        for &token in arr.iter() {
            if token.status.is_done() {
                continue;
            }
            if token.status == TokenStatus::Base {
                if dice == 6 {
                    legal.insert((token.id, color));
                }
                continue;
            }
            let Some(effective) = effective_dice(tokens, controlled, token, dice) else { continue };
            let is_stack_mover = effective != dice;

            if token.position >= HOME_RUN_START {
                let local = token.position - HOME_RUN_START;
                if local + effective as i8 <= HOME_RUN_LEN {
                    legal.insert((token.id, color));
                }
                continue;
            }

            if track_move_legality(tokens, controlled, color, token, effective, is_stack_mover).is_some() {
                legal.insert((token.id, color));
            }
        }
    }
    legal
}

fn land_in_home_run(local_index: i8) -> (i8, TokenStatus) {
    if local_index >= HOME_RUN_LEN {
        (FINISHED, TokenStatus::Home)
    } else {
        (HOME_RUN_START + local_index, TokenStatus::Safe)
    }
}

fn resolve_capture(tokens: &Tokens, allied: &[Color], landing: i8, is_stack_mover: bool) -> Vec<(u8, Color)> {
    let enemies: Vec<(u8, Color)> = tokens
        .iter()
        .filter(|(c, _)| !allied.contains(c))
        .flat_map(|(&c, arr)| arr.iter().map(move |t| (c, t)))
        .filter(|(_, t)| t.position == landing && t.status.is_on_track())
        .map(|(c, t)| (t.id, c))
        .collect();
    match enemies.len() {
        0 => vec![],
        1 => enemies,
        _ => {
            if is_stack_mover {
                enemies
            } else {
                // Individual mode (or a lone mover in team mode): a blockade
                // of 2+ enemies is uncapturable.
                vec![]
            }
        }
    }
}

/// §4.2 `applyMove`. Pure — does not touch `tokens`; the caller applies the
/// returned outcome (and zeroes out captured victims) to its own state.
///
/// `is_stack_mover` should be `true` whenever this token's `effective` dice
/// came from halving under the forced-stack rule, or more generally when
/// the caller is moving 2+ controlled tokens together this turn (team-mode
/// blockade break, §9).
pub fn apply_move(
    token: Token,
    effective: Dice,
    color: Color,
    tokens: &Tokens,
    allied: &[Color],
    is_stack_mover: bool,
) -> MoveOutcome {
    if token.status == TokenStatus::Base {
        let updated = Token {
            position: BoardConfig::home_start(color),
            steps: 0,
            status: TokenStatus::Active,
            ..token
        };
        return MoveOutcome { updated, captured: vec![] };
    }

    if token.position >= HOME_RUN_START {
        let local = (token.position - HOME_RUN_START) + effective as i8;
        let (position, status) = land_in_home_run(local);
        let updated = Token { position, status, steps: token.steps + effective as i32, ..token };
        return MoveOutcome { updated, captured: vec![] };
    }

    let entered_home =
        track_move_legality(tokens, allied, color, token, effective, is_stack_mover) == Some(true);

    if entered_home {
        let geom = track_geometry(color, token);
        let overshoot = effective as i8 - geom.distance_to_arrow;
        let local = overshoot - 1;
        let (position, status) = land_in_home_run(local);
        let updated = Token { position, status, steps: token.steps + effective as i32, ..token };
        return MoveOutcome { updated, captured: vec![] };
    }

    let new_pos = rem_euclid52(token.position + effective as i8);
    let status = if BoardConfig::is_safe_index(new_pos) {
        TokenStatus::Safe
    } else {
        TokenStatus::Active
    };
    let updated = Token { position: new_pos, status, steps: token.steps + effective as i32, ..token };
    let captured = if status == TokenStatus::Active {
        resolve_capture(tokens, allied, new_pos, is_stack_mover)
    } else {
        vec![]
    };
    MoveOutcome { updated, captured }
}

/// Returns the captured token reset to base (§3, §8 round-trip law).
pub fn send_to_base(color: Color, id: u8) -> Token {
    Token {
        id,
        color,
        position: ludo_board::BASE,
        status: TokenStatus::Base,
        steps: -1,
    }
}

/// §4.2 `checkWin`: all 4 tokens of `color` have reached home.
pub fn check_win(tokens: &Tokens, color: Color) -> bool {
    tokens
        .get(&color)
        .map(|arr| arr.iter().all(|t| t.status.is_done()))
        .unwrap_or(false)
}

/// §4.2 `advanceTurn`: next seat in canonical order not already in
/// `winners`, unless `skip_winners` is false (team mode keeps rotating
/// through a finished partner's teammates).
pub fn advance_turn(
    current_index: usize,
    seat_count: usize,
    winners: &HashSet<usize>,
    skip_winners: bool,
) -> usize {
    if seat_count == 0 {
        return 0;
    }
    let mut next = (current_index + 1) % seat_count;
    if !skip_winners || winners.len() >= seat_count {
        return next;
    }
    for _ in 0..seat_count {
        if !winners.contains(&next) {
            return next;
        }
        next = (next + 1) % seat_count;
    }
    next
}

/// §4.2 extra-turn rule: the mover keeps the turn on a six, any capture, or
/// any token reaching home this move.
pub fn retains_turn(dice: Dice, any_captured: bool, any_home_transition: bool) -> bool {
    dice == 6 || any_captured || any_home_transition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::fresh_tokens;
    use ludo_board::color_order;

    #[test]
    fn base_token_only_legal_on_six() {
        let order = color_order(2);
        let tokens = fresh_tokens(order);
        let controlled = vec![order[0]];
        assert!(find_valid_moves(&tokens, 5, &controlled).is_empty());
        let moves = find_valid_moves(&tokens, 6, &controlled);
        assert_eq!(moves.len(), 4);
    }

    #[test]
    fn base_release_lands_on_home_start_and_is_safe() {
        let order = color_order(2);
        let tokens = fresh_tokens(order);
        let color = order[0];
        let token = tokens[&color][0];
        let outcome = apply_move(token, 6, color, &tokens, &[color], false);
        assert_eq!(outcome.updated.position, BoardConfig::home_start(color));
        assert_eq!(outcome.updated.status, TokenStatus::Safe);
        assert!(outcome.captured.is_empty());
    }

    #[test]
    fn capture_sends_single_enemy_to_base() {
        let order = color_order(2);
        let mut tokens = fresh_tokens(order);
        let (red, yellow) = (order[0], order[1]);
        tokens.get_mut(&red).unwrap()[0] = Token {
            id: 0,
            color: red,
            position: 2,
            status: TokenStatus::Active,
            steps: 10,
        };
        tokens.get_mut(&yellow).unwrap()[0] = Token {
            id: 0,
            color: yellow,
            position: 5,
            status: TokenStatus::Active,
            steps: 10,
        };
        let mover = tokens[&red][0];
        let outcome = apply_move(mover, 3, red, &tokens, &[red], false);
        assert_eq!(outcome.updated.position, 5);
        assert_eq!(outcome.captured, vec![(0, yellow)]);
    }

    #[test]
    fn individual_mode_blockade_is_uncapturable_and_blocks_path() {
        let order = color_order(4);
        let mut tokens = fresh_tokens(order);
        let (red, green) = (order[0], order[2]);
        tokens.get_mut(&green).unwrap()[0] = Token { id: 0, color: green, position: 10, status: TokenStatus::Active, steps: 5 };
        tokens.get_mut(&green).unwrap()[1] = Token { id: 1, color: green, position: 10, status: TokenStatus::Active, steps: 5 };
        tokens.get_mut(&red).unwrap()[0] = Token { id: 0, color: red, position: 6, status: TokenStatus::Active, steps: 5 };
        let controlled = vec![red];
        let moves = find_valid_moves(&tokens, 4, &controlled);
        assert!(!moves.contains(&(0, red)));
    }

    #[test]
    fn forced_stack_requires_even_dice() {
        let order = color_order(2);
        let mut tokens = fresh_tokens(order);
        let red = order[0];
        tokens.get_mut(&red).unwrap()[0] = Token { id: 0, color: red, position: 10, status: TokenStatus::Active, steps: 5 };
        tokens.get_mut(&red).unwrap()[1] = Token { id: 1, color: red, position: 10, status: TokenStatus::Active, steps: 5 };
        let controlled = vec![red];
        assert!(find_valid_moves(&tokens, 3, &controlled).is_empty());
        let moves = find_valid_moves(&tokens, 4, &controlled);
        assert!(moves.contains(&(0, red)) && moves.contains(&(1, red)));
    }

    #[test]
    fn win_requires_all_four_home() {
        let order = color_order(2);
        let mut tokens = fresh_tokens(order);
        let red = order[0];
        for t in tokens.get_mut(&red).unwrap().iter_mut() {
            t.status = TokenStatus::Home;
            t.position = FINISHED;
        }
        assert!(check_win(&tokens, red));
    }

    #[test]
    fn advance_turn_skips_finished_seats() {
        let mut winners = HashSet::new();
        winners.insert(1);
        assert_eq!(advance_turn(0, 3, &winners, true), 2);
    }
}

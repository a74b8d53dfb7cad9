use ludo_board::{Color, HOME_RUN_START};
use ludo_rules::{self, Token, TokenStatus, Tokens};
use std::collections::HashMap;

const MAX_TOKEN_PROGRESS: i32 = 58;
const NEAR_WIN_PROGRESS: i32 = 4 * MAX_TOKEN_PROGRESS - 32;

fn token_progress(t: &Token) -> i32 {
    match t.status {
        TokenStatus::Base => 0,
        TokenStatus::Home | TokenStatus::Finished => MAX_TOKEN_PROGRESS,
        TokenStatus::Active | TokenStatus::Safe => {
            if t.position >= HOME_RUN_START {
                52 + (t.position - HOME_RUN_START) as i32
            } else {
                t.steps.max(0)
            }
        }
    }
}

fn color_progress(tokens: &Tokens, color: Color) -> i32 {
    tokens
        .get(&color)
        .map(|ts| ts.iter().map(token_progress).sum())
        .unwrap_or(0)
}

/// Per-face tactical analysis, derived by simulating each of the six faces
/// against the pure rule engine rather than guessing (§4.3 step 3).
#[derive(Debug, Clone, Copy, Default)]
pub struct FaceInfo {
    pub playable: bool,
    pub kill: bool,
    pub leader_kill: bool,
    pub leader_pressure: bool,
    pub escape: bool,
    pub finish: bool,
    pub revenge_kill: bool,
}

#[derive(Debug, Clone)]
pub struct TurnContext {
    pub faces: [FaceInfo; 6],
    pub behind_by_steps: i32,
    pub base_token_count: u8,
    pub all_in_base: bool,
    pub is_leader: bool,
    pub is_last: bool,
    pub lead_gap: i32,
    pub behind_gap: i32,
    pub behind_ratio: f64,
    pub any_player_near_win: bool,
    pub self_near_win: bool,
    pub close_chase: bool,
}

impl TurnContext {
    pub fn face(&self, dice: u8) -> FaceInfo {
        self.faces[(dice.clamp(1, 6) - 1) as usize]
    }
}

/// Builds the full per-face and per-player analysis for the seat about to
/// roll. `controlled` is the acting seat's own color plus its team partner's
/// color in team mode (§4.2 `controllableColors`).
pub fn analyze_turn(
    tokens: &Tokens,
    controlled: &[Color],
    all_colors: &[Color],
    revenge_targets: &[Color],
) -> TurnContext {
    let progress: HashMap<Color, i32> = all_colors.iter().map(|&c| (c, color_progress(tokens, c))).collect();
    let leader_color = all_colors
        .iter()
        .filter(|c| !controlled.contains(c))
        .max_by_key(|c| progress.get(c).copied().unwrap_or(0))
        .copied();

    let mut faces = [FaceInfo::default(); 6];
    for face in 1..=6u8 {
        faces[(face - 1) as usize] = analyze_face(tokens, controlled, face, revenge_targets, leader_color);
    }
    let own_total: i32 = controlled.iter().map(|c| progress.get(c).copied().unwrap_or(0)).sum();
    let max_other = all_colors
        .iter()
        .filter(|c| !controlled.contains(c))
        .map(|c| progress.get(c).copied().unwrap_or(0))
        .max()
        .unwrap_or(0);
    let min_other = all_colors
        .iter()
        .filter(|c| !controlled.contains(c))
        .map(|c| progress.get(c).copied().unwrap_or(0))
        .min()
        .unwrap_or(0);

    let leader_value = progress.values().copied().max().unwrap_or(0);
    let is_leader = own_total >= leader_value && own_total > 0;
    let last_value = progress.values().copied().min().unwrap_or(0);
    let is_last = own_total <= last_value;

    let lead_gap = (own_total - max_other).max(0);
    let behind_gap = (max_other - own_total).max(0);
    let behind_by_steps = (leader_value - own_total).max(0);
    let behind_ratio = if leader_value > 0 { behind_by_steps as f64 / leader_value as f64 } else { 0.0 };

    let base_tokens: Vec<&Token> = controlled.iter().flat_map(|c| tokens.get(c)).flatten().collect();
    let base_token_count = base_tokens.iter().filter(|t| t.status == TokenStatus::Base).count() as u8;
    let all_in_base = base_token_count as usize == base_tokens.len();

    let any_player_near_win = progress.values().any(|&p| p >= NEAR_WIN_PROGRESS);
    let self_near_win = own_total >= NEAR_WIN_PROGRESS;
    let close_chase = !is_leader && behind_gap > 0 && behind_gap <= 6;
    let _ = min_other;

    TurnContext {
        faces,
        behind_by_steps,
        base_token_count,
        all_in_base,
        is_leader,
        is_last,
        lead_gap,
        behind_gap,
        behind_ratio,
        any_player_near_win,
        self_near_win,
        close_chase,
    }
}

fn analyze_face(
    tokens: &Tokens,
    controlled: &[Color],
    face: u8,
    revenge_targets: &[Color],
    leader_color: Option<Color>,
) -> FaceInfo {
    let moves = ludo_rules::find_valid_moves(tokens, face, controlled);
    let mut info = FaceInfo::default();
    if moves.is_empty() {
        return info;
    }
    info.playable = true;

    for &(token_id, color) in &moves {
        let Some(effective) = ludo_rules::legal_move_effective_dice(tokens, (token_id, color), face, controlled)
        else {
            continue;
        };
        let Some(token) = tokens.get(&color).and_then(|ts| ts.iter().find(|t| t.id == token_id)) else {
            continue;
        };
        let is_stack_mover = effective != face;
        let outcome = ludo_rules::apply_move(*token, effective, color, tokens, controlled, is_stack_mover);

        if !outcome.captured.is_empty() {
            info.kill = true;
            if outcome.captured.iter().any(|(_, c)| revenge_targets.contains(c)) {
                info.revenge_kill = true;
            }
            if let Some(leader) = leader_color {
                if outcome.captured.iter().any(|(_, c)| *c == leader) {
                    info.leader_kill = true;
                    info.leader_pressure = true;
                }
            }
        }
        if outcome.updated.status.is_done() {
            info.finish = true;
        }
        if outcome.updated.position != token.position && token.status == TokenStatus::Active {
            let was_contested = moves_onto_enemy_adjacent(tokens, controlled, token.position);
            if was_contested {
                info.escape = true;
            }
        }
    }

    if let Some(leader) = leader_color {
        if tokens.get(&leader).is_some_and(|ts| ts.iter().any(|t| t.status == TokenStatus::Active)) {
            let leader_cells: Vec<i8> = tokens[&leader]
                .iter()
                .filter(|t| t.status == TokenStatus::Active)
                .map(|t| t.position)
                .collect();
            if moves.iter().any(|&(id, color)| {
                color != leader
                    && tokens
                        .get(&color)
                        .and_then(|ts| ts.iter().find(|t| t.id == id))
                        .map(|t| leader_cells.iter().any(|&lc| (ludo_board::rem_euclid52(lc - t.position) as i32) <= 6))
                        .unwrap_or(false)
            }) {
                info.leader_pressure = true;
            }
        }
    }

    info
}

/// Heuristic: a cell is "contested" for escape purposes when an un-allied
/// token sits within striking distance (1-6 cells behind).
fn moves_onto_enemy_adjacent(tokens: &Tokens, allied: &[Color], cell: i8) -> bool {
    tokens.iter().any(|(color, arr)| {
        if allied.contains(color) {
            return false;
        }
        arr.iter().any(|t| {
            t.status == TokenStatus::Active && {
                let gap = ludo_board::rem_euclid52(cell - t.position);
                gap >= 1 && gap <= 6
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ludo_rules::fresh_tokens;

    #[test]
    fn six_is_always_playable_from_base() {
        let colors = ludo_board::color_order(2);
        let tokens = fresh_tokens(colors);
        let ctx = analyze_turn(&tokens, &[colors[0]], colors, &[]);
        assert!(ctx.face(6).playable);
        assert!(!ctx.face(1).playable);
    }

    #[test]
    fn all_in_base_flag_set_at_match_start() {
        let colors = ludo_board::color_order(2);
        let tokens = fresh_tokens(colors);
        let ctx = analyze_turn(&tokens, &[colors[0]], colors, &[]);
        assert!(ctx.all_in_base);
        assert_eq!(ctx.base_token_count, 4);
    }
}

use ludo_board::Color;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Per-player momentum snapshot, persisted in the shared cache keyed
/// `engagement:{roomId}:player:{pid}:momentum` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Momentum {
    pub recent_rolls: VecDeque<u8>,
    pub no_move_streak: u32,
    pub turns_since_six: u32,
    pub turns_all_tokens_in_base: u32,
    pub luck_delta: f64,
    pub revenge_armed_turns: u32,
    pub revenge_target_colors: Vec<Color>,
    pub recently_killed_turns: u32,
    pub power_roll_charges: u32,
    pub session_assist_score: f64,
    pub consecutive_sixes: u32,
}

impl Default for Momentum {
    fn default() -> Self {
        Self {
            recent_rolls: VecDeque::with_capacity(10),
            no_move_streak: 0,
            turns_since_six: 0,
            turns_all_tokens_in_base: 0,
            luck_delta: 0.0,
            revenge_armed_turns: 0,
            revenge_target_colors: Vec::new(),
            recently_killed_turns: 0,
            power_roll_charges: 0,
            session_assist_score: 0.0,
            consecutive_sixes: 0,
        }
    }
}

impl Momentum {
    /// §4.3 "Reported outcome hook": called after the client's move (or its
    /// forfeiture) resolves.
    pub fn report_outcome(&mut self, rolled: u8, had_valid_move: bool, all_in_base: bool, forgiveness: f64) {
        self.recent_rolls.push_back(rolled);
        if self.recent_rolls.len() > 10 {
            self.recent_rolls.pop_front();
        }
        self.no_move_streak = if had_valid_move { 0 } else { self.no_move_streak + 1 };
        if rolled == 6 {
            self.consecutive_sixes += 1;
            self.turns_since_six = 0;
        } else {
            self.consecutive_sixes = 0;
            self.turns_since_six += 1;
        }
        self.turns_all_tokens_in_base = if all_in_base { self.turns_all_tokens_in_base + 1 } else { 0 };
        self.luck_delta = self.luck_delta * forgiveness.clamp(0.6, 0.99) + (rolled as f64 - 3.5);
        self.revenge_armed_turns = self.revenge_armed_turns.saturating_sub(1);
        self.recently_killed_turns = self.recently_killed_turns.saturating_sub(1);
        self.session_assist_score *= 0.95;
    }

    /// §4.3 "Capture reported": called once per capture this move resolves.
    pub fn report_capture_as_attacker(&mut self, cap: u32) {
        self.power_roll_charges = (self.power_roll_charges + 1).min(cap);
    }

    /// Consumes one charge when the sampler grants a tactical-relevance assist.
    pub fn consume_power_roll(&mut self) -> bool {
        if self.power_roll_charges > 0 {
            self.power_roll_charges -= 1;
            true
        } else {
            false
        }
    }

    pub fn report_capture_as_victim(&mut self, attacker: Color, window: u32, killed_window: u32) {
        self.revenge_armed_turns = self.revenge_armed_turns.max(window);
        self.recently_killed_turns = self.recently_killed_turns.max(killed_window);
        if !self.revenge_target_colors.contains(&attacker) {
            self.revenge_target_colors.push(attacker);
        }
    }

    pub fn low_roll_pattern_score(&self) -> f64 {
        if self.recent_rolls.is_empty() {
            return 0.0;
        }
        let low = self.recent_rolls.iter().filter(|&&r| r <= 2).count();
        low as f64 / self.recent_rolls.len() as f64
    }

    pub fn repeated_band_streak(&self) -> u32 {
        fn band(r: u8) -> u8 {
            match r {
                1..=2 => 0,
                3..=4 => 1,
                _ => 2,
            }
        }
        let mut streak = 0;
        let mut last = None;
        for &r in self.recent_rolls.iter().rev() {
            let b = band(r);
            match last {
                Some(l) if l == b => streak += 1,
                Some(_) => break,
                None => streak = 1,
            }
            last = Some(b);
        }
        streak
    }

    pub fn repeated_face_streak(&self) -> (Option<u8>, u32) {
        let mut streak = 0;
        let mut last = None;
        for &r in self.recent_rolls.iter().rev() {
            match last {
                Some(l) if l == r => streak += 1,
                Some(_) => break,
                None => {
                    last = Some(r);
                    streak = 1;
                }
            }
        }
        (last, streak)
    }
}

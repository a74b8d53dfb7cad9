/// Named bundle of numeric knobs governing the dice engine's biases (§4.3
/// glossary: "Engagement profile"). The workspace ships one canonical
/// profile; tests may construct others to probe individual behaviors.
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    pub entropy_floor: f64,
    pub force_at_turns_since_six: u32,
    pub assist_at_turns_all_in_base: u32,
    pub luck_debt_threshold: f64,
    pub low_roll_pattern_threshold: f64,
    pub force_budget_per_match: u32,
    pub force_min_gap: u32,
    pub revenge_window_turns: u32,
    pub recently_killed_turns: u32,
    pub power_roll_cap: u32,
    pub perception_alpha_min: f64,
    pub perception_alpha_max: f64,
    pub max_face_probability: f64,
    pub min_six_probability: [f64; 5],
    pub kill_weight: f64,
    pub leader_kill_weight: f64,
    pub leader_pressure_weight: f64,
    pub escape_weight: f64,
    pub finish_weight: f64,
    pub revenge_kill_weight: f64,
    pub base_escape_weight: f64,
    pub anti_snowball_penalty: f64,
    pub last_place_hope_bonus: f64,
    pub rubber_band_gap_steps: i32,
    pub dead_turn_streak: u32,
    pub emotion_recovery_luck_debt: f64,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            entropy_floor: 0.05,
            force_at_turns_since_six: 10,
            assist_at_turns_all_in_base: 4,
            luck_debt_threshold: -1.2,
            low_roll_pattern_threshold: 0.5,
            force_budget_per_match: 3,
            force_min_gap: 6,
            revenge_window_turns: 3,
            recently_killed_turns: 2,
            power_roll_cap: 3,
            perception_alpha_min: 0.06,
            perception_alpha_max: 0.14,
            max_face_probability: 0.46,
            // indexed by match phase ordinal (Start/Spread/Fights -> Leader -> Hope/Chaos -> Finish)
            min_six_probability: [0.10, 0.34, 0.24, 0.20, 0.16],
            kill_weight: 1.6,
            leader_kill_weight: 2.0,
            leader_pressure_weight: 1.3,
            escape_weight: 1.4,
            finish_weight: 1.8,
            revenge_kill_weight: 1.7,
            base_escape_weight: 1.5,
            anti_snowball_penalty: 0.6,
            last_place_hope_bonus: 1.5,
            rubber_band_gap_steps: 40,
            dead_turn_streak: 3,
            emotion_recovery_luck_debt: -2.0,
        }
    }
}

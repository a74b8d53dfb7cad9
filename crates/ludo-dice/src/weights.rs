use crate::context::TurnContext;
use crate::momentum::Momentum;
use crate::profile::Profile;
use crate::story::StoryPhase;

/// Builds the raw (pre-normalization) weight for each face 1-6 by applying
/// the named adjustments of §4.3 step 4 in sequence. Every adjustment is a
/// multiplier on the face's running weight, never a replacement — so no
/// single signal can zero out a face outright.
pub fn build_weights(profile: &Profile, turn: &TurnContext, momentum: &Momentum, phase: StoryPhase) -> [f64; 6] {
    let mut w = [1.0f64; 6];

    pity_timer(&mut w, profile, momentum);
    participation_guarantee(&mut w, profile, momentum);
    luck_debt_balancing(&mut w, profile, momentum);
    tempo_phase_factor(&mut w, turn, phase);
    tactical_relevance(&mut w, profile, turn);
    kill_and_leader_pressure(&mut w, profile, turn);
    escape_preservation(&mut w, profile, turn);
    anti_snowball(&mut w, profile, turn);
    last_place_hope(&mut w, profile, turn);
    story_phase_overrides(&mut w, profile, turn, phase);
    rubber_band_assist(&mut w, profile, turn);
    dead_turn_assist(&mut w, profile, momentum);
    emotion_recovery_assist(&mut w, profile, momentum);
    anti_frustration(&mut w, profile, momentum);
    drama_and_clutch(&mut w, profile, turn);
    urgency_floor(&mut w, turn, phase);

    for v in w.iter_mut() {
        *v = v.max(0.01);
    }
    w
}

fn pity_timer(w: &mut [f64; 6], profile: &Profile, momentum: &Momentum) {
    if momentum.turns_since_six >= profile.force_at_turns_since_six {
        w[5] *= 1.8;
    }
}

fn participation_guarantee(w: &mut [f64; 6], profile: &Profile, momentum: &Momentum) {
    if momentum.turns_all_tokens_in_base >= profile.assist_at_turns_all_in_base {
        w[5] *= 1.6;
    }
}

fn luck_debt_balancing(w: &mut [f64; 6], profile: &Profile, momentum: &Momentum) {
    if momentum.luck_delta <= profile.luck_debt_threshold {
        for (face, weight) in w.iter_mut().enumerate() {
            let pip = face as f64 + 1.0;
            *weight *= 1.0 + (pip - 3.5).max(0.0) * 0.08;
        }
    }
}

fn tempo_phase_factor(w: &mut [f64; 6], turn: &TurnContext, phase: StoryPhase) {
    let mult = phase.tempo_multiplier();
    for (face, weight) in w.iter_mut().enumerate() {
        if turn.faces[face].playable {
            *weight *= mult;
        }
    }
}

fn tactical_relevance(w: &mut [f64; 6], profile: &Profile, turn: &TurnContext) {
    for (face, weight) in w.iter_mut().enumerate() {
        let info = turn.faces[face];
        if info.kill {
            *weight *= profile.kill_weight;
        }
        if info.finish {
            *weight *= profile.finish_weight;
        }
        if info.revenge_kill {
            *weight *= profile.revenge_kill_weight;
        }
    }
}

fn kill_and_leader_pressure(w: &mut [f64; 6], profile: &Profile, turn: &TurnContext) {
    for (face, weight) in w.iter_mut().enumerate() {
        let info = turn.faces[face];
        if info.leader_kill {
            *weight *= profile.leader_kill_weight;
        } else if info.leader_pressure {
            *weight *= profile.leader_pressure_weight;
        }
    }
}

fn escape_preservation(w: &mut [f64; 6], profile: &Profile, turn: &TurnContext) {
    for (face, weight) in w.iter_mut().enumerate() {
        if turn.faces[face].escape {
            *weight *= profile.escape_weight;
        }
    }
    if turn.base_token_count > 0 {
        w[5] *= profile.base_escape_weight;
    }
}

fn anti_snowball(w: &mut [f64; 6], profile: &Profile, turn: &TurnContext) {
    if !turn.is_leader {
        return;
    }
    for (face, weight) in w.iter_mut().enumerate() {
        if turn.faces[face].kill {
            *weight *= profile.anti_snowball_penalty;
        }
    }
}

fn last_place_hope(w: &mut [f64; 6], profile: &Profile, turn: &TurnContext) {
    if !turn.is_last {
        return;
    }
    for (face, weight) in w.iter_mut().enumerate() {
        let info = turn.faces[face];
        if info.finish || info.escape || info.kill {
            *weight *= profile.last_place_hope_bonus;
        }
    }
}

fn story_phase_overrides(w: &mut [f64; 6], profile: &Profile, turn: &TurnContext, phase: StoryPhase) {
    match phase {
        StoryPhase::Hope if turn.behind_gap > 0 => {
            for (face, weight) in w.iter_mut().enumerate() {
                if turn.faces[face].kill || turn.faces[face].finish {
                    *weight *= profile.last_place_hope_bonus;
                }
            }
        }
        StoryPhase::Finish => {
            for (face, weight) in w.iter_mut().enumerate() {
                if turn.faces[face].finish {
                    *weight *= profile.finish_weight;
                }
            }
        }
        StoryPhase::Chaos => {
            for (face, weight) in w.iter_mut().enumerate() {
                if turn.faces[face].kill {
                    *weight *= 1.2;
                }
            }
        }
        _ => {}
    }
}

fn rubber_band_assist(w: &mut [f64; 6], profile: &Profile, turn: &TurnContext) {
    if turn.behind_by_steps < profile.rubber_band_gap_steps {
        return;
    }
    for (face, weight) in w.iter_mut().enumerate() {
        if turn.faces[face].playable {
            *weight *= 1.15;
        }
    }
}

fn dead_turn_assist(w: &mut [f64; 6], profile: &Profile, momentum: &Momentum) {
    if momentum.no_move_streak >= profile.dead_turn_streak {
        w[5] *= 1.5;
    }
}

fn emotion_recovery_assist(w: &mut [f64; 6], profile: &Profile, momentum: &Momentum) {
    if momentum.luck_delta <= profile.emotion_recovery_luck_debt {
        for (face, weight) in w.iter_mut().enumerate() {
            let pip = face as f64 + 1.0;
            *weight *= 1.0 + (pip - 3.5).max(0.0) * 0.12;
        }
    }
}

fn anti_frustration(w: &mut [f64; 6], profile: &Profile, momentum: &Momentum) {
    if momentum.low_roll_pattern_score() < profile.low_roll_pattern_threshold {
        return;
    }
    for (face, weight) in w.iter_mut().enumerate() {
        let pip = face as f64 + 1.0;
        *weight *= 1.0 + (pip - 3.5).max(0.0) * 0.1;
    }
}

fn drama_and_clutch(w: &mut [f64; 6], profile: &Profile, turn: &TurnContext) {
    if !turn.close_chase {
        return;
    }
    for (face, weight) in w.iter_mut().enumerate() {
        let info = turn.faces[face];
        if info.kill || info.escape {
            *weight *= profile.kill_weight.min(profile.escape_weight) * 0.5 + 1.0;
        }
    }
}

fn urgency_floor(w: &mut [f64; 6], turn: &TurnContext, phase: StoryPhase) {
    if phase != StoryPhase::Finish || !turn.self_near_win {
        return;
    }
    for (face, weight) in w.iter_mut().enumerate() {
        if turn.faces[face].finish {
            *weight = weight.max(2.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FaceInfo;

    fn ctx_with_face(idx: usize, info: FaceInfo) -> TurnContext {
        let mut faces = [FaceInfo::default(); 6];
        faces[idx] = info;
        TurnContext {
            faces,
            behind_by_steps: 0,
            base_token_count: 0,
            all_in_base: false,
            is_leader: false,
            is_last: false,
            lead_gap: 0,
            behind_gap: 0,
            behind_ratio: 0.0,
            any_player_near_win: false,
            self_near_win: false,
            close_chase: false,
        }
    }

    #[test]
    fn pity_timer_boosts_six_only() {
        let profile = Profile::default();
        let momentum = Momentum { turns_since_six: 99, ..Momentum::default() };
        let turn = ctx_with_face(5, FaceInfo { playable: true, ..FaceInfo::default() });
        let w = build_weights(&profile, &turn, &momentum, StoryPhase::Start);
        assert!(w[5] > w[0]);
    }

    #[test]
    fn finish_faces_weighted_up() {
        let profile = Profile::default();
        let momentum = Momentum::default();
        let turn = ctx_with_face(2, FaceInfo { playable: true, finish: true, ..FaceInfo::default() });
        let w = build_weights(&profile, &turn, &momentum, StoryPhase::Start);
        assert!(w[2] > w[0]);
    }

    #[test]
    fn weights_never_reach_zero() {
        let profile = Profile::default();
        let momentum = Momentum::default();
        let turn = ctx_with_face(0, FaceInfo::default());
        let w = build_weights(&profile, &turn, &momentum, StoryPhase::Start);
        assert!(w.iter().all(|&v| v > 0.0));
    }
}

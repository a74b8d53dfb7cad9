use crate::profile::Profile;
use crate::story::StoryPhase;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-room state for the force limiter, persisted at
/// `engagement:{roomId}:force-state` (§6). Bounds how often the engine is
/// allowed to deterministically hand a player a six rather than merely
/// weighting toward one.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ForceState {
    pub forces_used: u32,
    pub turns_since_force: u32,
}

impl ForceState {
    pub fn tick(&mut self) {
        self.turns_since_force = self.turns_since_force.saturating_add(1);
    }

    fn record_force(&mut self) {
        self.forces_used += 1;
        self.turns_since_force = 0;
    }

    fn eligible(&self, profile: &Profile) -> bool {
        self.forces_used < profile.force_budget_per_match && self.turns_since_force >= profile.force_min_gap
    }
}

fn phase_tier(phase: StoryPhase) -> usize {
    match phase {
        StoryPhase::Start | StoryPhase::Spread | StoryPhase::Fights => 0,
        StoryPhase::Leader => 1,
        StoryPhase::Hope => 2,
        StoryPhase::Chaos => 3,
        StoryPhase::Finish => 4,
    }
}

/// Turns raw multiplicative weights into a probability distribution with an
/// entropy floor: no face can be driven to zero probability, however extreme
/// the upstream weighting.
pub fn normalize(weights: [f64; 6], entropy_floor: f64) -> [f64; 6] {
    let sum: f64 = weights.iter().sum();
    let mut probs = [0.0f64; 6];
    if sum <= 0.0 {
        return [1.0 / 6.0; 6];
    }
    let floor_each = entropy_floor / 6.0;
    let remaining = (1.0 - entropy_floor).max(0.0);
    for (i, w) in weights.iter().enumerate() {
        probs[i] = floor_each + remaining * (w / sum);
    }
    renormalize(&mut probs);
    probs
}

fn renormalize(probs: &mut [f64; 6]) {
    let sum: f64 = probs.iter().sum();
    if sum > 0.0 {
        for p in probs.iter_mut() {
            *p /= sum;
        }
    } else {
        *probs = [1.0 / 6.0; 6];
    }
}

/// Blends the engineered distribution with uniform noise so that no single
/// face's bias is large enough for a player to reliably detect (§4.3
/// "perception masking"), and caps any one face at `max_face_probability`.
pub fn mask_and_cap(mut probs: [f64; 6], alpha: f64, max_face_probability: f64) -> [f64; 6] {
    let alpha = alpha.clamp(0.0, 1.0);
    for p in probs.iter_mut() {
        *p = (1.0 - alpha) * *p + alpha * (1.0 / 6.0);
    }
    for p in probs.iter_mut() {
        if *p > max_face_probability {
            *p = max_face_probability;
        }
    }
    renormalize(&mut probs);
    probs
}

/// Ensures P(6) never drops below the match-phase-appropriate floor, so a
/// struggling player is never starved of the one roll that frees a token.
pub fn min_six_guard(mut probs: [f64; 6], profile: &Profile, phase: StoryPhase) -> [f64; 6] {
    let floor = profile.min_six_probability[phase_tier(phase)];
    if probs[5] < floor {
        let deficit = floor - probs[5];
        probs[5] = floor;
        let other_sum: f64 = probs[..5].iter().sum();
        if other_sum > 0.0 {
            for p in probs[..5].iter_mut() {
                *p -= deficit * (*p / other_sum);
                *p = p.max(0.0);
            }
        }
    }
    renormalize(&mut probs);
    probs
}

/// Suppresses a third consecutive six: zeroes face 6 and redistributes its
/// mass, unless the force limiter is about to override the roll anyway.
fn suppress_triple_six(mut probs: [f64; 6], consecutive_sixes: u32) -> [f64; 6] {
    if consecutive_sixes < 2 {
        return probs;
    }
    let six = probs[5];
    probs[5] = 0.0;
    let other_sum: f64 = probs[..5].iter().sum();
    if other_sum > 0.0 {
        for p in probs[..5].iter_mut() {
            *p += six * (*p / other_sum);
        }
    }
    renormalize(&mut probs);
    probs
}

fn sample_from(probs: [f64; 6], rng: &mut impl Rng) -> u8 {
    let r: f64 = rng.random_range(0.0..1.0);
    let mut acc = 0.0;
    for (i, p) in probs.iter().enumerate() {
        acc += p;
        if r < acc {
            return (i + 1) as u8;
        }
    }
    6
}

/// Final-stage outcome: either a genuinely sampled face, or a deterministic
/// force (pity-timer six) spent against the per-match force budget.
pub struct RollOutcome {
    pub face: u8,
    pub forced: bool,
}

/// Samples the final face from a fully-adjusted distribution, applying
/// triple-six suppression and the force limiter. `pity_eligible` reflects
/// whether an upstream signal (turns-since-six, all-tokens-in-base) wants to
/// force a six this roll.
pub fn sample(
    probs: [f64; 6],
    consecutive_sixes: u32,
    pity_eligible: bool,
    force_state: &mut ForceState,
    profile: &Profile,
    rng: &mut impl Rng,
) -> RollOutcome {
    force_state.tick();
    if pity_eligible && force_state.eligible(profile) {
        force_state.record_force();
        return RollOutcome { face: 6, forced: true };
    }
    let adjusted = suppress_triple_six(probs, consecutive_sixes);
    RollOutcome { face: sample_from(adjusted, rng), forced: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn normalize_sums_to_one() {
        let probs = normalize([1.0, 1.0, 1.0, 1.0, 1.0, 5.0], 0.05);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn entropy_floor_prevents_zero_probability() {
        let probs = normalize([0.0, 0.0, 0.0, 0.0, 0.0, 1000.0], 0.05);
        assert!(probs[0] > 0.0);
    }

    #[test]
    fn triple_six_is_suppressed() {
        let probs = [0.1, 0.1, 0.1, 0.1, 0.1, 0.5];
        let adjusted = suppress_triple_six(probs, 2);
        assert_eq!(adjusted[5], 0.0);
    }

    #[test]
    fn force_limiter_respects_budget_and_gap() {
        let profile = Profile { force_budget_per_match: 1, force_min_gap: 3, ..Profile::default() };
        let mut state = ForceState::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let uniform = [1.0 / 6.0; 6];
        let first = sample(uniform, 0, true, &mut state, &profile, &mut rng);
        assert!(first.forced);
        let second = sample(uniform, 0, true, &mut state, &profile, &mut rng);
        assert!(!second.forced);
    }

    #[test]
    fn min_six_guard_raises_low_probability() {
        let profile = Profile::default();
        let probs = [0.3, 0.3, 0.2, 0.1, 0.05, 0.05];
        let guarded = min_six_guard(probs, &profile, StoryPhase::Hope);
        assert!(guarded[5] >= profile.min_six_probability[phase_tier(StoryPhase::Hope)] - 1e-9);
    }
}

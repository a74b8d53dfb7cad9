//! Engagement-shaped dice engine (§4.3).
//!
//! The public surface is a single [`roll`] call: given the acting seat's
//! board context and its persisted momentum/story/force state, it returns a
//! face 1-6 that is still a legal die roll (every face remains reachable,
//! no face is ever deterministic in the way a scripted outcome would be) but
//! is biased toward outcomes that keep the match engaging. Any internal
//! failure falls back to an unweighted roll — this function must never
//! panic or propagate an error to the room coordinator.
mod context;
mod momentum;
mod profile;
mod sampler;
mod story;

pub use context::{analyze_turn, FaceInfo, TurnContext};
pub use momentum::Momentum;
pub use profile::Profile;
pub use sampler::{ForceState, RollOutcome};
pub use story::{StoryDirector, StoryPhase};

use ludo_board::Color;
use ludo_rules::Tokens;
use rand::Rng;

/// Everything the dice engine needs to weigh a single roll, borrowed from
/// the room coordinator's authoritative state.
pub struct RollRequest<'a> {
    pub tokens: &'a Tokens,
    pub controlled: &'a [Color],
    pub all_colors: &'a [Color],
    pub momentum: &'a Momentum,
    pub phase: StoryPhase,
}

/// Rolls a single die for the given seat, applying the full §4.3 pipeline.
/// `force_state` and the RNG are mutated/consumed in place so the caller can
/// persist them (`engagement:{roomId}:force-state`) after the call returns.
pub fn roll(request: RollRequest<'_>, profile: &Profile, force_state: &mut sampler::ForceState, rng: &mut impl Rng) -> u8 {
    match try_roll(request, profile, force_state, rng) {
        Some(outcome) => outcome.face,
        None => {
            log::warn!("engagement dice pipeline failed, falling back to uniform roll");
            rng.random_range(1..=6)
        }
    }
}

fn try_roll(
    request: RollRequest<'_>,
    profile: &Profile,
    force_state: &mut sampler::ForceState,
    rng: &mut impl Rng,
) -> Option<RollOutcome> {
    let turn = analyze_turn(request.tokens, request.controlled, request.all_colors, &request.momentum.revenge_target_colors);

    let weights = crate::weights::build_weights(profile, &turn, request.momentum, request.phase);
    let normalized = sampler::normalize(weights, profile.entropy_floor);

    let alpha = profile.perception_alpha_min
        + (profile.perception_alpha_max - profile.perception_alpha_min) * rng.random_range(0.0..1.0);
    let masked = sampler::mask_and_cap(normalized, alpha, profile.max_face_probability);
    let guarded = sampler::min_six_guard(masked, profile, request.phase);

    let pity_eligible = request.momentum.turns_since_six >= profile.force_at_turns_since_six
        || request.momentum.turns_all_tokens_in_base >= profile.assist_at_turns_all_in_base;

    Some(sampler::sample(guarded, request.momentum.consecutive_sixes, pity_eligible, force_state, profile, rng))
}

mod weights;

#[cfg(test)]
mod tests {
    use super::*;
    use ludo_rules::fresh_tokens;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn roll_always_returns_a_legal_face() {
        let colors = ludo_board::color_order(2);
        let tokens = fresh_tokens(colors);
        let momentum = Momentum::default();
        let profile = Profile::default();
        let mut force_state = sampler::ForceState::default();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let request = RollRequest {
                tokens: &tokens,
                controlled: &[colors[0]],
                all_colors: colors,
                momentum: &momentum,
                phase: StoryPhase::Start,
            };
            let face = roll(request, &profile, &mut force_state, &mut rng);
            assert!((1..=6).contains(&face));
        }
    }

    #[test]
    fn pity_timer_eventually_forces_a_six() {
        let colors = ludo_board::color_order(2);
        let tokens = fresh_tokens(colors);
        let mut momentum = Momentum::default();
        momentum.turns_since_six = 50;
        let profile = Profile::default();
        let mut force_state = sampler::ForceState::default();
        let mut rng = SmallRng::seed_from_u64(3);
        let request = RollRequest {
            tokens: &tokens,
            controlled: &[colors[0]],
            all_colors: colors,
            momentum: &momentum,
            phase: StoryPhase::Start,
        };
        let face = roll(request, &profile, &mut force_state, &mut rng);
        assert_eq!(face, 6);
    }
}

use crate::catalog::Line;
use crate::emotion::{candidate_emotions, Emotion};
use crate::event::TauntEvent;
use crate::profile::TauntProfile;
use crate::ranking::rank_lines;
use rand::Rng;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

/// Per-room social state, persisted at `taunt:{roomId}:state` (§6). Generic
/// over the seat identifier so the room crate can plug in its own type
/// (e.g. a seat's UUID string, which is `Clone` but not `Copy`).
pub struct TauntDirector<S: Eq + std::hash::Hash + Clone> {
    profile: TauntProfile,
    cooldown_until: HashMap<S, Instant>,
    recent_emits: HashMap<S, VecDeque<Instant>>,
    room_auto_burst: VecDeque<Instant>,
    actor_recent_lines: HashMap<S, VecDeque<&'static str>>,
    revenge_memory: Vec<(S, S, Instant)>,
}

/// Result of considering one occurrence: a ranked shortlist for suggestion
/// mode and/or a single auto-emitted line.
pub struct DirectorOutcome {
    pub suggestions: Vec<&'static Line>,
    pub auto_emitted: Option<&'static Line>,
}

impl<S: Eq + std::hash::Hash + Clone> TauntDirector<S> {
    pub fn new(profile: TauntProfile) -> Self {
        Self {
            profile,
            cooldown_until: HashMap::new(),
            recent_emits: HashMap::new(),
            room_auto_burst: VecDeque::new(),
            actor_recent_lines: HashMap::new(),
            revenge_memory: Vec::new(),
        }
    }

    /// Resolves the target of an untargeted event (§4.4 step 2): the
    /// chasing player if the actor leads, otherwise the leader.
    pub fn select_target(actor_is_leader: bool, leader: S, chaser: S) -> S {
        if actor_is_leader {
            chaser
        } else {
            leader
        }
    }

    /// Records a capture for revenge-kill detection and returns whether this
    /// capture itself completes a revenge (the victim striking back against
    /// their former killer within the window).
    pub fn record_capture(&mut self, killer: S, victim: S, now: Instant) -> bool {
        self.revenge_memory.retain(|(_, _, ts)| now.duration_since(*ts) <= self.profile.revenge_window);
        let mut avenged = false;
        if let Some(pos) = self
            .revenge_memory
            .iter()
            .position(|(old_killer, old_victim, _)| *old_killer == victim && *old_victim == killer)
        {
            self.revenge_memory.remove(pos);
            avenged = true;
        }
        self.revenge_memory.push((killer, victim, now));
        avenged
    }

    /// §4.4 steps 1-4 for a single occurrence. `mode_auto` selects whether
    /// auto-emission is attempted at all (auto/hybrid modes); suggestions are
    /// always computed so suggestion/hybrid modes have something to offer.
    pub fn consider(
        &mut self,
        event: TauntEvent,
        actor: S,
        mode_auto: bool,
        phase_boost_emotions: &[Emotion],
        now: Instant,
        rng: &mut impl Rng,
    ) -> DirectorOutcome {
        let emotions: &[Emotion] = candidate_emotions(event);
        let recently_used: HashSet<&'static str> =
            self.actor_recent_lines.get(&actor).into_iter().flatten().copied().collect();
        let actor_last_line = self.actor_recent_lines.get(&actor).and_then(|q| q.back().copied());
        let ranked = rank_lines(event, emotions, &recently_used, actor_last_line, phase_boost_emotions);

        let suggestions = weighted_sample_distinct(&ranked, 3, rng);

        let auto_emitted = if mode_auto {
            ranked.first().and_then(|(line, _)| {
                if self.can_auto_emit(&actor, now) {
                    self.record_emit(actor.clone(), line.id, now);
                    Some(*line)
                } else {
                    None
                }
            })
        } else {
            None
        };

        DirectorOutcome { suggestions, auto_emitted }
    }

    fn can_auto_emit(&mut self, actor: &S, now: Instant) -> bool {
        if self.cooldown_until.get(actor).is_some_and(|until| now < *until) {
            return false;
        }
        let window = self.recent_emits.entry(actor.clone()).or_default();
        while window.front().is_some_and(|ts| now.duration_since(*ts) > std::time::Duration::from_secs(60)) {
            window.pop_front();
        }
        if window.len() as u32 >= self.profile.limit_per_minute {
            return false;
        }
        while self.room_auto_burst.front().is_some_and(|ts| now.duration_since(*ts) > self.profile.auto_burst_window)
        {
            self.room_auto_burst.pop_front();
        }
        if self.room_auto_burst.len() as u32 >= self.profile.auto_burst_limit {
            return false;
        }
        true
    }

    fn record_emit(&mut self, actor: S, line_id: &'static str, now: Instant) {
        self.cooldown_until.insert(actor.clone(), now + self.profile.cooldown);
        self.recent_emits.entry(actor.clone()).or_default().push_back(now);
        self.room_auto_burst.push_back(now);
        let lines = self.actor_recent_lines.entry(actor).or_default();
        lines.push_back(line_id);
        if lines.len() > 5 {
            lines.pop_front();
        }
    }
}

fn weighted_sample_distinct(
    ranked: &[(&'static Line, f64)],
    count: usize,
    rng: &mut impl Rng,
) -> Vec<&'static Line> {
    let mut pool: Vec<(&'static Line, f64)> =
        ranked.iter().map(|(l, s)| (*l, s.max(0.01))).collect();
    let mut picked = Vec::with_capacity(count);
    for _ in 0..count {
        if pool.is_empty() {
            break;
        }
        let total: f64 = pool.iter().map(|(_, w)| w).sum();
        let mut r = rng.random_range(0.0..total);
        let mut idx = pool.len() - 1;
        for (i, (_, w)) in pool.iter().enumerate() {
            if r < *w {
                idx = i;
                break;
            }
            r -= w;
        }
        picked.push(pool.remove(idx).0);
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn revenge_kill_detected_within_window() {
        let mut director: TauntDirector<u8> = TauntDirector::new(TauntProfile::default());
        let t0 = Instant::now();
        let first = director.record_capture(1, 2, t0);
        assert!(!first);
        let revenge = director.record_capture(2, 1, t0 + std::time::Duration::from_secs(30));
        assert!(revenge);
    }

    #[test]
    fn auto_burst_limit_blocks_third_emit_in_window() {
        let mut director: TauntDirector<u8> = TauntDirector::new(TauntProfile::default());
        let mut rng = SmallRng::seed_from_u64(1);
        let t0 = Instant::now();
        let r1 = director.consider(TauntEvent::RolledSix, 1, true, &[], t0, &mut rng);
        assert!(r1.auto_emitted.is_some());
        let r2 = director.consider(TauntEvent::RolledSix, 2, true, &[], t0, &mut rng);
        assert!(r2.auto_emitted.is_some());
        let r3 = director.consider(TauntEvent::RolledSix, 3, true, &[], t0, &mut rng);
        assert!(r3.auto_emitted.is_none());
    }

    #[test]
    fn cooldown_blocks_same_actor_immediate_repeat() {
        let mut director: TauntDirector<u8> = TauntDirector::new(TauntProfile::default());
        let mut rng = SmallRng::seed_from_u64(2);
        let t0 = Instant::now();
        let first = director.consider(TauntEvent::RolledSix, 1, true, &[], t0, &mut rng);
        assert!(first.auto_emitted.is_some());
        let second = director.consider(TauntEvent::RolledSix, 1, true, &[], t0 + std::time::Duration::from_millis(100), &mut rng);
        assert!(second.auto_emitted.is_none());
    }
}

/// Coarse narrative phase of a match, used to shape tempo/assist weighting
/// (§4.3 "story phase"). Advances monotonically; never regresses within a
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum StoryPhase {
    Start,
    Spread,
    Fights,
    Leader,
    Hope,
    Chaos,
    Finish,
}

impl StoryPhase {
    pub fn tempo_multiplier(self) -> f64 {
        match self {
            StoryPhase::Start => 1.0,
            StoryPhase::Spread => 1.05,
            StoryPhase::Fights => 1.15,
            StoryPhase::Leader => 1.2,
            StoryPhase::Hope => 1.3,
            StoryPhase::Chaos => 1.25,
            StoryPhase::Finish => 1.1,
        }
    }
}

/// Room-scoped narrative tracker, persisted at `engagement:{roomId}:story-director`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoryDirector {
    pub phase: StoryPhase,
    pub total_rolls: u32,
    pub capture_count: u32,
    pub leader_change_count: u32,
    pub comeback_pulse_count: u32,
    last_leader_seat: Option<usize>,
}

impl Default for StoryDirector {
    fn default() -> Self {
        Self {
            phase: StoryPhase::Start,
            total_rolls: 0,
            capture_count: 0,
            leader_change_count: 0,
            comeback_pulse_count: 0,
            last_leader_seat: None,
        }
    }
}

impl StoryDirector {
    /// Called once per resolved roll. `leader_seat` is `None` when no token
    /// has left base yet.
    pub fn report_roll(
        &mut self,
        captured_this_turn: u32,
        leader_seat: Option<usize>,
        any_player_near_win: bool,
        comeback_triggered: bool,
    ) {
        self.total_rolls += 1;
        self.capture_count += captured_this_turn;
        if leader_seat.is_some() && leader_seat != self.last_leader_seat && self.last_leader_seat.is_some() {
            self.leader_change_count += 1;
        }
        if leader_seat.is_some() {
            self.last_leader_seat = leader_seat;
        }
        if comeback_triggered {
            self.comeback_pulse_count += 1;
        }
        self.advance_phase(any_player_near_win);
    }

    fn advance_phase(&mut self, any_player_near_win: bool) {
        let next = if any_player_near_win {
            StoryPhase::Finish
        } else if self.comeback_pulse_count >= 2 {
            StoryPhase::Hope
        } else if self.leader_change_count >= 3 {
            StoryPhase::Chaos
        } else if self.last_leader_seat.is_some() && self.total_rolls > 20 {
            StoryPhase::Leader
        } else if self.capture_count >= 3 {
            StoryPhase::Fights
        } else if self.total_rolls >= 6 {
            StoryPhase::Spread
        } else {
            StoryPhase::Start
        };
        if next > self.phase {
            self.phase = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_never_regresses() {
        let mut d = StoryDirector::default();
        d.report_roll(0, None, false, false);
        for _ in 0..10 {
            d.report_roll(0, Some(0), false, false);
        }
        let reached = d.phase;
        d.report_roll(0, Some(0), false, false);
        assert!(d.phase >= reached);
    }

    #[test]
    fn near_win_forces_finish_phase() {
        let mut d = StoryDirector::default();
        d.report_roll(0, Some(0), true, false);
        assert_eq!(d.phase, StoryPhase::Finish);
    }
}

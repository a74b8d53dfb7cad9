use ludo_dice::{ForceState, Momentum, StoryDirector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-room engagement bookkeeping, kept alongside [`crate::model::RoomState`]
/// inside the value [`ludo_store::GameStateCache`] manages so it rides the
/// same `runExclusive` critical section the roll/move operations use (§5
/// "Reporting engagement ... outcomes ... are performed inside the critical
/// section"). Keyed by seat id, matching the shared-cache key shape
/// `engagement:{roomId}:player:{pid}:momentum` (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngagementState {
    pub momentum: HashMap<String, Momentum>,
    pub force_state: ForceState,
    pub story: StoryDirector,
}

impl EngagementState {
    pub fn momentum_for(&mut self, seat_id: &str) -> &mut Momentum {
        self.momentum.entry(seat_id.to_string()).or_default()
    }
}

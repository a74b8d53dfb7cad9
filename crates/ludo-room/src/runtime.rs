use crate::engagement::EngagementState;
use crate::model::RoomState;
use serde::{Deserialize, Serialize};

/// Combined per-room unit held by the write-behind cache (§4.5): the
/// client-facing [`RoomState`] plus the engagement engine's momentum/story
/// bookkeeping, so both mutate under the same `runExclusive` critical
/// section (§5 "Reporting engagement ... outcomes ... are performed inside
/// the critical section"). Only `state` is ever projected into a durable
/// upsert (§4.5 "compose a durable-store upsert with `{status,
/// currentPlayerIndex, gameBoard}`") — `engagement` is runtime-only, mirrored
/// at best-effort into the shared cache under its own keys (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomRuntime {
    pub state: RoomState,
    pub engagement: EngagementState,
}

impl RoomRuntime {
    pub fn new(state: RoomState) -> Self {
        Self { state, engagement: EngagementState::default() }
    }
}

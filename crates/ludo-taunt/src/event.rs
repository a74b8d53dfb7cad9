use serde::{Deserialize, Serialize};

/// A social trigger emitted from roll/move resolution (§4.4). One
/// `Occurrence` batch may carry several of these per resolved action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TauntEvent {
    RolledSix,
    ReleasedToken,
    Captured,
    GotCaptured,
    EnteredSafe,
    NearWin,
    LeadChange,
    LastPlace,
    RevengeKill,
    ClutchRoll,
}

/// A single event reported by the room coordinator, with the seat it
/// concerns and, when the event already implies a counterpart (a kill has a
/// victim, a capture has a killer), that counterpart seat.
#[derive(Debug, Clone, Copy)]
pub struct Occurrence<S> {
    pub event: TauntEvent,
    pub actor: S,
    pub counterpart: Option<S>,
}

impl<S> Occurrence<S> {
    pub fn new(event: TauntEvent, actor: S) -> Self {
        Self { event, actor, counterpart: None }
    }

    pub fn with_counterpart(event: TauntEvent, actor: S, counterpart: S) -> Self {
        Self { event, actor, counterpart: Some(counterpart) }
    }
}

use crate::event::TauntEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Dominance,
    Revenge,
    MockEscape,
    Appreciation,
    PanicReaction,
    Pressure,
    Comeback,
    Clutch,
}

/// Fixed event→emotion mapping (§4.4 step 1). An event can suggest more than
/// one candidate emotion; ranking later narrows to the line that fits best.
pub fn candidate_emotions(event: TauntEvent) -> &'static [Emotion] {
    use Emotion::*;
    use TauntEvent::*;
    match event {
        RolledSix => &[Dominance, Clutch],
        ReleasedToken => &[Appreciation],
        Captured => &[Dominance, MockEscape],
        GotCaptured => &[PanicReaction, Revenge],
        EnteredSafe => &[MockEscape, Appreciation],
        NearWin => &[Dominance, Pressure],
        LeadChange => &[Dominance, Pressure],
        LastPlace => &[PanicReaction, Comeback],
        RevengeKill => &[Revenge, Dominance],
        ClutchRoll => &[Clutch, Pressure],
    }
}

use crate::emotion::Emotion;
use crate::event::TauntEvent;

/// A static quick-message entry. `triggers` and `emotions` are the axes
/// ranking is scored against (§4.4 step 3).
#[derive(Debug, Clone, Copy)]
pub struct Line {
    pub id: &'static str,
    pub text: &'static str,
    pub triggers: &'static [TauntEvent],
    pub emotions: &'static [Emotion],
    pub weight: f64,
}

use Emotion::*;
use TauntEvent::*;

pub const CATALOG: &[Line] = &[
    Line { id: "six_flex", text: "Sixes don't miss.", triggers: &[RolledSix], emotions: &[Dominance], weight: 1.0 },
    Line { id: "six_clutch", text: "Right when it mattered.", triggers: &[RolledSix, ClutchRoll], emotions: &[Clutch], weight: 1.1 },
    Line { id: "release_hype", text: "Here we go!", triggers: &[ReleasedToken], emotions: &[Appreciation], weight: 0.7 },
    Line { id: "capture_mock", text: "Back to base you go.", triggers: &[Captured], emotions: &[Dominance, MockEscape], weight: 1.2 },
    Line { id: "capture_cold", text: "Nothing personal.", triggers: &[Captured], emotions: &[Dominance], weight: 0.9 },
    Line { id: "got_captured_salt", text: "Oh come on!", triggers: &[GotCaptured], emotions: &[PanicReaction], weight: 1.0 },
    Line { id: "revenge_plan", text: "I'm remembering that.", triggers: &[GotCaptured], emotions: &[Revenge], weight: 0.8 },
    Line { id: "safe_relief", text: "Safe and sound.", triggers: &[EnteredSafe], emotions: &[MockEscape, Appreciation], weight: 0.8 },
    Line { id: "near_win_tease", text: "Can you feel that?", triggers: &[NearWin], emotions: &[Dominance, Pressure], weight: 1.3 },
    Line { id: "lead_change_shock", text: "Plot twist!", triggers: &[LeadChange], emotions: &[Pressure], weight: 1.0 },
    Line { id: "lead_change_claim", text: "My turn to lead.", triggers: &[LeadChange], emotions: &[Dominance], weight: 1.0 },
    Line { id: "last_place_cope", text: "I'm just getting started.", triggers: &[LastPlace], emotions: &[Comeback], weight: 0.9 },
    Line { id: "last_place_panic", text: "This is not going well.", triggers: &[LastPlace], emotions: &[PanicReaction], weight: 0.7 },
    Line { id: "revenge_served", text: "Revenge is sweet.", triggers: &[RevengeKill], emotions: &[Revenge, Dominance], weight: 1.5 },
    Line { id: "clutch_cool", text: "Ice in my veins.", triggers: &[ClutchRoll], emotions: &[Clutch], weight: 1.2 },
];

pub fn lines_for(event: TauntEvent) -> impl Iterator<Item = &'static Line> {
    CATALOG.iter().filter(move |l| l.triggers.contains(&event))
}

use crate::catalog::{lines_for, Line};
use crate::emotion::Emotion;
use crate::event::TauntEvent;
use std::collections::HashSet;

const RECENTLY_USED_PENALTY: f64 = 0.6;
const ACTOR_LAST_LINE_PENALTY: f64 = 0.9;
const PHASE_BOOST: f64 = 0.4;

/// Scores and orders every catalog line tagged with `event`, highest first
/// (§4.4 step 3). Ties are broken by catalog order, which keeps results
/// deterministic for a fixed `(event, emotions, history)` input.
pub fn rank_lines(
    event: TauntEvent,
    emotions: &[Emotion],
    recently_used: &HashSet<&'static str>,
    actor_last_line: Option<&'static str>,
    phase_boost_emotions: &[Emotion],
) -> Vec<(&'static Line, f64)> {
    let mut scored: Vec<(&'static Line, f64)> = lines_for(event)
        .map(|line| {
            let trigger_score = 1.0;
            let emotion_overlap = line.emotions.iter().filter(|e| emotions.contains(e)).count() as f64;
            let mut score = trigger_score + emotion_overlap * 0.5 + line.weight;
            if recently_used.contains(line.id) {
                score -= RECENTLY_USED_PENALTY;
            }
            if actor_last_line == Some(line.id) {
                score -= ACTOR_LAST_LINE_PENALTY;
            }
            if line.emotions.iter().any(|e| phase_boost_emotions.contains(e)) {
                score += PHASE_BOOST;
            }
            (line, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recently_used_line_is_penalized_below_fresh_alternative() {
        let mut recent = HashSet::new();
        recent.insert("capture_mock");
        let ranked = rank_lines(TauntEvent::Captured, &[Emotion::Dominance], &recent, None, &[]);
        let mock_rank = ranked.iter().position(|(l, _)| l.id == "capture_mock").unwrap();
        let cold_rank = ranked.iter().position(|(l, _)| l.id == "capture_cold").unwrap();
        assert!(cold_rank < mock_rank);
    }
}

use std::collections::BTreeMap;

use super::models::{HighScoreEntry, PlacedScore, ScoreOwner};
use crate::competition::ScoreOrder;
use crate::ledger::BestPlacement;

/// Orders scores best-first and numbers them from 1.
///
/// Equal scores are separated by who got there first (`achieved_at`), then
/// by submission order. Every score gets its own placement.
pub fn rank_scores(mut entries: Vec<HighScoreEntry>, order: ScoreOrder) -> Vec<PlacedScore> {
    entries.sort_by(|a, b| {
        let by_score = match order {
            ScoreOrder::HighestWins => b.score.total_cmp(&a.score),
            ScoreOrder::LowestWins => a.score.total_cmp(&b.score),
        };
        by_score.then_with(|| a.achieved_at.cmp(&b.achieved_at))
    });

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| PlacedScore {
            placement: index as u32 + 1,
            entry,
        })
        .collect()
}

/// Collapses ranked scores to each team's best placement, attributed to
/// the participant who achieved it.
pub fn best_team_placements(placed: &[PlacedScore]) -> BTreeMap<String, BestPlacement> {
    let mut best: BTreeMap<String, BestPlacement> = BTreeMap::new();

    for score in placed {
        let candidate = BestPlacement {
            placement: score.placement,
            participants: match &score.entry.owner {
                ScoreOwner::Participant(participant) => vec![participant.clone()],
                ScoreOwner::Team { .. } => Vec::new(),
            },
        };

        best.entry(score.entry.event_team_id.clone())
            .and_modify(|current| {
                if candidate.placement < current.placement {
                    *current = candidate.clone();
                }
            })
            .or_insert(candidate);
    }

    best
}

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use super::models::{
    DiscretionaryAward, MatchPoints, NewPointEntry, PointCategory, PointOutcome, SourceKind,
    SourceRef,
};
use crate::competition::{AttributedParticipant, GameCategory};
use crate::shared::ScoringError;

/// A side member whose team is already known
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMember {
    pub event_team_id: String,
    pub participant: Option<AttributedParticipant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSide {
    pub rank: u32,
    pub members: Vec<ResolvedMember>,
}

/// A team's best placement within a session or tournament
#[derive(Debug, Clone, PartialEq)]
pub struct BestPlacement {
    pub placement: u32,
    pub participants: Vec<AttributedParticipant>,
}

pub fn match_category(category: GameCategory) -> Option<PointCategory> {
    match category {
        GameCategory::HeadToHead => Some(PointCategory::H2hMatch),
        GameCategory::FreeForAll => Some(PointCategory::FfaMatch),
        GameCategory::HighScore => None,
    }
}

/// Outcome for each side, by position.
///
/// A lone side holding the best rank wins. Sides sharing the best rank draw.
/// Everyone else loses.
pub fn side_outcomes(ranks: &[u32]) -> Vec<PointOutcome> {
    let Some(best) = ranks.iter().min().copied() else {
        return Vec::new();
    };
    let leaders = ranks.iter().filter(|rank| **rank == best).count();

    ranks
        .iter()
        .map(|rank| match (*rank == best, leaders) {
            (true, 1) => PointOutcome::Win,
            (true, _) => PointOutcome::Draw,
            (false, _) => PointOutcome::Loss,
        })
        .collect()
}

/// One entry per distinct team across all sides.
///
/// A team fielding several players on a side still gets a single entry
/// naming all of them. If a team shows up on more than one side only its
/// first side counts. Nothing is produced when no point values were given.
pub fn entries_for_match(
    match_id: &str,
    event_id: &str,
    category: PointCategory,
    sides: &[ResolvedSide],
    points: Option<&MatchPoints>,
) -> Result<Vec<NewPointEntry>, ScoringError> {
    let Some(points) = points else {
        debug!(match_id, "Match recorded without point values");
        return Ok(Vec::new());
    };

    let ranks: Vec<u32> = sides.iter().map(|side| side.rank).collect();
    let outcomes = side_outcomes(&ranks);

    // team id -> (side index, entry)
    let mut by_team: HashMap<String, (usize, NewPointEntry)> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for (side_index, (side, outcome)) in sides.iter().zip(outcomes).enumerate() {
        let value = match outcome {
            PointOutcome::Win => points.win,
            PointOutcome::Draw => points.draw_points(),
            _ => points.loss,
        };

        for member in &side.members {
            match by_team.get_mut(&member.event_team_id) {
                Some((first_side, entry)) => {
                    if *first_side == side_index {
                        if let Some(participant) = &member.participant {
                            entry.participants.push(participant.clone());
                        }
                    }
                }
                None => {
                    let entry = NewPointEntry::new(
                        event_id,
                        &member.event_team_id,
                        SourceRef::for_match(match_id),
                        category,
                        outcome,
                        value,
                    )?
                    .with_participants(member.participant.iter().cloned().collect());
                    order.push(member.event_team_id.clone());
                    by_team.insert(member.event_team_id.clone(), (side_index, entry));
                }
            }
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|team_id| by_team.remove(&team_id).map(|(_, entry)| entry))
        .collect())
}

/// One entry per team whose best placement has a configured reward.
///
/// Teams placing outside the configuration are skipped; that is a gap in
/// the configuration, not an error.
pub fn entries_for_placements(
    source: &SourceRef,
    event_id: &str,
    team_best_placement: &BTreeMap<String, BestPlacement>,
    config: &BTreeMap<u32, f64>,
) -> Result<Vec<NewPointEntry>, ScoringError> {
    let category = match source.kind {
        SourceKind::HighScoreSession => PointCategory::HighScore,
        SourceKind::Tournament => PointCategory::Tournament,
        other => {
            return Err(ScoringError::Validation(format!(
                "{} sources do not award placement points",
                other
            )))
        }
    };

    let mut placed: Vec<(&String, &BestPlacement)> = team_best_placement.iter().collect();
    placed.sort_by_key(|(_, best)| best.placement);

    let mut entries = Vec::with_capacity(placed.len());
    for (team_id, best) in placed {
        let Some(points) = config.get(&best.placement) else {
            debug!(
                team_id = %team_id,
                placement = best.placement,
                "No points configured for placement"
            );
            continue;
        };

        entries.push(
            NewPointEntry::new(
                event_id,
                team_id,
                source.clone(),
                category,
                PointOutcome::Placement,
                *points,
            )?
            .with_participants(best.participants.clone()),
        );
    }

    Ok(entries)
}

/// One entry per distinct recipient team
pub fn entries_for_award(award: &DiscretionaryAward) -> Result<Vec<NewPointEntry>, ScoringError> {
    distinct_teams(&award.recipients)
        .into_iter()
        .map(|team_id| {
            NewPointEntry::new(
                &award.event_id,
                &team_id,
                SourceRef::for_award(&award.id),
                PointCategory::Discretionary,
                PointOutcome::Award,
                award.points,
            )
        })
        .collect()
}

/// Team ids with duplicates removed, first occurrence kept
pub fn distinct_teams(team_ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    team_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(team: &str, user: Option<&str>) -> ResolvedMember {
        ResolvedMember {
            event_team_id: team.to_string(),
            participant: user.map(|u| AttributedParticipant::user(u, u)),
        }
    }

    fn side(rank: u32, members: Vec<ResolvedMember>) -> ResolvedSide {
        ResolvedSide { rank, members }
    }

    const POINTS: MatchPoints = MatchPoints {
        win: 3.0,
        loss: 0.0,
        draw: Some(1.0),
    };

    #[test]
    fn outcomes_for_clear_winner_and_shared_lead() {
        use PointOutcome::*;
        assert_eq!(side_outcomes(&[1, 2]), vec![Win, Loss]);
        assert_eq!(side_outcomes(&[2, 1, 3]), vec![Loss, Win, Loss]);
        assert_eq!(side_outcomes(&[1, 1]), vec![Draw, Draw]);
        assert_eq!(side_outcomes(&[1, 1, 2]), vec![Draw, Draw, Loss]);
        assert!(side_outcomes(&[]).is_empty());
    }

    #[test]
    fn team_with_two_winners_gets_one_entry() {
        let sides = vec![
            side(1, vec![member("red", Some("ann")), member("red", Some("bo"))]),
            side(2, vec![member("blue", Some("cy"))]),
        ];

        let entries =
            entries_for_match("m-1", "e-1", PointCategory::H2hMatch, &sides, Some(&POINTS))
                .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event_team_id, "red");
        assert_eq!(entries[0].outcome, PointOutcome::Win);
        assert_eq!(entries[0].points, 3.0);
        assert_eq!(entries[0].participants.len(), 2);
        assert_eq!(entries[1].event_team_id, "blue");
        assert_eq!(entries[1].outcome, PointOutcome::Loss);
    }

    #[test]
    fn team_on_two_sides_keeps_first_side_only() {
        let sides = vec![
            side(1, vec![member("red", Some("ann"))]),
            side(2, vec![member("red", Some("bo")), member("blue", None)]),
        ];

        let entries =
            entries_for_match("m-1", "e-1", PointCategory::FfaMatch, &sides, Some(&POINTS))
                .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].participants, vec![AttributedParticipant::user("ann", "ann")]);
        assert!(entries[1].participants.is_empty());
    }

    #[test]
    fn draw_uses_draw_points() {
        let sides = vec![side(1, vec![member("red", None)]), side(1, vec![member("blue", None)])];

        let entries =
            entries_for_match("m-1", "e-1", PointCategory::H2hMatch, &sides, Some(&POINTS))
                .unwrap();

        assert!(entries
            .iter()
            .all(|e| e.outcome == PointOutcome::Draw && e.points == 1.0));
    }

    #[test]
    fn match_without_points_produces_nothing() {
        let sides = vec![side(1, vec![member("red", None)]), side(2, vec![member("blue", None)])];

        let entries =
            entries_for_match("m-1", "e-1", PointCategory::H2hMatch, &sides, None).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn placements_without_reward_are_omitted() {
        let mut best = BTreeMap::new();
        best.insert(
            "red".to_string(),
            BestPlacement {
                placement: 1,
                participants: vec![],
            },
        );
        best.insert(
            "blue".to_string(),
            BestPlacement {
                placement: 3,
                participants: vec![],
            },
        );
        let config: BTreeMap<u32, f64> = [(1, 10.0), (2, 5.0)].into_iter().collect();

        let entries =
            entries_for_placements(&SourceRef::for_session("s-1"), "e-1", &best, &config).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_team_id, "red");
        assert_eq!(entries[0].category, PointCategory::HighScore);
        assert_eq!(entries[0].points, 10.0);
    }

    #[test]
    fn placements_reject_award_sources() {
        let result = entries_for_placements(
            &SourceRef::for_award("a-1"),
            "e-1",
            &BTreeMap::new(),
            &BTreeMap::new(),
        );
        assert!(matches!(result, Err(ScoringError::Validation(_))));
    }

    #[test]
    fn award_entries_dedupe_recipients() {
        let award = DiscretionaryAward {
            id: "a-1".into(),
            event_id: "e-1".into(),
            name: "Best costume".into(),
            points: 5.0,
            recipients: vec!["red".into(), "blue".into(), "red".into()],
            awarded_at: chrono::Utc::now(),
        };

        let entries = entries_for_award(&award).unwrap();
        let teams: Vec<&str> = entries.iter().map(|e| e.event_team_id.as_str()).collect();
        assert_eq!(teams, vec!["red", "blue"]);
        assert!(entries.iter().all(|e| e.points == 5.0));
    }
}

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::builders::{
    distinct_teams, entries_for_award, entries_for_match, entries_for_placements, match_category,
    BestPlacement, ResolvedMember, ResolvedSide,
};
use super::models::{
    placement_point_map, validate_placement_config, AwardUpdate, DiscretionaryAward, MatchPoints,
    MatchRecord, MatchSide, NewAward, NewMatch, NewPointEntry, PlacementPoints, PointCategory,
    PointEntry, SourceRef, TeamStanding,
};
use super::{operations, standings};
use crate::competition::lookups::{
    event_team_ids, require_active_event, require_event, require_event_teams, require_game_type,
    resolve_participant_team,
};
use crate::competition::{GameTypeModel, ParticipantType};
use crate::shared::ScoringError;
use crate::store::{ScoringStore, ScoringTransaction};

/// Final placement of a team in a tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentPlacement {
    pub team_id: String,
    pub placement: u32,
}

/// Records and regenerates point entries for matches, awards and
/// tournaments. Each public operation runs in exactly one transaction.
pub struct LedgerService {
    store: Arc<dyn ScoringStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn ScoringStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, new_match), fields(event_id = %new_match.event_id))]
    pub async fn record_match(
        &self,
        new_match: NewMatch,
    ) -> Result<(MatchRecord, Vec<PointEntry>), ScoringError> {
        validate_match_points(new_match.points.as_ref())?;

        let mut tx = self.store.begin().await?;
        let event = require_active_event(tx.as_mut(), &new_match.event_id).await?;
        let game_type = require_game_type(tx.as_mut(), &event.id, &new_match.game_type_id).await?;
        let category = require_match_category(&game_type)?;
        let resolved = resolve_sides(tx.as_mut(), &event.id, &game_type, &new_match.sides).await?;

        let record = MatchRecord {
            id: Uuid::new_v4().to_string(),
            event_id: event.id.clone(),
            game_type_id: game_type.id.clone(),
            sides: new_match.sides,
            points: new_match.points,
            recorded_at: Utc::now(),
        };
        tx.insert_match(&record).await?;

        let entries = entries_for_match(
            &record.id,
            &record.event_id,
            category,
            &resolved,
            record.points.as_ref(),
        )?;
        let source = SourceRef::for_match(&record.id);
        let stored = operations::recreate_for_source(tx.as_mut(), &source, &entries).await?;
        tx.commit().await?;

        info!(match_id = %record.id, entries = stored.len(), "Match recorded");
        Ok((record, stored))
    }

    /// Replaces a match's sides and point values and regenerates its entries
    #[instrument(skip(self, sides, points))]
    pub async fn update_match_result(
        &self,
        match_id: &str,
        sides: Vec<MatchSide>,
        points: Option<MatchPoints>,
    ) -> Result<(MatchRecord, Vec<PointEntry>), ScoringError> {
        validate_match_points(points.as_ref())?;

        let mut tx = self.store.begin().await?;
        tx.lock_source(&SourceRef::for_match(match_id)).await?;
        let mut record = tx
            .get_match(match_id)
            .await?
            .ok_or_else(|| ScoringError::not_found("Match", match_id))?;
        let game_type =
            require_game_type(tx.as_mut(), &record.event_id, &record.game_type_id).await?;
        let category = require_match_category(&game_type)?;
        let resolved = resolve_sides(tx.as_mut(), &record.event_id, &game_type, &sides).await?;

        record.sides = sides;
        record.points = points;
        tx.update_match(&record).await?;

        let entries = entries_for_match(
            &record.id,
            &record.event_id,
            category,
            &resolved,
            record.points.as_ref(),
        )?;
        let source = SourceRef::for_match(&record.id);
        let stored = operations::recreate_for_source(tx.as_mut(), &source, &entries).await?;
        tx.commit().await?;

        info!(match_id = %record.id, entries = stored.len(), "Match result updated");
        Ok((record, stored))
    }

    #[instrument(skip(self))]
    pub async fn delete_match(&self, match_id: &str) -> Result<(), ScoringError> {
        let mut tx = self.store.begin().await?;
        tx.lock_source(&SourceRef::for_match(match_id)).await?;
        if tx.get_match(match_id).await?.is_none() {
            return Err(ScoringError::not_found("Match", match_id));
        }

        operations::delete_for_source(tx.as_mut(), &SourceRef::for_match(match_id)).await?;
        tx.delete_match(match_id).await?;
        tx.commit().await?;

        info!(match_id, "Match deleted");
        Ok(())
    }

    #[instrument(skip(self, new_award), fields(event_id = %new_award.event_id))]
    pub async fn create_award(
        &self,
        new_award: NewAward,
    ) -> Result<(DiscretionaryAward, Vec<PointEntry>), ScoringError> {
        validate_award(new_award.points, &new_award.recipients)?;

        let mut tx = self.store.begin().await?;
        let event = require_active_event(tx.as_mut(), &new_award.event_id).await?;
        require_event_teams(tx.as_mut(), &event.id, &new_award.recipients).await?;

        let award = DiscretionaryAward {
            id: Uuid::new_v4().to_string(),
            event_id: event.id,
            name: new_award.name,
            points: new_award.points,
            recipients: distinct_teams(&new_award.recipients),
            awarded_at: Utc::now(),
        };
        tx.insert_award(&award).await?;

        let entries = entries_for_award(&award)?;
        let stored =
            operations::recreate_for_source(tx.as_mut(), &SourceRef::for_award(&award.id), &entries)
                .await?;
        tx.commit().await?;

        info!(award_id = %award.id, recipients = award.recipients.len(), "Award created");
        Ok((award, stored))
    }

    /// Applies an update. Entries are regenerated only when the point value
    /// or the recipient set changed.
    #[instrument(skip(self, update))]
    pub async fn update_award(
        &self,
        award_id: &str,
        update: AwardUpdate,
    ) -> Result<(DiscretionaryAward, Vec<PointEntry>), ScoringError> {
        let mut tx = self.store.begin().await?;
        tx.lock_source(&SourceRef::for_award(award_id)).await?;
        let mut award = tx
            .get_award(award_id)
            .await?
            .ok_or_else(|| ScoringError::not_found("Award", award_id))?;

        let points = update.points.unwrap_or(award.points);
        let recipients = update
            .recipients
            .as_deref()
            .map(distinct_teams)
            .unwrap_or_else(|| award.recipients.clone());
        validate_award(points, &recipients)?;
        require_event_teams(tx.as_mut(), &award.event_id, &recipients).await?;

        let scoring_changed = points != award.points || recipients != award.recipients;

        if let Some(name) = update.name {
            award.name = name;
        }
        award.points = points;
        award.recipients = recipients;
        tx.update_award(&award).await?;

        let source = SourceRef::for_award(&award.id);
        let stored = if scoring_changed {
            let entries = entries_for_award(&award)?;
            operations::recreate_for_source(tx.as_mut(), &source, &entries).await?
        } else {
            tx.list_point_entries_for_source(&source).await?
        };
        tx.commit().await?;

        info!(award_id = %award.id, scoring_changed, "Award updated");
        Ok((award, stored))
    }

    #[instrument(skip(self))]
    pub async fn delete_award(&self, award_id: &str) -> Result<(), ScoringError> {
        let mut tx = self.store.begin().await?;
        tx.lock_source(&SourceRef::for_award(award_id)).await?;
        if tx.get_award(award_id).await?.is_none() {
            return Err(ScoringError::not_found("Award", award_id));
        }

        operations::delete_for_source(tx.as_mut(), &SourceRef::for_award(award_id)).await?;
        tx.delete_award(award_id).await?;
        tx.commit().await?;

        info!(award_id, "Award deleted");
        Ok(())
    }

    /// Regenerates the placement entries of a finished tournament.
    ///
    /// A team listed more than once keeps its best placement.
    #[instrument(skip(self, placements, config))]
    pub async fn record_tournament_placements(
        &self,
        event_id: &str,
        tournament_id: &str,
        placements: &[TournamentPlacement],
        config: &[PlacementPoints],
    ) -> Result<Vec<PointEntry>, ScoringError> {
        validate_placement_config(config)?;
        if placements.iter().any(|p| p.placement == 0) {
            return Err(ScoringError::Validation(
                "Placements start at 1".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;
        let event = require_event(tx.as_mut(), event_id).await?;
        let team_ids: Vec<String> = placements.iter().map(|p| p.team_id.clone()).collect();
        require_event_teams(tx.as_mut(), &event.id, &team_ids).await?;

        let mut best: BTreeMap<String, BestPlacement> = BTreeMap::new();
        for placement in placements {
            let current = best
                .entry(placement.team_id.clone())
                .or_insert(BestPlacement {
                    placement: placement.placement,
                    participants: Vec::new(),
                });
            current.placement = current.placement.min(placement.placement);
        }

        let source = SourceRef::for_tournament(tournament_id);
        let entries =
            entries_for_placements(&source, &event.id, &best, &placement_point_map(config))?;
        let stored = operations::recreate_for_source(tx.as_mut(), &source, &entries).await?;
        tx.commit().await?;

        info!(tournament_id, entries = stored.len(), "Tournament placements recorded");
        Ok(stored)
    }

    #[instrument(skip(self))]
    pub async fn delete_tournament_points(&self, tournament_id: &str) -> Result<u64, ScoringError> {
        self.delete_for_source(&SourceRef::for_tournament(tournament_id))
            .await
    }

    /// Replaces a source's entries in a standalone transaction
    pub async fn recreate_for_source(
        &self,
        source: &SourceRef,
        new_entries: &[NewPointEntry],
    ) -> Result<Vec<PointEntry>, ScoringError> {
        let mut tx = self.store.begin().await?;
        let stored = operations::recreate_for_source(tx.as_mut(), source, new_entries).await?;
        tx.commit().await?;
        Ok(stored)
    }

    pub async fn delete_for_source(&self, source: &SourceRef) -> Result<u64, ScoringError> {
        let mut tx = self.store.begin().await?;
        let removed = operations::delete_for_source(tx.as_mut(), source).await?;
        tx.commit().await?;
        Ok(removed)
    }

    pub async fn entries_for_source(
        &self,
        source: &SourceRef,
    ) -> Result<Vec<PointEntry>, ScoringError> {
        let mut tx = self.store.begin().await?;
        tx.list_point_entries_for_source(source).await
    }

    pub async fn event_entries(&self, event_id: &str) -> Result<Vec<PointEntry>, ScoringError> {
        let mut tx = self.store.begin().await?;
        require_event(tx.as_mut(), event_id).await?;
        tx.list_point_entries_for_event(event_id).await
    }

    pub async fn leaderboard(&self, event_id: &str) -> Result<Vec<TeamStanding>, ScoringError> {
        let mut tx = self.store.begin().await?;
        require_event(tx.as_mut(), event_id).await?;
        let teams = tx.list_teams(event_id).await?;
        let entries = tx.list_point_entries_for_event(event_id).await?;
        Ok(standings::leaderboard(&teams, &entries))
    }
}

fn require_match_category(game_type: &GameTypeModel) -> Result<PointCategory, ScoringError> {
    match_category(game_type.category).ok_or_else(|| {
        ScoringError::ShapeConflict(format!(
            "Game type {} is scored by high-score sessions, not matches",
            game_type.name
        ))
    })
}

fn validate_match_points(points: Option<&MatchPoints>) -> Result<(), ScoringError> {
    let Some(points) = points else {
        return Ok(());
    };
    let values = [Some(points.win), Some(points.loss), points.draw];
    if values.iter().flatten().any(|value| !value.is_finite()) {
        return Err(ScoringError::Validation(
            "Match point values must be finite".to_string(),
        ));
    }
    Ok(())
}

fn validate_award(points: f64, recipients: &[String]) -> Result<(), ScoringError> {
    if !points.is_finite() {
        return Err(ScoringError::Validation(
            "Award points must be finite".to_string(),
        ));
    }
    if recipients.is_empty() {
        return Err(ScoringError::Validation(
            "An award needs at least one recipient team".to_string(),
        ));
    }
    Ok(())
}

/// Checks each side against the game type's participant type and resolves
/// every member to a team of the event.
async fn resolve_sides(
    tx: &mut dyn ScoringTransaction,
    event_id: &str,
    game_type: &GameTypeModel,
    sides: &[MatchSide],
) -> Result<Vec<ResolvedSide>, ScoringError> {
    if sides.len() < 2 {
        return Err(ScoringError::ShapeConflict(
            "A match needs at least two sides".to_string(),
        ));
    }
    if sides.iter().any(|side| side.rank == 0) {
        return Err(ScoringError::Validation("Ranks start at 1".to_string()));
    }

    let known_teams = event_team_ids(tx, event_id).await?;
    let mut resolved = Vec::with_capacity(sides.len());

    for side in sides {
        let members = match game_type.participant_type {
            ParticipantType::Team => {
                let team_id = side.team_id.as_ref().ok_or_else(|| {
                    ScoringError::ShapeConflict(format!(
                        "{} is a team game; every side needs a team",
                        game_type.name
                    ))
                })?;
                if !known_teams.contains(team_id) {
                    return Err(ScoringError::NotFound(format!(
                        "Team {} does not belong to event {}",
                        team_id, event_id
                    )));
                }

                if side.participants.is_empty() {
                    vec![ResolvedMember {
                        event_team_id: team_id.clone(),
                        participant: None,
                    }]
                } else {
                    let mut members = Vec::with_capacity(side.participants.len());
                    for participant in &side.participants {
                        let member_team =
                            resolve_participant_team(tx, event_id, &participant.participant)
                                .await?;
                        if &member_team != team_id {
                            return Err(ScoringError::ShapeConflict(format!(
                                "{} plays for team {}, not {}",
                                participant.display_name, member_team, team_id
                            )));
                        }
                        members.push(ResolvedMember {
                            event_team_id: team_id.clone(),
                            participant: Some(participant.clone()),
                        });
                    }
                    members
                }
            }
            ParticipantType::Individual => {
                if side.team_id.is_some() {
                    return Err(ScoringError::ShapeConflict(format!(
                        "{} only allows individual participants",
                        game_type.name
                    )));
                }
                if side.participants.is_empty() {
                    return Err(ScoringError::ShapeConflict(
                        "Every side needs at least one participant".to_string(),
                    ));
                }

                let mut members = Vec::with_capacity(side.participants.len());
                for participant in &side.participants {
                    let team_id =
                        resolve_participant_team(tx, event_id, &participant.participant).await?;
                    members.push(ResolvedMember {
                        event_team_id: team_id,
                        participant: Some(participant.clone()),
                    });
                }
                members
            }
        };

        resolved.push(ResolvedSide {
            rank: side.rank,
            members,
        });
    }

    Ok(resolved)
}

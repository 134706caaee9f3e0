use std::collections::HashSet;

use super::models::{EventModel, GameTypeModel, ParticipantId};
use crate::shared::ScoringError;
use crate::store::ScoringTransaction;

pub async fn require_event(
    tx: &mut dyn ScoringTransaction,
    event_id: &str,
) -> Result<EventModel, ScoringError> {
    tx.get_event(event_id)
        .await?
        .ok_or_else(|| ScoringError::not_found("Event", event_id))
}

/// Loads an event that is currently accepting scoring activity
pub async fn require_active_event(
    tx: &mut dyn ScoringTransaction,
    event_id: &str,
) -> Result<EventModel, ScoringError> {
    let event = require_event(tx, event_id).await?;
    if !event.is_active() {
        return Err(ScoringError::StateConflict(format!(
            "Event {} is {}, not ACTIVE",
            event.id, event.status
        )));
    }
    Ok(event)
}

/// Loads a game type, treating one from another event as missing
pub async fn require_game_type(
    tx: &mut dyn ScoringTransaction,
    event_id: &str,
    game_type_id: &str,
) -> Result<GameTypeModel, ScoringError> {
    match tx.get_game_type(game_type_id).await? {
        Some(game_type) if game_type.event_id == event_id => Ok(game_type),
        _ => Err(ScoringError::not_found("Game type", game_type_id)),
    }
}

/// The team a participant plays for in this event
pub async fn resolve_participant_team(
    tx: &mut dyn ScoringTransaction,
    event_id: &str,
    participant: &ParticipantId,
) -> Result<String, ScoringError> {
    tx.team_for_participant(event_id, participant)
        .await?
        .ok_or_else(|| {
            ScoringError::ShapeConflict(format!(
                "Participant {} is not on a team in event {}",
                participant.id(),
                event_id
            ))
        })
}

pub async fn event_team_ids(
    tx: &mut dyn ScoringTransaction,
    event_id: &str,
) -> Result<HashSet<String>, ScoringError> {
    Ok(tx
        .list_teams(event_id)
        .await?
        .into_iter()
        .map(|team| team.id)
        .collect())
}

/// Fails with `NotFound` for the first id that is not a team of the event
pub async fn require_event_teams(
    tx: &mut dyn ScoringTransaction,
    event_id: &str,
    team_ids: &[String],
) -> Result<(), ScoringError> {
    let known = event_team_ids(tx, event_id).await?;
    match team_ids.iter().find(|id| !known.contains(id.as_str())) {
        Some(missing) => Err(ScoringError::NotFound(format!(
            "Team {} does not belong to event {}",
            missing, event_id
        ))),
        None => Ok(()),
    }
}

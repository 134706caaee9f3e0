use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::models::{
    HighScoreEntry, HighScoreSession, NewSession, PlacedScore, ScoreOwner, ScoreSubmission,
    SessionStatus,
};
use super::placement::{best_team_placements, rank_scores};
use crate::competition::lookups::{
    require_active_event, require_event_teams, require_game_type, resolve_participant_team,
};
use crate::competition::{GameCategory, GameTypeModel, ParticipantType};
use crate::ledger::{
    entries_for_placements, operations, placement_point_map, validate_placement_config,
    PointEntry, SourceRef,
};
use crate::shared::ScoringError;
use crate::store::{ScoringStore, ScoringTransaction};

/// Drives high-score sessions through OPEN -> CLOSED -> OPEN and deletion
pub struct SessionService {
    store: Arc<dyn ScoringStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn ScoringStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, new_session), fields(event_id = %new_session.event_id))]
    pub async fn open_session(
        &self,
        new_session: NewSession,
    ) -> Result<HighScoreSession, ScoringError> {
        if let Some(config) = &new_session.placement_point_config {
            validate_placement_config(config)?;
        }

        let mut tx = self.store.begin().await?;
        let event = require_active_event(tx.as_mut(), &new_session.event_id).await?;
        let game_type =
            require_game_type(tx.as_mut(), &event.id, &new_session.event_game_type_id).await?;
        if game_type.category != GameCategory::HighScore {
            return Err(ScoringError::ShapeConflict(format!(
                "Game type {} is not a high-score game",
                game_type.name
            )));
        }

        let session = HighScoreSession {
            id: Uuid::new_v4().to_string(),
            event_id: event.id,
            event_game_type_id: game_type.id,
            name: new_session.name,
            status: SessionStatus::Open,
            placement_point_config: new_session.placement_point_config,
            opened_at: Utc::now(),
            closed_at: None,
        };
        tx.insert_session(&session).await?;
        tx.commit().await?;

        info!(session_id = %session.id, "High-score session opened");
        Ok(session)
    }

    #[instrument(skip(self, submission))]
    pub async fn submit_score(
        &self,
        session_id: &str,
        submission: ScoreSubmission,
    ) -> Result<HighScoreEntry, ScoringError> {
        if !submission.score.is_finite() {
            return Err(ScoringError::Validation(
                "Scores must be finite".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;
        tx.lock_source(&SourceRef::for_session(session_id)).await?;
        let session = require_session(tx.as_mut(), session_id).await?;
        if !session.is_open() {
            return Err(ScoringError::StateConflict(format!(
                "Session {} is closed to new scores",
                session.id
            )));
        }

        let game_type =
            require_game_type(tx.as_mut(), &session.event_id, &session.event_game_type_id).await?;
        let event_team_id =
            resolve_owner_team(tx.as_mut(), &session.event_id, &game_type, &submission.owner)
                .await?;

        let entry = HighScoreEntry {
            id: Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            score: submission.score,
            achieved_at: submission.achieved_at.unwrap_or_else(Utc::now),
            owner: submission.owner,
            event_team_id,
        };
        tx.insert_high_score_entry(&entry).await?;
        tx.commit().await?;

        debug!(entry_id = %entry.id, team_id = %entry.event_team_id, "Score submitted");
        Ok(entry)
    }

    #[instrument(skip(self))]
    pub async fn delete_score(&self, entry_id: &str) -> Result<(), ScoringError> {
        let mut tx = self.store.begin().await?;
        let entry = tx
            .get_high_score_entry(entry_id)
            .await?
            .ok_or_else(|| ScoringError::not_found("Score", entry_id))?;
        tx.lock_source(&SourceRef::for_session(&entry.session_id)).await?;
        let session = require_session(tx.as_mut(), &entry.session_id).await?;
        if !session.is_open() {
            return Err(ScoringError::StateConflict(format!(
                "Scores cannot be removed from closed session {}",
                session.id
            )));
        }

        tx.delete_high_score_entry(entry_id).await?;
        tx.commit().await?;

        debug!(entry_id, "Score deleted");
        Ok(())
    }

    /// Closes the session and, when a placement configuration exists, awards
    /// each team the points for its best placement.
    #[instrument(skip(self))]
    pub async fn close_session(
        &self,
        session_id: &str,
    ) -> Result<(HighScoreSession, Vec<PointEntry>), ScoringError> {
        let mut tx = self.store.begin().await?;
        tx.lock_source(&SourceRef::for_session(session_id)).await?;
        let mut session = require_session(tx.as_mut(), session_id).await?;
        if !session.is_open() {
            return Err(ScoringError::StateConflict(format!(
                "Session {} is already closed",
                session.id
            )));
        }

        let stored = match session.effective_placement_config() {
            Some(config) => {
                let game_type =
                    require_game_type(tx.as_mut(), &session.event_id, &session.event_game_type_id)
                        .await?;
                let scores = tx.list_high_score_entries(&session.id).await?;
                let placed = rank_scores(scores, game_type.score_order);
                let best = best_team_placements(&placed);

                let source = SourceRef::for_session(&session.id);
                let entries = entries_for_placements(
                    &source,
                    &session.event_id,
                    &best,
                    &placement_point_map(config),
                )?;
                operations::recreate_for_source(tx.as_mut(), &source, &entries).await?
            }
            None => Vec::new(),
        };

        session.status = SessionStatus::Closed;
        session.closed_at = Some(Utc::now());
        tx.update_session(&session).await?;
        tx.commit().await?;

        info!(session_id = %session.id, entries = stored.len(), "High-score session closed");
        Ok((session, stored))
    }

    /// Undoes a close: the session's entries are removed and it accepts
    /// scores again.
    #[instrument(skip(self))]
    pub async fn reopen_session(&self, session_id: &str) -> Result<HighScoreSession, ScoringError> {
        let mut tx = self.store.begin().await?;
        tx.lock_source(&SourceRef::for_session(session_id)).await?;
        let mut session = require_session(tx.as_mut(), session_id).await?;
        if session.status != SessionStatus::Closed {
            return Err(ScoringError::StateConflict(format!(
                "Session {} is not closed",
                session.id
            )));
        }

        operations::recreate_for_source(tx.as_mut(), &SourceRef::for_session(&session.id), &[])
            .await?;

        session.status = SessionStatus::Open;
        session.closed_at = None;
        tx.update_session(&session).await?;
        tx.commit().await?;

        info!(session_id = %session.id, "High-score session reopened");
        Ok(session)
    }

    #[instrument(skip(self))]
    pub async fn delete_session(&self, session_id: &str) -> Result<(), ScoringError> {
        let mut tx = self.store.begin().await?;
        tx.lock_source(&SourceRef::for_session(session_id)).await?;
        let session = require_session(tx.as_mut(), session_id).await?;

        operations::delete_for_source(tx.as_mut(), &SourceRef::for_session(&session.id)).await?;
        let scores = tx.delete_high_score_entries_for_session(&session.id).await?;
        tx.delete_session(&session.id).await?;
        tx.commit().await?;

        info!(session_id = %session.id, scores, "High-score session deleted");
        Ok(())
    }

    pub async fn get_session(&self, session_id: &str) -> Result<HighScoreSession, ScoringError> {
        let mut tx = self.store.begin().await?;
        require_session(tx.as_mut(), session_id).await
    }

    /// Current scores ranked the way closing the session would rank them
    pub async fn session_standings(
        &self,
        session_id: &str,
    ) -> Result<Vec<PlacedScore>, ScoringError> {
        let mut tx = self.store.begin().await?;
        let session = require_session(tx.as_mut(), session_id).await?;
        let game_type =
            require_game_type(tx.as_mut(), &session.event_id, &session.event_game_type_id).await?;
        let scores = tx.list_high_score_entries(&session.id).await?;
        Ok(rank_scores(scores, game_type.score_order))
    }
}

async fn require_session(
    tx: &mut dyn ScoringTransaction,
    session_id: &str,
) -> Result<HighScoreSession, ScoringError> {
    tx.get_session(session_id)
        .await?
        .ok_or_else(|| ScoringError::not_found("Session", session_id))
}

/// Matches the owner against the game's participant type and finds the
/// team the score counts for.
async fn resolve_owner_team(
    tx: &mut dyn ScoringTransaction,
    event_id: &str,
    game_type: &GameTypeModel,
    owner: &ScoreOwner,
) -> Result<String, ScoringError> {
    match (game_type.participant_type, owner) {
        (ParticipantType::Individual, ScoreOwner::Participant(attributed)) => {
            resolve_participant_team(tx, event_id, &attributed.participant).await
        }
        (ParticipantType::Team, ScoreOwner::Team { team_id }) => {
            require_event_teams(tx, event_id, std::slice::from_ref(team_id)).await?;
            Ok(team_id.clone())
        }
        (ParticipantType::Individual, ScoreOwner::Team { .. }) => {
            Err(ScoringError::ShapeConflict(format!(
                "{} only accepts scores from individual participants",
                game_type.name
            )))
        }
        (ParticipantType::Team, ScoreOwner::Participant(_)) => {
            Err(ScoringError::ShapeConflict(format!(
                "{} only accepts scores from teams",
                game_type.name
            )))
        }
    }
}

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};

use super::{ScoringStore, ScoringTransaction};
use crate::competition::{EventModel, EventTeam, GameTypeModel, ParticipantId};
use crate::ledger::{DiscretionaryAward, MatchRecord, NewPointEntry, PointEntry, SourceRef};
use crate::sessions::{HighScoreEntry, HighScoreSession};
use crate::shared::ScoringError;

#[derive(Debug, Clone, Default)]
struct StoreState {
    events: HashMap<String, EventModel>,
    teams: Vec<EventTeam>,
    memberships: HashMap<(String, ParticipantId), String>,
    game_types: HashMap<String, GameTypeModel>,
    point_entries: Vec<PointEntry>,
    matches: HashMap<String, MatchRecord>,
    awards: HashMap<String, DiscretionaryAward>,
    sessions: HashMap<String, HighScoreSession>,
    high_score_entries: Vec<HighScoreEntry>,
}

/// In-memory implementation of ScoringStore for development and testing
///
/// A transaction works on a private copy of the data and holds the store
/// lock until it is committed or dropped, so writers are serialized and a
/// dropped transaction leaves nothing behind.
#[derive(Clone)]
pub struct InMemoryScoringStore {
    state: Arc<Mutex<StoreState>>,
}

impl Default for InMemoryScoringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryScoringStore {
    /// Creates a new empty in-memory store
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
        }
    }

    pub async fn add_event(&self, event: EventModel) {
        let mut state = self.state.lock().await;
        state.events.insert(event.id.clone(), event);
    }

    pub async fn add_team(&self, team: EventTeam) {
        let mut state = self.state.lock().await;
        state.teams.retain(|t| t.id != team.id);
        state.teams.push(team);
    }

    /// Assigns a participant to a team for one event
    pub async fn add_team_member(&self, event_id: &str, participant: ParticipantId, team_id: &str) {
        let mut state = self.state.lock().await;
        state
            .memberships
            .insert((event_id.to_string(), participant), team_id.to_string());
    }

    pub async fn add_game_type(&self, game_type: GameTypeModel) {
        let mut state = self.state.lock().await;
        state.game_types.insert(game_type.id.clone(), game_type);
    }

    /// Returns the number of committed point entries across all events
    pub async fn point_entry_count(&self) -> usize {
        self.state.lock().await.point_entries.len()
    }
}

#[async_trait]
impl ScoringStore for InMemoryScoringStore {
    async fn begin(&self) -> Result<Box<dyn ScoringTransaction>, ScoringError> {
        let committed = self.state.clone().lock_owned().await;
        let working = committed.clone();
        Ok(Box::new(InMemoryTransaction { committed, working }))
    }
}

struct InMemoryTransaction {
    committed: OwnedMutexGuard<StoreState>,
    working: StoreState,
}

#[async_trait]
impl ScoringTransaction for InMemoryTransaction {
    async fn get_event(&mut self, event_id: &str) -> Result<Option<EventModel>, ScoringError> {
        Ok(self.working.events.get(event_id).cloned())
    }

    async fn get_game_type(
        &mut self,
        game_type_id: &str,
    ) -> Result<Option<GameTypeModel>, ScoringError> {
        Ok(self.working.game_types.get(game_type_id).cloned())
    }

    async fn list_teams(&mut self, event_id: &str) -> Result<Vec<EventTeam>, ScoringError> {
        Ok(self
            .working
            .teams
            .iter()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn team_for_participant(
        &mut self,
        event_id: &str,
        participant: &ParticipantId,
    ) -> Result<Option<String>, ScoringError> {
        Ok(self
            .working
            .memberships
            .get(&(event_id.to_string(), participant.clone()))
            .cloned())
    }

    async fn lock_source(&mut self, _source: &SourceRef) -> Result<(), ScoringError> {
        // The whole store is already held by this transaction
        Ok(())
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn insert_point_entries(
        &mut self,
        entries: &[NewPointEntry],
    ) -> Result<Vec<PointEntry>, ScoringError> {
        let now = Utc::now();
        let stored: Vec<PointEntry> = entries
            .iter()
            .cloned()
            .map(|entry| PointEntry::from_new(entry, now))
            .collect();

        self.working.point_entries.extend(stored.iter().cloned());
        debug!("Point entries inserted in memory");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn delete_point_entries_for_source(
        &mut self,
        source: &SourceRef,
    ) -> Result<u64, ScoringError> {
        let before = self.working.point_entries.len();
        self.working.point_entries.retain(|e| &e.source != source);
        let removed = (before - self.working.point_entries.len()) as u64;

        debug!(removed, "Point entries deleted from memory");
        Ok(removed)
    }

    async fn list_point_entries_for_source(
        &mut self,
        source: &SourceRef,
    ) -> Result<Vec<PointEntry>, ScoringError> {
        Ok(self
            .working
            .point_entries
            .iter()
            .filter(|e| &e.source == source)
            .cloned()
            .collect())
    }

    async fn list_point_entries_for_event(
        &mut self,
        event_id: &str,
    ) -> Result<Vec<PointEntry>, ScoringError> {
        Ok(self
            .working
            .point_entries
            .iter()
            .filter(|e| e.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn insert_match(&mut self, record: &MatchRecord) -> Result<(), ScoringError> {
        if self.working.matches.contains_key(&record.id) {
            warn!(match_id = %record.id, "Match already exists in memory");
            return Err(ScoringError::Storage("Match already exists".to_string()));
        }
        self.working.matches.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get_match(&mut self, match_id: &str) -> Result<Option<MatchRecord>, ScoringError> {
        Ok(self.working.matches.get(match_id).cloned())
    }

    async fn update_match(&mut self, record: &MatchRecord) -> Result<(), ScoringError> {
        match self.working.matches.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(ScoringError::not_found("Match", &record.id)),
        }
    }

    async fn delete_match(&mut self, match_id: &str) -> Result<bool, ScoringError> {
        Ok(self.working.matches.remove(match_id).is_some())
    }

    async fn insert_award(&mut self, award: &DiscretionaryAward) -> Result<(), ScoringError> {
        if self.working.awards.contains_key(&award.id) {
            warn!(award_id = %award.id, "Award already exists in memory");
            return Err(ScoringError::Storage("Award already exists".to_string()));
        }
        self.working.awards.insert(award.id.clone(), award.clone());
        Ok(())
    }

    async fn get_award(
        &mut self,
        award_id: &str,
    ) -> Result<Option<DiscretionaryAward>, ScoringError> {
        Ok(self.working.awards.get(award_id).cloned())
    }

    async fn update_award(&mut self, award: &DiscretionaryAward) -> Result<(), ScoringError> {
        match self.working.awards.get_mut(&award.id) {
            Some(existing) => {
                *existing = award.clone();
                Ok(())
            }
            None => Err(ScoringError::not_found("Award", &award.id)),
        }
    }

    async fn delete_award(&mut self, award_id: &str) -> Result<bool, ScoringError> {
        Ok(self.working.awards.remove(award_id).is_some())
    }

    async fn insert_session(&mut self, session: &HighScoreSession) -> Result<(), ScoringError> {
        if self.working.sessions.contains_key(&session.id) {
            warn!(session_id = %session.id, "Session already exists in memory");
            return Err(ScoringError::Storage("Session already exists".to_string()));
        }
        self.working
            .sessions
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get_session(
        &mut self,
        session_id: &str,
    ) -> Result<Option<HighScoreSession>, ScoringError> {
        Ok(self.working.sessions.get(session_id).cloned())
    }

    async fn update_session(&mut self, session: &HighScoreSession) -> Result<(), ScoringError> {
        match self.working.sessions.get_mut(&session.id) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(ScoringError::not_found("Session", &session.id)),
        }
    }

    async fn delete_session(&mut self, session_id: &str) -> Result<bool, ScoringError> {
        Ok(self.working.sessions.remove(session_id).is_some())
    }

    async fn insert_high_score_entry(
        &mut self,
        entry: &HighScoreEntry,
    ) -> Result<(), ScoringError> {
        self.working.high_score_entries.push(entry.clone());
        Ok(())
    }

    async fn get_high_score_entry(
        &mut self,
        entry_id: &str,
    ) -> Result<Option<HighScoreEntry>, ScoringError> {
        Ok(self
            .working
            .high_score_entries
            .iter()
            .find(|e| e.id == entry_id)
            .cloned())
    }

    async fn list_high_score_entries(
        &mut self,
        session_id: &str,
    ) -> Result<Vec<HighScoreEntry>, ScoringError> {
        Ok(self
            .working
            .high_score_entries
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn delete_high_score_entry(&mut self, entry_id: &str) -> Result<bool, ScoringError> {
        let before = self.working.high_score_entries.len();
        self.working.high_score_entries.retain(|e| e.id != entry_id);
        Ok(self.working.high_score_entries.len() < before)
    }

    async fn delete_high_score_entries_for_session(
        &mut self,
        session_id: &str,
    ) -> Result<u64, ScoringError> {
        let before = self.working.high_score_entries.len();
        self.working
            .high_score_entries
            .retain(|e| e.session_id != session_id);
        Ok((before - self.working.high_score_entries.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), ScoringError> {
        let InMemoryTransaction {
            mut committed,
            working,
        } = *self;
        *committed = working;
        debug!("In-memory transaction committed");
        Ok(())
    }
}

// Persistence collaborator for the scoring subsystem.
//
// Every ledger-mutating operation runs inside one `ScoringTransaction`.
// Dropping a transaction without calling `commit` rolls it back.

mod memory;
mod postgres;

pub use memory::InMemoryScoringStore;
pub use postgres::PostgresScoringStore;

use async_trait::async_trait;

use crate::competition::{EventModel, EventTeam, GameTypeModel, ParticipantId};
use crate::ledger::{DiscretionaryAward, MatchRecord, NewPointEntry, PointEntry, SourceRef};
use crate::sessions::{HighScoreEntry, HighScoreSession};
use crate::shared::ScoringError;

#[async_trait]
pub trait ScoringStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn ScoringTransaction>, ScoringError>;
}

/// Typed operations available inside a transaction
#[async_trait]
pub trait ScoringTransaction: Send {
    async fn get_event(&mut self, event_id: &str) -> Result<Option<EventModel>, ScoringError>;
    async fn get_game_type(
        &mut self,
        game_type_id: &str,
    ) -> Result<Option<GameTypeModel>, ScoringError>;
    async fn list_teams(&mut self, event_id: &str) -> Result<Vec<EventTeam>, ScoringError>;
    async fn team_for_participant(
        &mut self,
        event_id: &str,
        participant: &ParticipantId,
    ) -> Result<Option<String>, ScoringError>;

    /// Serializes writers of one source until this transaction ends. Call it
    /// before reading the state a mutation depends on.
    async fn lock_source(&mut self, source: &SourceRef) -> Result<(), ScoringError>;
    async fn insert_point_entries(
        &mut self,
        entries: &[NewPointEntry],
    ) -> Result<Vec<PointEntry>, ScoringError>;
    async fn delete_point_entries_for_source(
        &mut self,
        source: &SourceRef,
    ) -> Result<u64, ScoringError>;
    async fn list_point_entries_for_source(
        &mut self,
        source: &SourceRef,
    ) -> Result<Vec<PointEntry>, ScoringError>;
    /// Entries in creation order
    async fn list_point_entries_for_event(
        &mut self,
        event_id: &str,
    ) -> Result<Vec<PointEntry>, ScoringError>;

    async fn insert_match(&mut self, record: &MatchRecord) -> Result<(), ScoringError>;
    async fn get_match(&mut self, match_id: &str) -> Result<Option<MatchRecord>, ScoringError>;
    async fn update_match(&mut self, record: &MatchRecord) -> Result<(), ScoringError>;
    async fn delete_match(&mut self, match_id: &str) -> Result<bool, ScoringError>;

    async fn insert_award(&mut self, award: &DiscretionaryAward) -> Result<(), ScoringError>;
    async fn get_award(
        &mut self,
        award_id: &str,
    ) -> Result<Option<DiscretionaryAward>, ScoringError>;
    async fn update_award(&mut self, award: &DiscretionaryAward) -> Result<(), ScoringError>;
    async fn delete_award(&mut self, award_id: &str) -> Result<bool, ScoringError>;

    async fn insert_session(&mut self, session: &HighScoreSession) -> Result<(), ScoringError>;
    async fn get_session(
        &mut self,
        session_id: &str,
    ) -> Result<Option<HighScoreSession>, ScoringError>;
    async fn update_session(&mut self, session: &HighScoreSession) -> Result<(), ScoringError>;
    async fn delete_session(&mut self, session_id: &str) -> Result<bool, ScoringError>;

    async fn insert_high_score_entry(&mut self, entry: &HighScoreEntry)
        -> Result<(), ScoringError>;
    async fn get_high_score_entry(
        &mut self,
        entry_id: &str,
    ) -> Result<Option<HighScoreEntry>, ScoringError>;
    /// Scores in submission order
    async fn list_high_score_entries(
        &mut self,
        session_id: &str,
    ) -> Result<Vec<HighScoreEntry>, ScoringError>;
    async fn delete_high_score_entry(&mut self, entry_id: &str) -> Result<bool, ScoringError>;
    async fn delete_high_score_entries_for_session(
        &mut self,
        session_id: &str,
    ) -> Result<u64, ScoringError>;

    async fn commit(self: Box<Self>) -> Result<(), ScoringError>;
}

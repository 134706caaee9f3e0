use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

use super::{ScoringStore, ScoringTransaction};
use crate::competition::{EventModel, EventTeam, GameTypeModel, ParticipantId};
use crate::config::ScoringConfig;
use crate::ledger::{DiscretionaryAward, MatchRecord, NewPointEntry, PointEntry, SourceRef};
use crate::sessions::{HighScoreEntry, HighScoreSession};
use crate::shared::ScoringError;

/// PostgreSQL implementation of the scoring store
#[derive(Clone)]
pub struct PostgresScoringStore {
    pool: PgPool,
}

impl PostgresScoringStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using `DATABASE_URL` from the configuration
    #[instrument(skip(config))]
    pub async fn connect(config: &ScoringConfig) -> Result<Self, ScoringError> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| ScoringError::Storage("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to connect to database");
                ScoringError::from(e)
            })?;

        info!(
            max_connections = config.max_connections,
            "Connected to scoring database"
        );
        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> Result<(), ScoringError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ScoringError::Storage(format!("Migration failed: {}", e)))
    }
}

#[async_trait]
impl ScoringStore for PostgresScoringStore {
    async fn begin(&self) -> Result<Box<dyn ScoringTransaction>, ScoringError> {
        let tx = self.pool.begin().await.map_err(|e| {
            warn!(error = %e, "Failed to begin transaction");
            ScoringError::from(e)
        })?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

fn db_error(operation: &'static str) -> impl Fn(sqlx::Error) -> ScoringError {
    move |e| {
        warn!(error = %e, operation, "Database operation failed");
        ScoringError::from(e)
    }
}

fn parse_column<T: FromStr>(value: &str, column: &str) -> Result<T, ScoringError> {
    value.parse().map_err(|_| {
        ScoringError::Storage(format!("Unexpected value {:?} in column {}", value, column))
    })
}

fn participant_key(participant: &ParticipantId) -> (&'static str, &str) {
    match participant {
        ParticipantId::User(id) => ("USER", id),
        ParticipantId::Placeholder(id) => ("PLACEHOLDER", id),
    }
}

/// Advisory lock key for a source, shared by every writer of that source
fn source_lock_key(source: &SourceRef) -> String {
    format!("{}:{}", source.kind, source.id)
}

fn point_entry_from_row(row: &PgRow) -> Result<PointEntry, ScoringError> {
    let category: String = row.try_get("category")?;
    let outcome: String = row.try_get("outcome")?;
    let source_kind: String = row.try_get("source_kind")?;
    let participants: String = row.try_get("participants")?;

    Ok(PointEntry {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        category: parse_column(&category, "category")?,
        outcome: parse_column(&outcome, "outcome")?,
        points: row.try_get("points")?,
        event_team_id: row.try_get("event_team_id")?,
        source: SourceRef {
            kind: parse_column(&source_kind, "source_kind")?,
            id: row.try_get("source_id")?,
        },
        participants: serde_json::from_str(&participants)?,
        created_at: row.try_get("created_at")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<MatchRecord, ScoringError> {
    let sides: String = row.try_get("sides")?;
    let points: Option<String> = row.try_get("points")?;

    Ok(MatchRecord {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        game_type_id: row.try_get("game_type_id")?,
        sides: serde_json::from_str(&sides)?,
        points: points.map(|p| serde_json::from_str(&p)).transpose()?,
        recorded_at: row.try_get("recorded_at")?,
    })
}

fn award_from_row(row: &PgRow) -> Result<DiscretionaryAward, ScoringError> {
    let recipients: String = row.try_get("recipients")?;

    Ok(DiscretionaryAward {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        name: row.try_get("name")?,
        points: row.try_get("points")?,
        recipients: serde_json::from_str(&recipients)?,
        awarded_at: row.try_get("awarded_at")?,
    })
}

fn session_from_row(row: &PgRow) -> Result<HighScoreSession, ScoringError> {
    let status: String = row.try_get("status")?;
    let config: Option<String> = row.try_get("placement_point_config")?;

    Ok(HighScoreSession {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        event_game_type_id: row.try_get("event_game_type_id")?,
        name: row.try_get("name")?,
        status: parse_column(&status, "status")?,
        placement_point_config: config.map(|c| serde_json::from_str(&c)).transpose()?,
        opened_at: row.try_get("opened_at")?,
        closed_at: row.try_get("closed_at")?,
    })
}

fn high_score_entry_from_row(row: &PgRow) -> Result<HighScoreEntry, ScoringError> {
    let owner: String = row.try_get("owner")?;

    Ok(HighScoreEntry {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        score: row.try_get("score")?,
        achieved_at: row.try_get("achieved_at")?,
        owner: serde_json::from_str(&owner)?,
        event_team_id: row.try_get("event_team_id")?,
    })
}

const POINT_ENTRY_COLUMNS: &str = "id, event_id, category, outcome, points, event_team_id, \
     source_kind, source_id, participants, created_at";

#[async_trait]
impl ScoringTransaction for PostgresTransaction {
    async fn get_event(&mut self, event_id: &str) -> Result<Option<EventModel>, ScoringError> {
        let row = sqlx::query("SELECT id, name, status FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error("get_event"))?;

        row.map(|row| -> Result<EventModel, ScoringError> {
            let status: String = row.try_get("status")?;
            Ok(EventModel {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                status: parse_column(&status, "status")?,
            })
        })
        .transpose()
    }

    async fn get_game_type(
        &mut self,
        game_type_id: &str,
    ) -> Result<Option<GameTypeModel>, ScoringError> {
        let row = sqlx::query(
            "SELECT id, event_id, name, category, participant_type, score_order \
             FROM event_game_types WHERE id = $1",
        )
        .bind(game_type_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("get_game_type"))?;

        row.map(|row| -> Result<GameTypeModel, ScoringError> {
            let category: String = row.try_get("category")?;
            let participant_type: String = row.try_get("participant_type")?;
            let score_order: String = row.try_get("score_order")?;
            Ok(GameTypeModel {
                id: row.try_get("id")?,
                event_id: row.try_get("event_id")?,
                name: row.try_get("name")?,
                category: parse_column(&category, "category")?,
                participant_type: parse_column(&participant_type, "participant_type")?,
                score_order: parse_column(&score_order, "score_order")?,
            })
        })
        .transpose()
    }

    async fn list_teams(&mut self, event_id: &str) -> Result<Vec<EventTeam>, ScoringError> {
        let rows = sqlx::query(
            "SELECT id, event_id, name, color FROM event_teams \
             WHERE event_id = $1 ORDER BY created_at, id",
        )
        .bind(event_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("list_teams"))?;

        rows.iter()
            .map(|row| -> Result<EventTeam, ScoringError> {
                Ok(EventTeam {
                    id: row.try_get("id")?,
                    event_id: row.try_get("event_id")?,
                    name: row.try_get("name")?,
                    color: row.try_get("color")?,
                })
            })
            .collect()
    }

    async fn team_for_participant(
        &mut self,
        event_id: &str,
        participant: &ParticipantId,
    ) -> Result<Option<String>, ScoringError> {
        let (kind, id) = participant_key(participant);
        let row = sqlx::query(
            "SELECT event_team_id FROM event_team_members \
             WHERE event_id = $1 AND participant_kind = $2 AND participant_id = $3",
        )
        .bind(event_id)
        .bind(kind)
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("team_for_participant"))?;

        row.map(|row| row.try_get("event_team_id").map_err(ScoringError::from))
            .transpose()
    }

    #[instrument(skip(self))]
    async fn lock_source(&mut self, source: &SourceRef) -> Result<(), ScoringError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(source_lock_key(source))
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("lock_source"))?;
        Ok(())
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn insert_point_entries(
        &mut self,
        entries: &[NewPointEntry],
    ) -> Result<Vec<PointEntry>, ScoringError> {
        let now = Utc::now();
        let mut stored = Vec::with_capacity(entries.len());

        for entry in entries {
            let entry = PointEntry::from_new(entry.clone(), now);
            sqlx::query(&format!(
                "INSERT INTO point_entries ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                POINT_ENTRY_COLUMNS
            ))
            .bind(&entry.id)
            .bind(&entry.event_id)
            .bind(entry.category.as_ref())
            .bind(entry.outcome.as_ref())
            .bind(entry.points)
            .bind(&entry.event_team_id)
            .bind(entry.source.kind.as_ref())
            .bind(&entry.source.id)
            .bind(serde_json::to_string(&entry.participants)?)
            .bind(entry.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("insert_point_entries"))?;
            stored.push(entry);
        }

        debug!("Point entries inserted in database");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn delete_point_entries_for_source(
        &mut self,
        source: &SourceRef,
    ) -> Result<u64, ScoringError> {
        let result =
            sqlx::query("DELETE FROM point_entries WHERE source_kind = $1 AND source_id = $2")
                .bind(source.kind.as_ref())
                .bind(&source.id)
                .execute(&mut *self.tx)
                .await
                .map_err(db_error("delete_point_entries_for_source"))?;

        debug!(removed = result.rows_affected(), "Point entries deleted");
        Ok(result.rows_affected())
    }

    async fn list_point_entries_for_source(
        &mut self,
        source: &SourceRef,
    ) -> Result<Vec<PointEntry>, ScoringError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM point_entries WHERE source_kind = $1 AND source_id = $2 \
             ORDER BY created_at, seq",
            POINT_ENTRY_COLUMNS
        ))
        .bind(source.kind.as_ref())
        .bind(&source.id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("list_point_entries_for_source"))?;

        rows.iter().map(point_entry_from_row).collect()
    }

    async fn list_point_entries_for_event(
        &mut self,
        event_id: &str,
    ) -> Result<Vec<PointEntry>, ScoringError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM point_entries WHERE event_id = $1 ORDER BY created_at, seq",
            POINT_ENTRY_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("list_point_entries_for_event"))?;

        rows.iter().map(point_entry_from_row).collect()
    }

    async fn insert_match(&mut self, record: &MatchRecord) -> Result<(), ScoringError> {
        let points = record.points.map(|p| serde_json::to_string(&p)).transpose()?;
        sqlx::query(
            "INSERT INTO matches (id, event_id, game_type_id, sides, points, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&record.id)
        .bind(&record.event_id)
        .bind(&record.game_type_id)
        .bind(serde_json::to_string(&record.sides)?)
        .bind(points)
        .bind(record.recorded_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("insert_match"))?;
        Ok(())
    }

    async fn get_match(&mut self, match_id: &str) -> Result<Option<MatchRecord>, ScoringError> {
        let row = sqlx::query(
            "SELECT id, event_id, game_type_id, sides, points, recorded_at \
             FROM matches WHERE id = $1",
        )
        .bind(match_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("get_match"))?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn update_match(&mut self, record: &MatchRecord) -> Result<(), ScoringError> {
        let points = record.points.map(|p| serde_json::to_string(&p)).transpose()?;
        let result = sqlx::query("UPDATE matches SET sides = $2, points = $3 WHERE id = $1")
            .bind(&record.id)
            .bind(serde_json::to_string(&record.sides)?)
            .bind(points)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("update_match"))?;

        if result.rows_affected() == 0 {
            return Err(ScoringError::not_found("Match", &record.id));
        }
        Ok(())
    }

    async fn delete_match(&mut self, match_id: &str) -> Result<bool, ScoringError> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(match_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("delete_match"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_award(&mut self, award: &DiscretionaryAward) -> Result<(), ScoringError> {
        sqlx::query(
            "INSERT INTO discretionary_awards (id, event_id, name, points, recipients, awarded_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&award.id)
        .bind(&award.event_id)
        .bind(&award.name)
        .bind(award.points)
        .bind(serde_json::to_string(&award.recipients)?)
        .bind(award.awarded_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("insert_award"))?;
        Ok(())
    }

    async fn get_award(
        &mut self,
        award_id: &str,
    ) -> Result<Option<DiscretionaryAward>, ScoringError> {
        let row = sqlx::query(
            "SELECT id, event_id, name, points, recipients, awarded_at \
             FROM discretionary_awards WHERE id = $1",
        )
        .bind(award_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("get_award"))?;

        row.as_ref().map(award_from_row).transpose()
    }

    async fn update_award(&mut self, award: &DiscretionaryAward) -> Result<(), ScoringError> {
        let result = sqlx::query(
            "UPDATE discretionary_awards SET name = $2, points = $3, recipients = $4 WHERE id = $1",
        )
        .bind(&award.id)
        .bind(&award.name)
        .bind(award.points)
        .bind(serde_json::to_string(&award.recipients)?)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("update_award"))?;

        if result.rows_affected() == 0 {
            return Err(ScoringError::not_found("Award", &award.id));
        }
        Ok(())
    }

    async fn delete_award(&mut self, award_id: &str) -> Result<bool, ScoringError> {
        let result = sqlx::query("DELETE FROM discretionary_awards WHERE id = $1")
            .bind(award_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("delete_award"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_session(&mut self, session: &HighScoreSession) -> Result<(), ScoringError> {
        let config = session
            .placement_point_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        sqlx::query(
            "INSERT INTO high_score_sessions \
             (id, event_id, event_game_type_id, name, status, placement_point_config, \
             opened_at, closed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&session.id)
        .bind(&session.event_id)
        .bind(&session.event_game_type_id)
        .bind(&session.name)
        .bind(session.status.as_ref())
        .bind(config)
        .bind(session.opened_at)
        .bind(session.closed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("insert_session"))?;
        Ok(())
    }

    async fn get_session(
        &mut self,
        session_id: &str,
    ) -> Result<Option<HighScoreSession>, ScoringError> {
        let row = sqlx::query(
            "SELECT id, event_id, event_game_type_id, name, status, placement_point_config, \
             opened_at, closed_at FROM high_score_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("get_session"))?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn update_session(&mut self, session: &HighScoreSession) -> Result<(), ScoringError> {
        let config = session
            .placement_point_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let result = sqlx::query(
            "UPDATE high_score_sessions SET name = $2, status = $3, placement_point_config = $4, \
             closed_at = $5 WHERE id = $1",
        )
        .bind(&session.id)
        .bind(&session.name)
        .bind(session.status.as_ref())
        .bind(config)
        .bind(session.closed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("update_session"))?;

        if result.rows_affected() == 0 {
            return Err(ScoringError::not_found("Session", &session.id));
        }
        Ok(())
    }

    async fn delete_session(&mut self, session_id: &str) -> Result<bool, ScoringError> {
        let result = sqlx::query("DELETE FROM high_score_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("delete_session"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_high_score_entry(
        &mut self,
        entry: &HighScoreEntry,
    ) -> Result<(), ScoringError> {
        sqlx::query(
            "INSERT INTO high_score_entries \
             (id, session_id, score, achieved_at, owner, event_team_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&entry.id)
        .bind(&entry.session_id)
        .bind(entry.score)
        .bind(entry.achieved_at)
        .bind(serde_json::to_string(&entry.owner)?)
        .bind(&entry.event_team_id)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("insert_high_score_entry"))?;
        Ok(())
    }

    async fn get_high_score_entry(
        &mut self,
        entry_id: &str,
    ) -> Result<Option<HighScoreEntry>, ScoringError> {
        let row = sqlx::query(
            "SELECT id, session_id, score, achieved_at, owner, event_team_id \
             FROM high_score_entries WHERE id = $1",
        )
        .bind(entry_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("get_high_score_entry"))?;

        row.as_ref().map(high_score_entry_from_row).transpose()
    }

    async fn list_high_score_entries(
        &mut self,
        session_id: &str,
    ) -> Result<Vec<HighScoreEntry>, ScoringError> {
        let rows = sqlx::query(
            "SELECT id, session_id, score, achieved_at, owner, event_team_id \
             FROM high_score_entries WHERE session_id = $1 ORDER BY seq",
        )
        .bind(session_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("list_high_score_entries"))?;

        rows.iter().map(high_score_entry_from_row).collect()
    }

    async fn delete_high_score_entry(&mut self, entry_id: &str) -> Result<bool, ScoringError> {
        let result = sqlx::query("DELETE FROM high_score_entries WHERE id = $1")
            .bind(entry_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("delete_high_score_entry"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_high_score_entries_for_session(
        &mut self,
        session_id: &str,
    ) -> Result<u64, ScoringError> {
        let result = sqlx::query("DELETE FROM high_score_entries WHERE session_id = $1")
            .bind(session_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("delete_high_score_entries_for_session"))?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), ScoringError> {
        let PostgresTransaction { tx } = *self;
        tx.commit().await.map_err(db_error("commit"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{PointCategory, SourceKind};

    #[test]
    fn participant_keys_distinguish_users_from_placeholders() {
        let user = ParticipantId::User("42".into());
        let placeholder = ParticipantId::Placeholder("42".into());

        assert_eq!(participant_key(&user), ("USER", "42"));
        assert_eq!(participant_key(&placeholder), ("PLACEHOLDER", "42"));
    }

    #[test]
    fn lock_keys_differ_per_source_kind() {
        let session = source_lock_key(&SourceRef::for_session("7"));
        let award = source_lock_key(&SourceRef::for_award("7"));

        assert_eq!(session, "HIGH_SCORE_SESSION:7");
        assert_eq!(award, "DISCRETIONARY_AWARD:7");
        assert_eq!(session, source_lock_key(&SourceRef::for_session("7")));
    }

    #[test]
    fn parses_enum_columns() {
        let kind: SourceKind = parse_column("HIGH_SCORE_SESSION", "source_kind").unwrap();
        assert_eq!(kind, SourceKind::HighScoreSession);

        let bad: Result<PointCategory, _> = parse_column("BOGUS", "category");
        assert!(matches!(bad, Err(ScoringError::Storage(_))));
    }
}

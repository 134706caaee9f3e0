use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::competition::AttributedParticipant;
use crate::ledger::PlacementPoints;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// A window during which high scores for one game type are collected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreSession {
    pub id: String,
    pub event_id: String,
    pub event_game_type_id: String,
    pub name: String,
    pub status: SessionStatus,
    pub placement_point_config: Option<Vec<PlacementPoints>>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl HighScoreSession {
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Config that will actually produce entries on close
    pub fn effective_placement_config(&self) -> Option<&[PlacementPoints]> {
        self.placement_point_config
            .as_deref()
            .filter(|config| !config.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub event_id: String,
    pub event_game_type_id: String,
    pub name: String,
    pub placement_point_config: Option<Vec<PlacementPoints>>,
}

/// Who a submitted score belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreOwner {
    Participant(AttributedParticipant),
    Team { team_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub id: String,
    pub session_id: String,
    pub score: f64,
    pub achieved_at: DateTime<Utc>,
    pub owner: ScoreOwner,
    /// Resolved when the score is submitted
    pub event_team_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub owner: ScoreOwner,
    pub score: f64,
    pub achieved_at: Option<DateTime<Utc>>,
}

/// A score with its 1-based placement inside a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedScore {
    pub placement: u32,
    pub entry: HighScoreEntry,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::competition::AttributedParticipant;
use crate::shared::ScoringError;

/// What kind of record caused a point entry to exist
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    Match,
    HighScoreSession,
    Tournament,
    DiscretionaryAward,
}

/// The single source record a point entry belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceRef {
    pub kind: SourceKind,
    pub id: String,
}

impl SourceRef {
    pub fn new(kind: SourceKind, id: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
        }
    }

    pub fn for_match(id: &str) -> Self {
        Self::new(SourceKind::Match, id)
    }

    pub fn for_session(id: &str) -> Self {
        Self::new(SourceKind::HighScoreSession, id)
    }

    pub fn for_tournament(id: &str) -> Self {
        Self::new(SourceKind::Tournament, id)
    }

    pub fn for_award(id: &str) -> Self {
        Self::new(SourceKind::DiscretionaryAward, id)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PointCategory {
    H2hMatch,
    FfaMatch,
    HighScore,
    Tournament,
    Discretionary,
}

impl PointCategory {
    pub fn label(self) -> &'static str {
        match self {
            PointCategory::H2hMatch => "Head-to-Head Match",
            PointCategory::FfaMatch => "Free-for-All Match",
            PointCategory::HighScore => "High Score",
            PointCategory::Tournament => "Tournament",
            PointCategory::Discretionary => "Bonus Points",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PointOutcome {
    Win,
    Loss,
    Draw,
    Placement,
    Award,
}

impl PointOutcome {
    pub fn label(self) -> &'static str {
        match self {
            PointOutcome::Win => "Win",
            PointOutcome::Loss => "Loss",
            PointOutcome::Draw => "Draw",
            PointOutcome::Placement => "Placement",
            PointOutcome::Award => "Award",
        }
    }
}

/// A point entry that has not been stored yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPointEntry {
    pub event_id: String,
    pub category: PointCategory,
    pub outcome: PointOutcome,
    pub points: f64,
    pub event_team_id: String,
    pub source: SourceRef,
    pub participants: Vec<AttributedParticipant>,
}

impl NewPointEntry {
    /// Builds an entry, rejecting category/outcome pairs that cannot come from
    /// the given source kind.
    pub fn new(
        event_id: &str,
        event_team_id: &str,
        source: SourceRef,
        category: PointCategory,
        outcome: PointOutcome,
        points: f64,
    ) -> Result<Self, ScoringError> {
        if !is_valid_combination(source.kind, category, outcome) {
            return Err(ScoringError::Validation(format!(
                "{} entries cannot use category {} with outcome {}",
                source.kind, category, outcome
            )));
        }

        if !points.is_finite() {
            return Err(ScoringError::Validation(
                "Point values must be finite".to_string(),
            ));
        }

        Ok(Self {
            event_id: event_id.to_string(),
            category,
            outcome,
            points,
            event_team_id: event_team_id.to_string(),
            source,
            participants: Vec::new(),
        })
    }

    pub fn with_participants(mut self, participants: Vec<AttributedParticipant>) -> Self {
        self.participants = participants;
        self
    }
}

fn is_valid_combination(kind: SourceKind, category: PointCategory, outcome: PointOutcome) -> bool {
    match kind {
        SourceKind::Match => {
            matches!(category, PointCategory::H2hMatch | PointCategory::FfaMatch)
                && matches!(
                    outcome,
                    PointOutcome::Win | PointOutcome::Loss | PointOutcome::Draw
                )
        }
        SourceKind::HighScoreSession => {
            category == PointCategory::HighScore && outcome == PointOutcome::Placement
        }
        SourceKind::Tournament => {
            category == PointCategory::Tournament && outcome == PointOutcome::Placement
        }
        SourceKind::DiscretionaryAward => {
            category == PointCategory::Discretionary && outcome == PointOutcome::Award
        }
    }
}

/// Immutable ledger row attributing signed points to one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointEntry {
    pub id: String,
    pub event_id: String,
    pub category: PointCategory,
    pub outcome: PointOutcome,
    pub points: f64,
    pub event_team_id: String,
    pub source: SourceRef,
    pub participants: Vec<AttributedParticipant>,
    pub created_at: DateTime<Utc>,
}

impl PointEntry {
    pub fn from_new(entry: NewPointEntry, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id: entry.event_id,
            category: entry.category,
            outcome: entry.outcome,
            points: entry.points,
            event_team_id: entry.event_team_id,
            source: entry.source,
            participants: entry.participants,
            created_at,
        }
    }
}

/// Points awarded for finishing at a given 1-based placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementPoints {
    pub placement: u32,
    pub points: f64,
}

/// Checks that placements are 1-based, unique and carry finite points
pub fn validate_placement_config(config: &[PlacementPoints]) -> Result<(), ScoringError> {
    let mut seen = std::collections::HashSet::new();
    for entry in config {
        if entry.placement == 0 {
            return Err(ScoringError::Validation(
                "Placements start at 1".to_string(),
            ));
        }
        if !entry.points.is_finite() {
            return Err(ScoringError::Validation(format!(
                "Placement {} has a non-finite point value",
                entry.placement
            )));
        }
        if !seen.insert(entry.placement) {
            return Err(ScoringError::Validation(format!(
                "Placement {} is configured more than once",
                entry.placement
            )));
        }
    }
    Ok(())
}

pub fn placement_point_map(config: &[PlacementPoints]) -> BTreeMap<u32, f64> {
    config.iter().map(|p| (p.placement, p.points)).collect()
}

/// One side of a recorded match. Team games name the team directly;
/// individual games list participants whose teams are looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSide {
    /// 1 is best; sides sharing the best rank drew
    pub rank: u32,
    pub team_id: Option<String>,
    pub participants: Vec<AttributedParticipant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchPoints {
    pub win: f64,
    pub loss: f64,
    pub draw: Option<f64>,
}

impl MatchPoints {
    pub fn draw_points(&self) -> f64 {
        self.draw.unwrap_or(self.loss)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    pub event_id: String,
    pub game_type_id: String,
    pub sides: Vec<MatchSide>,
    /// `None` records the match for history without touching scores
    pub points: Option<MatchPoints>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
    pub event_id: String,
    pub game_type_id: String,
    pub sides: Vec<MatchSide>,
    pub points: Option<MatchPoints>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscretionaryAward {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub points: f64,
    pub recipients: Vec<String>,
    pub awarded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAward {
    pub event_id: String,
    pub name: String,
    pub points: f64,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwardUpdate {
    pub name: Option<String>,
    pub points: Option<f64>,
    pub recipients: Option<Vec<String>>,
}

/// A team's total on an event leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_id: String,
    pub team_name: String,
    pub color: String,
    pub points: f64,
}

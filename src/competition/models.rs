use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Active,
    Completed,
}

/// A time-boxed competition that owns teams, game types and point entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventModel {
    pub id: String,
    pub name: String,
    pub status: EventStatus,
}

impl EventModel {
    pub fn is_active(&self) -> bool {
        self.status == EventStatus::Active
    }
}

/// A named, colored team scoped to a single event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTeam {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub color: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GameCategory {
    HeadToHead,
    FreeForAll,
    HighScore,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantType {
    Individual,
    Team,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreOrder {
    HighestWins,
    LowestWins,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTypeModel {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub category: GameCategory,
    pub participant_type: ParticipantType,
    pub score_order: ScoreOrder,
}

/// A user account or an unlinked placeholder guest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ParticipantId {
    User(String),
    Placeholder(String),
}

impl ParticipantId {
    pub fn id(&self) -> &str {
        match self {
            ParticipantId::User(id) | ParticipantId::Placeholder(id) => id,
        }
    }
}

/// A participant named on a point entry, for per-person breakdowns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributedParticipant {
    pub participant: ParticipantId,
    pub display_name: String,
}

impl AttributedParticipant {
    pub fn user(id: &str, name: &str) -> Self {
        Self {
            participant: ParticipantId::User(id.to_string()),
            display_name: name.to_string(),
        }
    }

    pub fn placeholder(id: &str, display_name: &str) -> Self {
        Self {
            participant: ParticipantId::Placeholder(id.to_string()),
            display_name: display_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn enums_round_trip_through_column_text() {
        assert_eq!(ScoreOrder::LowestWins.as_ref(), "LOWEST_WINS");
        assert_eq!(
            GameCategory::from_str("FREE_FOR_ALL").unwrap(),
            GameCategory::FreeForAll
        );
        assert!(EventStatus::from_str("archived").is_err());
    }

    #[test]
    fn participant_id_exposes_raw_id() {
        assert_eq!(ParticipantId::Placeholder("p-1".into()).id(), "p-1");
    }
}

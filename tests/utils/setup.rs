use std::sync::Arc;

use league_ledger::{
    competition::{
        AttributedParticipant, EventModel, EventStatus, EventTeam, GameCategory, GameTypeModel,
        ParticipantId, ParticipantType, ScoreOrder,
    },
    InMemoryScoringStore, LedgerService, MetricsService, SessionService,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const EVENT_ID: &str = "summer-games";
pub const OTHER_EVENT_ID: &str = "winter-games";

pub const RED: &str = "red";
pub const BLUE: &str = "blue";
pub const GREEN: &str = "green";
pub const OTHER_EVENT_TEAM: &str = "frost";

/// Head-to-head, individual participants
pub const CHESS: &str = "chess";
/// Free-for-all, team sides
pub const RELAY: &str = "relay";
/// High score, individual, highest wins
pub const PINBALL: &str = "pinball";
/// High score, team owned, lowest wins
pub const SPEEDRUN: &str = "speedrun";

pub struct TestSetup {
    pub store: InMemoryScoringStore,
    pub ledger: LedgerService,
    pub sessions: SessionService,
    pub metrics: MetricsService,
}

impl TestSetup {
    pub fn alice() -> AttributedParticipant {
        AttributedParticipant::user("alice", "Alice")
    }

    pub fn bob() -> AttributedParticipant {
        AttributedParticipant::user("bob", "Bob")
    }

    pub fn carol() -> AttributedParticipant {
        AttributedParticipant::user("carol", "Carol")
    }

    pub fn dave() -> AttributedParticipant {
        AttributedParticipant::user("dave", "Dave")
    }

    /// Placeholder guest playing for blue
    pub fn guest() -> AttributedParticipant {
        AttributedParticipant::placeholder("guest-1", "Guest Gina")
    }

    /// Registered user with no team in the event
    pub fn stranger() -> AttributedParticipant {
        AttributedParticipant::user("stranger", "Stranger")
    }
}

pub struct TestSetupBuilder {
    event_status: EventStatus,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            event_status: EventStatus::Active,
        }
    }

    pub fn with_event_status(mut self, status: EventStatus) -> Self {
        self.event_status = status;
        self
    }

    pub async fn build(self) -> TestSetup {
        let store = InMemoryScoringStore::new();

        store
            .add_event(EventModel {
                id: EVENT_ID.to_string(),
                name: "Summer Games".to_string(),
                status: self.event_status,
            })
            .await;
        store
            .add_event(EventModel {
                id: OTHER_EVENT_ID.to_string(),
                name: "Winter Games".to_string(),
                status: EventStatus::Active,
            })
            .await;

        for (id, event_id, name, color) in [
            (RED, EVENT_ID, "Red Rockets", "#d33"),
            (BLUE, EVENT_ID, "Blue Herons", "#33d"),
            (GREEN, EVENT_ID, "Green Geckos", "#3d3"),
            (OTHER_EVENT_TEAM, OTHER_EVENT_ID, "Frost Giants", "#ccf"),
        ] {
            store
                .add_team(EventTeam {
                    id: id.to_string(),
                    event_id: event_id.to_string(),
                    name: name.to_string(),
                    color: color.to_string(),
                })
                .await;
        }

        for (participant, team_id) in [
            (TestSetup::alice(), RED),
            (TestSetup::bob(), RED),
            (TestSetup::carol(), BLUE),
            (TestSetup::dave(), GREEN),
            (TestSetup::guest(), BLUE),
        ] {
            store
                .add_team_member(EVENT_ID, participant.participant, team_id)
                .await;
        }
        store
            .add_team_member(
                OTHER_EVENT_ID,
                ParticipantId::User("stranger".to_string()),
                OTHER_EVENT_TEAM,
            )
            .await;

        for (id, category, participant_type, score_order) in [
            (
                CHESS,
                GameCategory::HeadToHead,
                ParticipantType::Individual,
                ScoreOrder::HighestWins,
            ),
            (
                RELAY,
                GameCategory::FreeForAll,
                ParticipantType::Team,
                ScoreOrder::HighestWins,
            ),
            (
                PINBALL,
                GameCategory::HighScore,
                ParticipantType::Individual,
                ScoreOrder::HighestWins,
            ),
            (
                SPEEDRUN,
                GameCategory::HighScore,
                ParticipantType::Team,
                ScoreOrder::LowestWins,
            ),
        ] {
            store
                .add_game_type(GameTypeModel {
                    id: id.to_string(),
                    event_id: EVENT_ID.to_string(),
                    name: id.to_string(),
                    category,
                    participant_type,
                    score_order,
                })
                .await;
        }

        let shared = Arc::new(store.clone());
        TestSetup {
            ledger: LedgerService::new(shared.clone()),
            sessions: SessionService::new(shared.clone()),
            metrics: MetricsService::new(shared),
            store,
        }
    }
}

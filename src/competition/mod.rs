// Event-side records the ledger reads but never mutates
pub mod lookups;
pub mod models;

pub use models::{
    AttributedParticipant, EventModel, EventStatus, EventTeam, GameCategory, GameTypeModel,
    ParticipantId, ParticipantType, ScoreOrder,
};

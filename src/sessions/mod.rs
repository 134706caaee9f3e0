pub mod models;
pub mod placement;
pub mod service;

pub use models::{
    HighScoreEntry, HighScoreSession, NewSession, PlacedScore, ScoreOwner, ScoreSubmission,
    SessionStatus,
};
pub use placement::{best_team_placements, rank_scores};
pub use service::SessionService;

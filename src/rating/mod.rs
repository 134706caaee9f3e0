// Elo rating deltas for league matches. Pure functions; callers persist the
// resulting ratings themselves.

pub mod elo;
pub mod models;

pub use elo::{
    expected_score, ffa_elo_changes, h2h_elo_change, k_factor, PROVISIONAL_K_FACTOR,
    PROVISIONAL_MATCH_THRESHOLD, STANDARD_K_FACTOR,
};
pub use models::{FfaEloChange, FfaParticipant, H2hEloChange, MatchOutcome, Rating};

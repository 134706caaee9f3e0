use serde::{Deserialize, Serialize};

/// A participant's rating for one game type. Persisted by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub value: f64,
    pub matches_played: u32,
}

impl Rating {
    pub fn new(value: f64, matches_played: u32) -> Self {
        Self {
            value,
            matches_played,
        }
    }

    /// Applies a delta and counts the match
    pub fn apply_change(&self, rating_change: f64) -> Rating {
        Rating {
            value: self.value + rating_change,
            matches_played: self.matches_played + 1,
        }
    }
}

/// Match result from one player's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

impl MatchOutcome {
    pub fn actual_score(self) -> f64 {
        match self {
            MatchOutcome::Win => 1.0,
            MatchOutcome::Draw => 0.5,
            MatchOutcome::Loss => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct H2hEloChange {
    pub rating_change: f64,
    pub expected_score: f64,
    pub actual_score: f64,
    pub opponent_rating: f64,
    pub k_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FfaParticipant {
    pub rating: f64,
    pub matches_played: u32,
    /// 1 is best; equal ranks are ties
    pub rank: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FfaEloChange {
    /// Position of the described participant in the caller's input slice
    pub participant_index: usize,
    pub rating_change: f64,
    pub expected_score: f64,
    pub actual_score: f64,
    pub opponent_rating_avg: f64,
    pub k_factor: f64,
}

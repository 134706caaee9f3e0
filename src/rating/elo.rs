use super::models::{FfaEloChange, FfaParticipant, H2hEloChange};

/// Players with fewer matches than this are provisional
pub const PROVISIONAL_MATCH_THRESHOLD: u32 = 10;
pub const PROVISIONAL_K_FACTOR: f64 = 40.0;
pub const STANDARD_K_FACTOR: f64 = 32.0;

pub fn k_factor(matches_played: u32) -> f64 {
    if matches_played < PROVISIONAL_MATCH_THRESHOLD {
        PROVISIONAL_K_FACTOR
    } else {
        STANDARD_K_FACTOR
    }
}

/// Probability that a player rated `rating_a` beats one rated `rating_b`
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / 400.0))
}

/// Rating delta for one side of a head-to-head match.
///
/// `actual_score` is 1.0 for a win, 0.0 for a loss and 0.5 for a draw
/// (see [`super::MatchOutcome::actual_score`]).
pub fn h2h_elo_change(
    player_rating: f64,
    player_matches_played: u32,
    opponent_rating: f64,
    actual_score: f64,
) -> H2hEloChange {
    let k = k_factor(player_matches_played);
    let expected = expected_score(player_rating, opponent_rating);

    H2hEloChange {
        rating_change: k * (actual_score - expected),
        expected_score: expected,
        actual_score,
        opponent_rating,
        k_factor: k,
    }
}

/// Rating deltas for a free-for-all match.
///
/// Every participant is scored pairwise against every other participant and
/// each accumulator is averaged over the opponent count, so the swing stays
/// bounded no matter how large the field is. Each participant's K-factor comes
/// from their own match count only.
///
/// Results follow a stable rank-sorted copy of the input; use
/// `participant_index` to map a result back to the caller's slice.
pub fn ffa_elo_changes(participants: &[FfaParticipant]) -> Vec<FfaEloChange> {
    let mut ranked: Vec<(usize, &FfaParticipant)> = participants.iter().enumerate().collect();
    ranked.sort_by_key(|(_, p)| p.rank);

    let opponents = ranked.len().saturating_sub(1);
    if opponents == 0 {
        return ranked
            .iter()
            .map(|(index, _)| FfaEloChange {
                participant_index: *index,
                rating_change: 0.0,
                expected_score: 0.0,
                actual_score: 0.0,
                opponent_rating_avg: 0.0,
                k_factor: 0.0,
            })
            .collect();
    }

    ranked
        .iter()
        .map(|(index, player)| {
            let k = k_factor(player.matches_played);
            let mut expected_total = 0.0;
            let mut actual_total = 0.0;
            let mut change_total = 0.0;
            let mut opponent_rating_total = 0.0;

            for (other_index, opponent) in &ranked {
                if other_index == index {
                    continue;
                }

                let expected = expected_score(player.rating, opponent.rating);
                let actual = pairwise_actual_score(player.rank, opponent.rank);

                expected_total += expected;
                actual_total += actual;
                change_total += k * (actual - expected);
                opponent_rating_total += opponent.rating;
            }

            let count = opponents as f64;
            FfaEloChange {
                participant_index: *index,
                rating_change: change_total / count,
                expected_score: expected_total / count,
                actual_score: actual_total / count,
                opponent_rating_avg: opponent_rating_total / count,
                k_factor: k,
            }
        })
        .collect()
}

fn pairwise_actual_score(rank: u32, opponent_rank: u32) -> f64 {
    match rank.cmp(&opponent_rank) {
        std::cmp::Ordering::Less => 1.0,
        std::cmp::Ordering::Greater => 0.0,
        std::cmp::Ordering::Equal => 0.5,
    }
}

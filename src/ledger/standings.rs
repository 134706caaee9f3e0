use std::collections::HashMap;

use super::models::{PointEntry, TeamStanding};
use crate::competition::EventTeam;

/// Totals per team, highest first. Teams without entries appear with zero;
/// entries for unknown teams are ignored.
pub fn leaderboard(teams: &[EventTeam], entries: &[PointEntry]) -> Vec<TeamStanding> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for entry in entries {
        *totals.entry(entry.event_team_id.as_str()).or_default() += entry.points;
    }

    let mut standings: Vec<TeamStanding> = teams
        .iter()
        .map(|team| TeamStanding {
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            color: team.color.clone(),
            points: totals.get(team.id.as_str()).copied().unwrap_or_default(),
        })
        .collect();

    standings.sort_by(|a, b| {
        b.points
            .total_cmp(&a.points)
            .then_with(|| a.team_name.cmp(&b.team_name))
    });
    standings
}

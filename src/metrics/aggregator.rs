use std::collections::{BTreeMap, HashMap};

use super::models::{
    CategoryTotal, EventMetrics, IndividualContribution, TeamCategoryBreakdown, TeamContribution,
    TeamIndividualContributions, TimelineDetail, TimelinePoint,
};
use crate::competition::{EventTeam, ParticipantId};
use crate::ledger::{PointCategory, PointEntry, SourceKind, SourceRef, TeamStanding};

/// Team names and display order for a metrics run.
///
/// Leaderboard order comes first, then teams missing from the leaderboard.
/// Team ids that only appear on entries are named by their id.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    order: Vec<String>,
    names: HashMap<String, String>,
}

impl TeamDirectory {
    pub fn new(teams: &[EventTeam], leaderboard: &[TeamStanding]) -> Self {
        let mut directory = Self::default();
        for standing in leaderboard {
            directory.add(&standing.team_id, &standing.team_name);
        }
        for team in teams {
            directory.add(&team.id, &team.name);
        }
        directory
    }

    fn add(&mut self, team_id: &str, name: &str) {
        if !self.names.contains_key(team_id) {
            self.order.push(team_id.to_string());
            self.names.insert(team_id.to_string(), name.to_string());
        }
    }

    fn with_entry_teams(&self, entries: &[&PointEntry]) -> Self {
        let mut directory = self.clone();
        for entry in entries {
            directory.add(&entry.event_team_id, &entry.event_team_id);
        }
        directory
    }

    pub fn name(&self, team_id: &str) -> String {
        self.names
            .get(team_id)
            .cloned()
            .unwrap_or_else(|| team_id.to_string())
    }

    pub fn team_ids(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }
}

/// Folds an event's entries into everything the scoreboard displays.
/// Entries worth zero points are ignored throughout.
pub fn aggregate(
    teams: &[EventTeam],
    leaderboard: &[TeamStanding],
    entries: &[PointEntry],
) -> EventMetrics {
    let scored = scored_entries(entries);
    let directory = TeamDirectory::new(teams, leaderboard);

    EventMetrics {
        leaderboard: leaderboard.to_vec(),
        cumulative_timeline: cumulative_timeline(&directory, &scored),
        team_contributions: team_contributions(&directory, &scored),
        individual_contributions: individual_contributions(&directory, &scored),
        category_breakdowns: category_breakdowns(&directory, &scored),
        log: scored.iter().rev().map(|entry| (*entry).clone()).collect(),
    }
}

fn scored_entries(entries: &[PointEntry]) -> Vec<&PointEntry> {
    entries.iter().filter(|entry| entry.points != 0.0).collect()
}

/// One point per entry, in creation order, carrying every team's running
/// total. Known teams start at zero.
pub fn cumulative_timeline(
    directory: &TeamDirectory,
    entries: &[&PointEntry],
) -> Vec<TimelinePoint> {
    let mut totals: BTreeMap<String, f64> =
        directory.team_ids().map(|id| (id.clone(), 0.0)).collect();

    entries
        .iter()
        .map(|entry| {
            *totals.entry(entry.event_team_id.clone()).or_insert(0.0) += entry.points;

            TimelinePoint {
                created_at: entry.created_at,
                totals: totals.clone(),
                detail: TimelineDetail {
                    entry_id: entry.id.clone(),
                    team_id: entry.event_team_id.clone(),
                    team_name: directory.name(&entry.event_team_id),
                    category_label: entry.category.label().to_string(),
                    outcome_label: entry.outcome.label().to_string(),
                    points: entry.points,
                    link: deep_link(&entry.event_id, &entry.source),
                },
            }
        })
        .collect()
}

pub fn team_contributions(
    directory: &TeamDirectory,
    entries: &[&PointEntry],
) -> Vec<TeamContribution> {
    let directory = directory.with_entry_teams(entries);
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for entry in entries {
        *totals.entry(entry.event_team_id.as_str()).or_default() += entry.points;
    }

    let mut contributions: Vec<TeamContribution> = directory
        .team_ids()
        .map(|team_id| TeamContribution {
            team_id: team_id.clone(),
            team_name: directory.name(team_id),
            points: totals.get(team_id.as_str()).copied().unwrap_or_default(),
        })
        .collect();
    contributions.sort_by(|a, b| b.points.total_cmp(&a.points));
    contributions
}

/// Points per named individual, grouped by team. Entries that name nobody
/// are skipped.
pub fn individual_contributions(
    directory: &TeamDirectory,
    entries: &[&PointEntry],
) -> Vec<TeamIndividualContributions> {
    let directory = directory.with_entry_teams(entries);
    let mut per_team: HashMap<&str, HashMap<&ParticipantId, IndividualContribution>> =
        HashMap::new();

    for entry in entries {
        let people = per_team.entry(entry.event_team_id.as_str()).or_default();
        for attributed in &entry.participants {
            people
                .entry(&attributed.participant)
                .or_insert_with(|| IndividualContribution {
                    name: attributed.display_name.clone(),
                    points: 0.0,
                })
                .points += entry.points;
        }
    }

    directory
        .team_ids()
        .map(|team_id| {
            let mut contributors: Vec<IndividualContribution> = per_team
                .remove(team_id.as_str())
                .map(|people| people.into_values().collect())
                .unwrap_or_default();
            contributors.sort_by(|a, b| {
                b.points
                    .total_cmp(&a.points)
                    .then_with(|| a.name.cmp(&b.name))
            });

            TeamIndividualContributions {
                team_id: team_id.clone(),
                team_name: directory.name(team_id),
                contributors,
            }
        })
        .collect()
}

/// Points per category for each team, largest category first
pub fn category_breakdowns(
    directory: &TeamDirectory,
    entries: &[&PointEntry],
) -> Vec<TeamCategoryBreakdown> {
    let directory = directory.with_entry_teams(entries);
    let mut per_team: HashMap<&str, BTreeMap<PointCategory, f64>> = HashMap::new();
    for entry in entries {
        *per_team
            .entry(entry.event_team_id.as_str())
            .or_default()
            .entry(entry.category)
            .or_default() += entry.points;
    }

    directory
        .team_ids()
        .map(|team_id| {
            let mut categories: Vec<CategoryTotal> = per_team
                .remove(team_id.as_str())
                .unwrap_or_default()
                .into_iter()
                .map(|(category, points)| CategoryTotal {
                    category,
                    label: category.label().to_string(),
                    points,
                })
                .collect();
            categories.sort_by(|a, b| b.points.total_cmp(&a.points));

            TeamCategoryBreakdown {
                team_id: team_id.clone(),
                team_name: directory.name(team_id),
                categories,
            }
        })
        .collect()
}

/// Path of the page showing the record an entry came from
pub fn deep_link(event_id: &str, source: &SourceRef) -> String {
    let section = match source.kind {
        SourceKind::Match => "matches",
        SourceKind::HighScoreSession => "high-scores",
        SourceKind::Tournament => "tournaments",
        SourceKind::DiscretionaryAward => "awards",
    };
    format!("/events/{}/{}/{}", event_id, section, source.id)
}

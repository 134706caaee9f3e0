use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ledger::{PointCategory, PointEntry, TeamStanding};

/// What happened at one step of the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDetail {
    pub entry_id: String,
    pub team_id: String,
    pub team_name: String,
    pub category_label: String,
    pub outcome_label: String,
    pub points: f64,
    pub link: String,
}

/// Running totals for every team right after one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub created_at: DateTime<Utc>,
    /// team id -> cumulative points
    pub totals: BTreeMap<String, f64>,
    pub detail: TimelineDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamContribution {
    pub team_id: String,
    pub team_name: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualContribution {
    pub name: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamIndividualContributions {
    pub team_id: String,
    pub team_name: String,
    pub contributors: Vec<IndividualContribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: PointCategory,
    pub label: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCategoryBreakdown {
    pub team_id: String,
    pub team_name: String,
    pub categories: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetrics {
    pub leaderboard: Vec<TeamStanding>,
    pub cumulative_timeline: Vec<TimelinePoint>,
    pub team_contributions: Vec<TeamContribution>,
    pub individual_contributions: Vec<TeamIndividualContributions>,
    pub category_breakdowns: Vec<TeamCategoryBreakdown>,
    /// Most recent first
    pub log: Vec<PointEntry>,
}

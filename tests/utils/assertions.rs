use std::collections::BTreeMap;

use league_ledger::{PointEntry, ScoringError};

/// Sums entry points per team
pub fn points_by_team(entries: &[PointEntry]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.event_team_id.clone()).or_insert(0.0) += entry.points;
    }
    totals
}

pub fn assert_not_found<T: std::fmt::Debug>(result: Result<T, ScoringError>) {
    assert!(
        matches!(result, Err(ScoringError::NotFound(_))),
        "expected NotFound, got {:?}",
        result
    );
}

pub fn assert_state_conflict<T: std::fmt::Debug>(result: Result<T, ScoringError>) {
    assert!(
        matches!(result, Err(ScoringError::StateConflict(_))),
        "expected StateConflict, got {:?}",
        result
    );
}

pub fn assert_shape_conflict<T: std::fmt::Debug>(result: Result<T, ScoringError>) {
    assert!(
        matches!(result, Err(ScoringError::ShapeConflict(_))),
        "expected ShapeConflict, got {:?}",
        result
    );
}

pub fn assert_validation<T: std::fmt::Debug>(result: Result<T, ScoringError>) {
    assert!(
        matches!(result, Err(ScoringError::Validation(_))),
        "expected Validation, got {:?}",
        result
    );
}

use std::sync::Arc;
use tracing::{debug, instrument};

use super::aggregator::aggregate;
use super::models::EventMetrics;
use crate::competition::lookups::require_event;
use crate::ledger::standings;
use crate::shared::ScoringError;
use crate::store::ScoringStore;

/// Read-only view over an event's ledger for the scoreboard
pub struct MetricsService {
    store: Arc<dyn ScoringStore>,
}

impl MetricsService {
    pub fn new(store: Arc<dyn ScoringStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn event_metrics(&self, event_id: &str) -> Result<EventMetrics, ScoringError> {
        let mut tx = self.store.begin().await?;
        let event = require_event(tx.as_mut(), event_id).await?;
        let teams = tx.list_teams(&event.id).await?;
        let entries = tx.list_point_entries_for_event(&event.id).await?;

        let leaderboard = standings::leaderboard(&teams, &entries);
        let metrics = aggregate(&teams, &leaderboard, &entries);

        debug!(
            teams = teams.len(),
            entries = entries.len(),
            timeline = metrics.cumulative_timeline.len(),
            "Event metrics computed"
        );
        Ok(metrics)
    }
}

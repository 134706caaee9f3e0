// Library crate for the league scoring ledger
// This file exposes the public API for the scoreboard binary and integration tests

pub mod competition;
pub mod config;
pub mod ledger;
pub mod metrics;
pub mod rating;
pub mod sessions;
pub mod shared;
pub mod store;

// Re-export commonly used types for easier access in tests
pub use config::ScoringConfig;
pub use ledger::{LedgerService, PointEntry, SourceRef};
pub use metrics::{EventMetrics, MetricsService};
pub use sessions::SessionService;
pub use shared::{Authorizer, ScoringError};
pub use store::{InMemoryScoringStore, PostgresScoringStore, ScoringStore, ScoringTransaction};

pub mod aggregator;
pub mod models;
pub mod service;

pub use aggregator::{aggregate, deep_link, TeamDirectory};
pub use models::*;
pub use service::MetricsService;

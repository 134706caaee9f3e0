use league_ledger::{MetricsService, PostgresScoringStore, ScoringConfig, ScoringError};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prints the scoreboard metrics of one event as JSON.
///
/// Usage: `scoreboard <event-id>`
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ScoringConfig::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| "league_ledger=info,scoreboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let event_id = std::env::args()
        .nth(1)
        .ok_or_else(|| ScoringError::Validation("usage: scoreboard <event-id>".to_string()))?;

    let store = PostgresScoringStore::connect(&config).await?;
    store.run_migrations().await?;
    info!(event_id = %event_id, "Computing scoreboard");

    let metrics = MetricsService::new(Arc::new(store))
        .event_metrics(&event_id)
        .await?;
    println!("{}", serde_json::to_string_pretty(&metrics)?);

    Ok(())
}

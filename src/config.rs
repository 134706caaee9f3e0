/// Runtime configuration for the scoreboard binary and the Postgres store
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub log_filter: String,
}

impl ScoringConfig {
    pub fn from_env() -> Self {
        let max_connections = std::env::var("SCORING_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(5);

        Self {
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            max_connections,
            log_filter: std::env::var("SCORING_LOG")
                .unwrap_or_else(|_| "league_ledger=info,scoreboard=info".to_string()),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            log_filter: "league_ledger=info,scoreboard=info".to_string(),
        }
    }
}

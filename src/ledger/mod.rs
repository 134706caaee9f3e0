pub mod builders;
pub mod models;
pub mod operations;
pub mod service;
pub mod standings;

pub use builders::{
    entries_for_award, entries_for_match, entries_for_placements, BestPlacement, ResolvedMember,
    ResolvedSide,
};
pub use models::*;
pub use operations::{delete_for_source, recreate_for_source};
pub use service::{LedgerService, TournamentPlacement};
pub use standings::leaderboard;

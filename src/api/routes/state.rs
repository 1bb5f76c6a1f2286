use crate::config::RatingsConfig;
use crate::database::Database;

/// Shared application state passed to all Axum handlers via `.with_state()`.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub ratings: RatingsConfig,
}

impl AppState {
    pub fn new(db: Database, ratings: RatingsConfig) -> Self {
        Self { db, ratings }
    }
}

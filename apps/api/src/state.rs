use crate::config::Config;
use crate::search::jobs::SearchRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Running and recently finished searches. Owns the `JobSearcher` backend.
    pub searches: SearchRegistry,
}

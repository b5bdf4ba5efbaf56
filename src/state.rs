use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clients::{JokeFetcher, SearchIndexer};
use crate::config::JokeDefaults;
use crate::services::JokesService;
use crate::store::JokeStore;

/// Everything the handlers need, built once by the composition root and
/// shared behind an `Arc`.
pub struct AppState {
    pub jokes: JokesService,
    pub store: Arc<dyn JokeStore>,
    pub indexer: Arc<dyn SearchIndexer>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn JokeStore>,
        fetcher: Arc<dyn JokeFetcher>,
        indexer: Arc<dyn SearchIndexer>,
        defaults: JokeDefaults,
        fetch_timeout: Duration,
    ) -> Self {
        let jokes = JokesService::new(
            Arc::clone(&store),
            fetcher,
            Arc::clone(&indexer),
            defaults,
            fetch_timeout,
        );

        AppState {
            jokes,
            store,
            indexer,
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

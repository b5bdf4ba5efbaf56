use std::sync::Arc;
use std::time::Duration;

use futures::future::{join, join_all};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::{ExternalJoke, ExternalSource, FetchError, JokeDocument, JokeFetcher, SearchIndexer};
use crate::config::JokeDefaults;
use crate::error::ApiError;
use crate::models::joke::CUSTOM_SOURCE;
use crate::models::{Joke, NewJoke, PairedJoke};
use crate::services::combiner::combine;
use crate::services::random::pick_offset;
use crate::store::JokeStore;

/// Jokes fetched from each provider per paired-jokes request.
pub const PAIR_BATCH_SIZE: usize = 5;

/// Joke use cases: stored jokes, external fetches and paired synthesis.
///
/// Collaborators are injected as trait objects; the service owns no global
/// state and is cheap to share behind an `Arc`.
pub struct JokesService {
    store: Arc<dyn JokeStore>,
    fetcher: Arc<dyn JokeFetcher>,
    indexer: Arc<dyn SearchIndexer>,
    defaults: JokeDefaults,
    fetch_timeout: Duration,
}

impl JokesService {
    pub fn new(
        store: Arc<dyn JokeStore>,
        fetcher: Arc<dyn JokeFetcher>,
        indexer: Arc<dyn SearchIndexer>,
        defaults: JokeDefaults,
        fetch_timeout: Duration,
    ) -> Self {
        JokesService {
            store,
            fetcher,
            indexer,
            defaults,
            fetch_timeout,
        }
    }

    /// A uniformly random stored joke, `None` when the table is empty or the
    /// sampled row disappeared between counting and fetching.
    pub async fn random_joke(&self) -> Result<Option<Joke>, ApiError> {
        let count = self.store.count().await?;

        let Some(offset) = pick_offset(&mut rand::thread_rng(), count) else {
            return Ok(None);
        };

        let joke = self.store.sample_one(offset).await?;
        if joke.is_none() {
            debug!("No joke at offset {} of {}; count went stale", offset, count);
        }
        Ok(joke)
    }

    pub async fn external_joke(&self, source: ExternalSource) -> Result<ExternalJoke, ApiError> {
        self.fetcher.fetch(source).await.map_err(|err| {
            warn!("Error fetching {} joke: {}", source, err);
            ApiError::from(err)
        })
    }

    /// Stores a new joke under `user_name` and `topic_name`, falling back to the
    /// configured defaults. Both names must already exist.
    pub async fn create_joke(
        &self,
        text: &str,
        user_name: Option<&str>,
        topic_name: Option<&str>,
    ) -> Result<Joke, ApiError> {
        let user_name = user_name.unwrap_or(&self.defaults.default_user_name);
        let topic_name = topic_name.unwrap_or(&self.defaults.default_topic_name);

        let user = self
            .store
            .find_user_by_name(user_name)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("User '{}'", user_name)))?;

        let topic = self
            .store
            .find_topic_by_name(topic_name)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Topic '{}'", topic_name)))?;

        let joke = self
            .store
            .insert(NewJoke {
                text: text.to_string(),
                source: CUSTOM_SOURCE.to_string(),
                user_id: user.id,
                topic_id: topic.id,
            })
            .await?;

        self.spawn_index(&joke);
        Ok(joke)
    }

    /// Deletes the joke with display `number`. Returns `false` when no such
    /// joke exists.
    pub async fn delete_joke(&self, number: i32) -> Result<bool, ApiError> {
        let Some(joke) = self.store.find_by_number(number).await? else {
            return Ok(false);
        };

        self.store.delete(joke.id).await?;
        self.spawn_unindex(joke.id);
        Ok(true)
    }

    pub async fn list_jokes(
        &self,
        user_name: Option<&str>,
        topic_name: Option<&str>,
    ) -> Result<Vec<Joke>, ApiError> {
        self.store.query(user_name, topic_name).await
    }

    /// Fetches `PAIR_BATCH_SIZE` jokes from each provider concurrently and pairs
    /// them by position. Indices where either side failed are dropped.
    pub async fn paired_jokes(&self) -> Result<Vec<PairedJoke>, ApiError> {
        let chuck = join_all((0..PAIR_BATCH_SIZE).map(|i| self.fetch_bounded(ExternalSource::Chuck, i)));
        let dad = join_all((0..PAIR_BATCH_SIZE).map(|i| self.fetch_bounded(ExternalSource::Dad, i)));

        let (chuck, dad) = join(chuck, dad).await;

        let pairs: Vec<PairedJoke> = chuck
            .into_iter()
            .zip(dad)
            .filter_map(|pair| match pair {
                (Some(chuck), Some(dad)) => {
                    let combined = combine(&chuck.text, &dad.text);
                    Some(PairedJoke::new(chuck.text, dad.text, combined))
                }
                _ => None,
            })
            .collect();

        if pairs.is_empty() {
            return Err(ApiError::NoJokesAvailable);
        }

        info!("Built {} of {} paired jokes", pairs.len(), PAIR_BATCH_SIZE);
        Ok(pairs)
    }

    /// One fetch under the per-fetch ceiling. Failures are logged and become
    /// `None` so they never reach the caller.
    async fn fetch_bounded(&self, source: ExternalSource, index: usize) -> Option<ExternalJoke> {
        let outcome = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(source))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::failed(
                    source,
                    format!("timed out after {:?}", self.fetch_timeout),
                ))
            });

        match outcome {
            Ok(joke) => Some(joke),
            Err(err) => {
                warn!(index, "Skipping paired joke slot: {}", err);
                None
            }
        }
    }

    fn spawn_index(&self, joke: &Joke) {
        let indexer = Arc::clone(&self.indexer);
        let id = joke.id;
        let document = JokeDocument::from(joke);

        tokio::spawn(async move {
            if let Err(err) = indexer.index(id, &document).await {
                warn!("Failed to index joke {} in search: {}", id, err);
            }
        });
    }

    fn spawn_unindex(&self, id: Uuid) {
        let indexer = Arc::clone(&self.indexer);

        tokio::spawn(async move {
            if let Err(err) = indexer.delete(id).await {
                warn!("Failed to remove joke {} from search: {}", id, err);
            }
        });
    }
}

//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use reqwest::StatusCode;
use uuid::Uuid;

use jokes_rest_api::clients::{
    ExternalJoke, ExternalSource, FetchError, JokeDocument, JokeFetcher, SearchError, SearchIndexer,
};
use jokes_rest_api::config::JokeDefaults;
use jokes_rest_api::models::{Joke, NewJoke, Topic, User, UserSummary};
use jokes_rest_api::{create_router, ApiError, AppState, JokeStore, JokesService};

pub const USERS: [&str; 4] = ["Manolito", "Pepe", "Isabel", "Pedro"];
pub const TOPICS: [&str; 3] = ["humor negro", "humor amarillo", "chistes verdes"];

/// Fetch ceiling used by the helpers unless a test builds its own service.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    users: Vec<User>,
    topics: Vec<Topic>,
    jokes: Vec<Joke>,
    next_number: i32,
}

/// `JokeStore` over plain vectors. Numbers are assigned sequentially from 1.
#[derive(Default)]
pub struct InMemoryJokeStore {
    state: Mutex<StoreState>,
    phantom_rows: AtomicU64,
    unhealthy: AtomicBool,
}

impl InMemoryJokeStore {
    /// Users and topics of the development seed, no jokes.
    pub fn seeded() -> Self {
        let store = InMemoryJokeStore::default();
        {
            let mut state = store.state.lock().unwrap();
            state.users = USERS.iter().map(|name| user(name)).collect();
            state.topics = TOPICS.iter().map(|name| topic(name)).collect();
            state.next_number = 1;
        }
        store
    }

    pub fn add_joke(&self, text: &str, user_name: &str, topic_name: &str) -> Joke {
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter()
            .find(|u| u.name == user_name)
            .cloned()
            .expect("seeded user");
        let topic = state
            .topics
            .iter()
            .find(|t| t.name == topic_name)
            .cloned()
            .expect("seeded topic");

        let joke = build_joke(&mut state, text.to_string(), "custom".to_string(), &user, &topic);
        state.jokes.push(joke.clone());
        joke
    }

    /// Makes `count()` report `extra` rows that `sample_one` cannot see, like a
    /// delete landing between the two calls.
    pub fn inflate_count(&self, extra: u64) {
        self.phantom_rows.store(extra, Ordering::SeqCst);
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub fn jokes(&self) -> Vec<Joke> {
        self.state.lock().unwrap().jokes.clone()
    }
}

fn user(name: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn topic(name: &str) -> Topic {
    let now = Utc::now();
    Topic {
        id: Uuid::new_v4(),
        name: name.to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn build_joke(state: &mut StoreState, text: String, source: String, user: &User, topic: &Topic) -> Joke {
    let number = state.next_number.max(1);
    state.next_number = number + 1;
    let now = Utc::now();

    Joke {
        id: Uuid::new_v4(),
        number,
        text,
        source: Some(source),
        user: Some(UserSummary {
            id: user.id,
            name: user.name.clone(),
        }),
        topics: vec![topic.name.clone()],
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl JokeStore for InMemoryJokeStore {
    async fn count(&self) -> Result<u64, ApiError> {
        let rows = self.state.lock().unwrap().jokes.len() as u64;
        Ok(rows + self.phantom_rows.load(Ordering::SeqCst))
    }

    async fn sample_one(&self, offset: u64) -> Result<Option<Joke>, ApiError> {
        let state = self.state.lock().unwrap();
        let mut jokes: Vec<&Joke> = state.jokes.iter().collect();
        jokes.sort_by_key(|joke| joke.number);
        Ok(jokes.get(offset as usize).map(|joke| (*joke).clone()))
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.name == name).cloned())
    }

    async fn find_topic_by_name(&self, name: &str) -> Result<Option<Topic>, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state.topics.iter().find(|t| t.name == name).cloned())
    }

    async fn insert(&self, joke: NewJoke) -> Result<Joke, ApiError> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter()
            .find(|u| u.id == joke.user_id)
            .cloned()
            .ok_or_else(|| ApiError::validation("Referenced user or topic does not exist"))?;
        let topic = state
            .topics
            .iter()
            .find(|t| t.id == joke.topic_id)
            .cloned()
            .ok_or_else(|| ApiError::validation("Referenced user or topic does not exist"))?;

        let stored = build_joke(&mut state, joke.text, joke.source, &user, &topic);
        state.jokes.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_number(&self, number: i32) -> Result<Option<Joke>, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state.jokes.iter().find(|j| j.number == number).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.state.lock().unwrap().jokes.retain(|j| j.id != id);
        Ok(())
    }

    async fn query(
        &self,
        user_name: Option<&str>,
        topic_name: Option<&str>,
    ) -> Result<Vec<Joke>, ApiError> {
        let state = self.state.lock().unwrap();
        let mut jokes: Vec<Joke> = state
            .jokes
            .iter()
            .filter(|joke| {
                user_name.map_or(true, |name| {
                    joke.user.as_ref().is_some_and(|user| user.name == name)
                })
            })
            .filter(|joke| topic_name.map_or(true, |topic| joke.topics.iter().any(|t| t == topic)))
            .cloned()
            .collect();
        jokes.sort_by_key(|joke| joke.number);
        Ok(jokes)
    }

    async fn health_check(&self) -> Result<(), ApiError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(ApiError::Database("connection refused".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Outcome {
    Fail,
    Hang,
}

/// Scripted `JokeFetcher`. Calls are numbered per source from 0; the joke text
/// carries that number so tests can tell which slot survived.
#[derive(Default)]
pub struct StubFetcher {
    delay: Duration,
    fail_everything: bool,
    plan: Mutex<HashMap<(ExternalSource, usize), Outcome>>,
    calls: Mutex<HashMap<ExternalSource, usize>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        StubFetcher::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_everything = true;
        self
    }

    pub fn fail_call(self, source: ExternalSource, call: usize) -> Self {
        self.plan.lock().unwrap().insert((source, call), Outcome::Fail);
        self
    }

    pub fn hang_call(self, source: ExternalSource, call: usize) -> Self {
        self.plan.lock().unwrap().insert((source, call), Outcome::Hang);
        self
    }

    pub fn calls(&self, source: ExternalSource) -> usize {
        self.calls.lock().unwrap().get(&source).copied().unwrap_or(0)
    }
}

pub fn chuck_text(call: usize) -> String {
    format!("Chuck Norris joke {}", call)
}

pub fn dad_text(call: usize) -> String {
    format!("Why is dad joke {} funny? Because it is.", call)
}

#[async_trait]
impl JokeFetcher for StubFetcher {
    async fn fetch(&self, source: ExternalSource) -> Result<ExternalJoke, FetchError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let counter = calls.entry(source).or_insert(0);
            let call = *counter;
            *counter += 1;
            call
        };
        let outcome = self.plan.lock().unwrap().get(&(source, call)).copied();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if outcome == Some(Outcome::Hang) {
            std::future::pending::<()>().await;
        }

        if self.fail_everything || outcome == Some(Outcome::Fail) {
            return Err(FetchError::failed(source, "HTTP status 503"));
        }

        let text = match source {
            ExternalSource::Chuck => chuck_text(call),
            ExternalSource::Dad => dad_text(call),
        };

        Ok(ExternalJoke {
            text,
            source,
            id: Some(format!("{}-{}", source, call)),
            url: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Indexers
// ---------------------------------------------------------------------------

/// Remembers every id it was asked to index or delete.
pub struct RecordingIndexer {
    indexed: Mutex<Vec<(Uuid, JokeDocument)>>,
    deleted: Mutex<Vec<Uuid>>,
    healthy: AtomicBool,
}

impl RecordingIndexer {
    pub fn new() -> Self {
        RecordingIndexer {
            indexed: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn indexed_ids(&self) -> Vec<Uuid> {
        self.indexed.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }

    pub fn document(&self, id: Uuid) -> Option<JokeDocument> {
        self.indexed
            .lock()
            .unwrap()
            .iter()
            .find(|(indexed, _)| *indexed == id)
            .map(|(_, document)| document.clone())
    }

    pub fn deleted_ids(&self) -> Vec<Uuid> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl SearchIndexer for RecordingIndexer {
    async fn index(&self, id: Uuid, document: &JokeDocument) -> Result<(), SearchError> {
        self.indexed.lock().unwrap().push((id, document.clone()));
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), SearchError> {
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

/// Rejects every request, or never answers when built with `hanging()`.
pub struct FailingIndexer {
    hang: bool,
    attempts: AtomicU64,
}

impl FailingIndexer {
    pub fn new() -> Self {
        FailingIndexer {
            hang: false,
            attempts: AtomicU64::new(0),
        }
    }

    pub fn hanging() -> Self {
        FailingIndexer {
            hang: true,
            attempts: AtomicU64::new(0),
        }
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    async fn reject(&self) -> Result<(), SearchError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(SearchError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "cluster unavailable".to_string(),
        })
    }
}

#[async_trait]
impl SearchIndexer for FailingIndexer {
    async fn index(&self, _id: Uuid, _document: &JokeDocument) -> Result<(), SearchError> {
        self.reject().await
    }

    async fn delete(&self, _id: Uuid) -> Result<(), SearchError> {
        self.reject().await
    }

    async fn is_healthy(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub fn service(
    store: Arc<InMemoryJokeStore>,
    fetcher: Arc<StubFetcher>,
    indexer: Arc<dyn SearchIndexer>,
) -> JokesService {
    service_with_timeout(store, fetcher, indexer, FETCH_TIMEOUT)
}

pub fn service_with_timeout(
    store: Arc<InMemoryJokeStore>,
    fetcher: Arc<StubFetcher>,
    indexer: Arc<dyn SearchIndexer>,
    fetch_timeout: Duration,
) -> JokesService {
    JokesService::new(store, fetcher, indexer, JokeDefaults::default(), fetch_timeout)
}

pub fn app(
    store: Arc<InMemoryJokeStore>,
    fetcher: Arc<StubFetcher>,
    indexer: Arc<dyn SearchIndexer>,
) -> Router {
    let state = AppState::new(store, fetcher, indexer, JokeDefaults::default(), FETCH_TIMEOUT);
    create_router(Arc::new(state), Duration::from_secs(10))
}

/// Polls `condition` until it holds, for background work spawned by the service.
pub async fn eventually<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

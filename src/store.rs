//! Persistence seam for jokes, users and topics.
//!
//! `Database` implements this against Postgres; services only ever hold an
//! `Arc<dyn JokeStore>`, so tests can swap in an in-memory store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Joke, NewJoke, Topic, User};

#[async_trait]
pub trait JokeStore: Send + Sync {
    /// Number of stored jokes.
    async fn count(&self) -> Result<u64, ApiError>;

    /// The joke at `offset` in `number` order. `None` when the offset is past the
    /// end, which happens when jokes are deleted between `count` and this call.
    async fn sample_one(&self, offset: u64) -> Result<Option<Joke>, ApiError>;

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, ApiError>;

    async fn find_topic_by_name(&self, name: &str) -> Result<Option<Topic>, ApiError>;

    /// Persists a joke linked to one topic; the store assigns `id` and `number`.
    async fn insert(&self, joke: NewJoke) -> Result<Joke, ApiError>;

    async fn find_by_number(&self, number: i32) -> Result<Option<Joke>, ApiError>;

    async fn delete(&self, id: Uuid) -> Result<(), ApiError>;

    /// Jokes whose creator is named `user_name` and that carry a topic named
    /// `topic_name`. `None` filters are ignored.
    async fn query(
        &self,
        user_name: Option<&str>,
        topic_name: Option<&str>,
    ) -> Result<Vec<Joke>, ApiError>;

    async fn health_check(&self) -> Result<(), ApiError>;
}

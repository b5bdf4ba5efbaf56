//! Full-text index collaborator.
//!
//! Jokes are mirrored into an Elasticsearch index on a best-effort basis. The
//! service never reads from it, and callers log failures instead of
//! propagating them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::models::Joke;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("search service answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid search URL: {0}")]
    Url(String),
}

/// Document shape stored in the index, one per joke id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JokeDocument {
    pub text: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub topics: Vec<String>,
    pub number: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Joke> for JokeDocument {
    fn from(joke: &Joke) -> Self {
        JokeDocument {
            text: joke.text.clone(),
            source: joke.source.clone().unwrap_or_default(),
            user_id: joke.user.as_ref().map(|u| u.id),
            user_name: joke.user.as_ref().map(|u| u.name.clone()),
            topics: joke.topics.clone(),
            number: joke.number,
            created_at: joke.created_at,
            updated_at: joke.updated_at,
        }
    }
}

#[async_trait]
pub trait SearchIndexer: Send + Sync {
    async fn index(&self, id: Uuid, document: &JokeDocument) -> Result<(), SearchError>;

    async fn delete(&self, id: Uuid) -> Result<(), SearchError>;

    /// `true` unless the cluster is unreachable or reports `red`.
    async fn is_healthy(&self) -> bool;
}

#[derive(Debug, Deserialize)]
struct ClusterHealth {
    status: String,
}

/// `SearchIndexer` talking to Elasticsearch's REST API.
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Client,
    base_url: Url,
    index: String,
}

impl ElasticsearchClient {
    pub fn new(config: &SearchConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        // `join` replaces the last segment unless the base ends with '/'
        let mut base_url = config.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(ElasticsearchClient {
            client,
            base_url,
            index: config.index.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, SearchError> {
        self.base_url
            .join(path)
            .map_err(|e| SearchError::Url(e.to_string()))
    }

    fn document_url(&self, id: Uuid) -> Result<Url, SearchError> {
        self.url(&format!("{}/_doc/{}", self.index, id))
    }

    /// Creates the index with explicit mappings when it does not exist yet.
    pub async fn ensure_index(&self) -> Result<(), SearchError> {
        let url = self.url(&self.index)?;

        let exists = self.client.head(url.clone()).send().await?;
        match exists.status() {
            status if status.is_success() => {
                info!("Elasticsearch index '{}' already exists", self.index);
                return Ok(());
            }
            StatusCode::NOT_FOUND => {}
            status => {
                return Err(SearchError::Status {
                    status,
                    body: String::new(),
                })
            }
        }

        let response = self
            .client
            .put(url)
            .json(&index_mappings())
            .send()
            .await?;
        check_status(response).await?;

        info!("Elasticsearch index '{}' created", self.index);
        Ok(())
    }
}

#[async_trait]
impl SearchIndexer for ElasticsearchClient {
    async fn index(&self, id: Uuid, document: &JokeDocument) -> Result<(), SearchError> {
        let response = self
            .client
            .put(self.document_url(id)?)
            .json(document)
            .send()
            .await?;
        check_status(response).await?;

        debug!("Joke indexed in Elasticsearch: {}", id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), SearchError> {
        let response = self.client.delete(self.document_url(id)?).send().await?;
        check_status(response).await?;

        debug!("Joke deleted from Elasticsearch: {}", id);
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        let Ok(url) = self.url("_cluster/health") else {
            return false;
        };

        let health = match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => response.json::<ClusterHealth>().await,
            Ok(response) => {
                debug!("Elasticsearch health endpoint answered {}", response.status());
                return false;
            }
            Err(e) => {
                debug!("Elasticsearch health check failed: {}", e);
                return false;
            }
        };

        matches!(health, Ok(health) if health.status != "red")
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SearchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SearchError::Status { status, body })
}

fn index_mappings() -> serde_json::Value {
    json!({
        "mappings": {
            "properties": {
                "text": { "type": "text", "analyzer": "standard" },
                "source": { "type": "keyword" },
                "userId": { "type": "keyword" },
                "userName": { "type": "keyword" },
                "topics": { "type": "keyword" },
                "number": { "type": "integer" },
                "createdAt": { "type": "date" },
                "updatedAt": { "type": "date" }
            }
        }
    })
}

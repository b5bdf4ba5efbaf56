use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ExternalApiConfig;

/// The external joke providers the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExternalSource {
    /// api.chucknorris.io, responds with `{id, value, url}`.
    Chuck,
    /// icanhazdadjoke.com, responds with `{id, joke}`.
    Dad,
}

impl ExternalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalSource::Chuck => "Chuck",
            ExternalSource::Dad => "Dad",
        }
    }
}

impl fmt::Display for ExternalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExternalSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Chuck" => Ok(ExternalSource::Chuck),
            "Dad" => Ok(ExternalSource::Dad),
            _ => Err("Invalid source. Allowed values: Chuck, Dad".to_string()),
        }
    }
}

/// A joke fetched from an external provider, normalized to one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalJoke {
    pub text: String,
    pub source: ExternalSource,
    pub id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch joke from {provider}: {reason}")]
    FetchFailed {
        provider: ExternalSource,
        reason: String,
    },
}

impl FetchError {
    pub fn failed(provider: ExternalSource, reason: impl fmt::Display) -> Self {
        FetchError::FetchFailed {
            provider,
            reason: reason.to_string(),
        }
    }
}

/// Fetches one joke per call. No retries; callers decide what a failure means.
#[async_trait]
pub trait JokeFetcher: Send + Sync {
    async fn fetch(&self, source: ExternalSource) -> Result<ExternalJoke, FetchError>;
}

#[derive(Debug, Deserialize)]
struct ChuckNorrisResponse {
    id: Option<String>,
    value: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DadJokeResponse {
    id: Option<String>,
    joke: String,
}

impl From<ChuckNorrisResponse> for ExternalJoke {
    fn from(response: ChuckNorrisResponse) -> Self {
        ExternalJoke {
            text: response.value,
            source: ExternalSource::Chuck,
            id: response.id,
            url: response.url,
        }
    }
}

impl From<DadJokeResponse> for ExternalJoke {
    fn from(response: DadJokeResponse) -> Self {
        ExternalJoke {
            text: response.joke,
            source: ExternalSource::Dad,
            id: response.id,
            url: None,
        }
    }
}

/// `JokeFetcher` over HTTPS against the two public joke APIs.
#[derive(Clone)]
pub struct HttpJokeClient {
    client: Client,
    chuck_norris_url: Url,
    dad_joke_url: Url,
}

impl HttpJokeClient {
    pub fn new(config: &ExternalApiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpJokeClient {
            client,
            chuck_norris_url: config.chuck_norris_url.clone(),
            dad_joke_url: config.dad_joke_url.clone(),
        })
    }

    fn endpoint(&self, source: ExternalSource) -> Result<Url, FetchError> {
        match source {
            ExternalSource::Chuck => chuck_random_endpoint(&self.chuck_norris_url)
                .map_err(|e| FetchError::failed(source, e)),
            ExternalSource::Dad => Ok(self.dad_joke_url.clone()),
        }
    }
}

#[async_trait]
impl JokeFetcher for HttpJokeClient {
    async fn fetch(&self, source: ExternalSource) -> Result<ExternalJoke, FetchError> {
        let url = self.endpoint(source)?;
        debug!(%source, %url, "Fetching external joke");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::failed(source, e))?
            .error_for_status()
            .map_err(|e| FetchError::failed(source, e))?;

        let joke = match source {
            ExternalSource::Chuck => response
                .json::<ChuckNorrisResponse>()
                .await
                .map(ExternalJoke::from),
            ExternalSource::Dad => response
                .json::<DadJokeResponse>()
                .await
                .map(ExternalJoke::from),
        }
        .map_err(|e| FetchError::failed(source, e))?;

        Ok(joke)
    }
}

/// `{base}/jokes/random`, tolerating a trailing slash on the base.
fn chuck_random_endpoint(base: &Url) -> Result<Url, String> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("jokes/random").map_err(|e| e.to_string())
}

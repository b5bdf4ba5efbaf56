// Outbound clients: external joke providers and the search index

pub mod jokes_api;
pub mod search;

pub use jokes_api::{ExternalJoke, ExternalSource, FetchError, HttpJokeClient, JokeFetcher};
pub use search::{ElasticsearchClient, JokeDocument, SearchError, SearchIndexer};

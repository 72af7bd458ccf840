// src/ingest/types.rs
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Candidate news item as normalized by a fetcher. Discarded after enrichment.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub url: String,
    pub source_name: String, // e.g., "CoinTelegraph", "Binance"
    pub published_at: Option<DateTime<Utc>>,
}

/// Soft upstream failure. Always means "this source is unavailable right now".
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Parse(String),
    #[error("no usable items in response")]
    Empty,
    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),
}

/// One upstream news source. `Ok` always carries at least one item.
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, timeout: Duration) -> Result<Vec<RawItem>, FetchError>;
    fn name(&self) -> &'static str;
}

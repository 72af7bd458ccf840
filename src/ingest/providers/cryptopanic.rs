// src/ingest/providers/cryptopanic.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::normalize_text;
use crate::ingest::providers::get_text;
use crate::ingest::types::{FetchError, RawItem, SourceFetcher};
use crate::ingest::urls::{is_valid_url, source_name_from_url};

pub const DEFAULT_BASE_URL: &str = "https://cryptopanic.com/api/developer/v2";

/// Only the head of the feed is considered.
const MAX_POSTS: usize = 8;

#[derive(Debug, Deserialize)]
struct PostsResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: Option<String>,
    url: Option<String>,
    original_url: Option<String>,
    source: Option<PostSource>,
    published_at: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostSource {
    title: Option<String>,
}

/// Primary news API (CryptoPanic posts endpoint).
pub struct CryptoPanicFetcher {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    currencies: String,
}

impl CryptoPanicFetcher {
    pub fn new(client: reqwest::Client, api_key: Option<String>, symbols: &[String]) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            currencies: symbols.join(","),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Parse a posts response. Malformed or invalid posts are skipped;
    /// an unparseable body or an empty result is a failure.
    pub fn parse_posts(body: &str) -> Result<Vec<RawItem>, FetchError> {
        let resp: PostsResponse =
            serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

        let mut out = Vec::new();
        for value in resp.results.into_iter().take(MAX_POSTS) {
            let post: Post = match serde_json::from_value(value) {
                Ok(p) => p,
                Err(e) => {
                    tracing::debug!(target: "ingest", error = %e, "skipping malformed post");
                    continue;
                }
            };
            let title = normalize_text(post.title.as_deref().unwrap_or_default());
            let url = post
                .url
                .or(post.original_url)
                .unwrap_or_default()
                .trim()
                .to_string();
            if title.is_empty() || !is_valid_url(&url) {
                continue;
            }
            let source_name = post
                .source
                .and_then(|s| s.title)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| source_name_from_url(&url));
            let published_at = post
                .published_at
                .or(post.created_at)
                .as_deref()
                .and_then(parse_rfc3339);

            out.push(RawItem {
                title,
                url,
                source_name,
                published_at,
            });
        }

        if out.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(out)
    }
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl SourceFetcher for CryptoPanicFetcher {
    async fn fetch(&self, timeout: Duration) -> Result<Vec<RawItem>, FetchError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(FetchError::MissingCredentials("CRYPTOPANIC_API_KEY"));
        };
        let req = self
            .client
            .get(format!("{}/posts/", self.base_url))
            .query(&[
                ("auth_token", key),
                ("public", "true"),
                ("kind", "news"),
                ("currencies", self.currencies.as_str()),
                ("regions", "en"),
                ("page", "1"),
            ]);
        let body = get_text(req, timeout).await?;
        Self::parse_posts(&body)
    }

    fn name(&self) -> &'static str {
        "CryptoPanic"
    }
}

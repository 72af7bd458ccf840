// src/ingest/providers/rss_aggregate.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::normalize_text;
use crate::ingest::providers::get_text;
use crate::ingest::types::{FetchError, RawItem, SourceFetcher};
use crate::ingest::urls::{is_valid_url, source_name_from_url};

const PER_FEED: usize = 5;
const MAX_ITEMS: usize = 6;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| DateTime::from_timestamp(dt.unix_timestamp(), 0))
}

/// Several publisher RSS feeds merged into one batch.
pub struct RssAggregateFetcher {
    client: reqwest::Client,
    feeds: Vec<String>,
    pause: Duration,
}

impl RssAggregateFetcher {
    pub fn new(client: reqwest::Client, feeds: Vec<String>, pause: Duration) -> Self {
        Self {
            client,
            feeds,
            pause,
        }
    }

    /// Parse one RSS document into at most `PER_FEED` valid items.
    pub fn parse_feed(xml: &str) -> Result<Vec<RawItem>, FetchError> {
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&xml_clean).map_err(|e| FetchError::Parse(e.to_string()))?;

        let mut out = Vec::with_capacity(PER_FEED);
        for it in rss.channel.item.into_iter().take(PER_FEED) {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            let url = it.link.unwrap_or_default().trim().to_string();
            if title.is_empty() || !is_valid_url(&url) {
                continue;
            }
            out.push(RawItem {
                source_name: source_name_from_url(&url),
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822),
                title,
                url,
            });
        }
        Ok(out)
    }

    async fn fetch_feed(&self, url: &str, timeout: Duration) -> Result<Vec<RawItem>, FetchError> {
        let body = get_text(self.client.get(url), timeout).await?;
        Self::parse_feed(&body)
    }
}

#[async_trait]
impl SourceFetcher for RssAggregateFetcher {
    async fn fetch(&self, timeout: Duration) -> Result<Vec<RawItem>, FetchError> {
        let mut all = Vec::new();

        for (i, feed) in self.feeds.iter().enumerate() {
            if i > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            match self.fetch_feed(feed, timeout).await {
                Ok(mut items) => {
                    tracing::info!(
                        target: "ingest",
                        feed = %feed,
                        items = items.len(),
                        "rss feed scanned"
                    );
                    all.append(&mut items);
                }
                Err(e) => {
                    counter!("ingest_provider_errors_total").increment(1);
                    tracing::warn!(target: "ingest", feed = %feed, error = %e, "rss feed failed");
                }
            }
        }

        all.truncate(MAX_ITEMS);
        if all.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(all)
    }

    fn name(&self) -> &'static str {
        "RSS"
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

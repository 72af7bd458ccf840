// src/ingest/mod.rs
pub mod market;
pub mod providers;
pub mod rate_limit;
pub mod types;
pub mod urls;

use crate::ingest::rate_limit::RateLimiter;
use crate::ingest::types::{RawItem, SourceFetcher};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::time::Duration;

const TITLE_MAX_CHARS: usize = 300;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_items_total", "Raw items parsed from fetchers.");
        describe_counter!(
            "ingest_filtered_total",
            "Items dropped for an empty title or a disallowed URL."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Fetcher failures (transport, status, parse, empty)."
        );
        describe_histogram!("ingest_fetch_ms", "Fetcher round-trip time in milliseconds.");
        describe_counter!("pipeline_runs_total", "get_analyses invocations.");
        describe_counter!(
            "pipeline_cache_hits_total",
            "Runs served from the fresh response cache."
        );
        describe_counter!(
            "pipeline_dedup_total",
            "Records removed because their fingerprint was already seen."
        );
        describe_counter!(
            "pipeline_fallback_total",
            "Runs that produced no real record and used the fallback supplier."
        );
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
        describe_counter!("scheduler_news_ticks_total", "Scheduled news cycles run.");
        describe_counter!("notify_sent_total", "Messages accepted by the notifier.");
        describe_counter!("notify_failed_total", "Messages the notifier failed to deliver.");
    });
}

/// Normalize a headline: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > TITLE_MAX_CHARS {
        out = out.chars().take(TITLE_MAX_CHARS).collect();
    }
    out
}

/// True iff the item may be promoted to an analysis record.
pub fn is_valid_item(item: &RawItem) -> bool {
    !item.title.trim().is_empty() && urls::is_valid_url(&item.url)
}

/// Drop items with an empty title or a disallowed URL.
/// Returns (kept, dropped_count).
pub fn retain_valid(items: Vec<RawItem>) -> (Vec<RawItem>, usize) {
    let total = items.len();
    let kept: Vec<RawItem> = items
        .into_iter()
        .filter(|it| {
            let ok = is_valid_item(it);
            if !ok {
                tracing::debug!(target: "ingest", url = %it.url, "dropping invalid item");
            }
            ok
        })
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

/// Result of walking the fetcher chain.
#[derive(Debug)]
pub struct FetchOutcome {
    pub source: &'static str,
    pub items: Vec<RawItem>,
}

/// Try fetchers in priority order; the first one that yields at least one item
/// wins and lower-priority fetchers are not called. Every attempt goes through
/// the rate limiter. Failures are logged and counted, never propagated.
pub async fn fetch_first_available(
    fetchers: &[Box<dyn SourceFetcher>],
    limiter: &mut RateLimiter,
    timeout: Duration,
) -> Option<FetchOutcome> {
    ensure_metrics_described();

    for f in fetchers {
        limiter.acquire().await;

        let t0 = std::time::Instant::now();
        let res = f.fetch(timeout).await;
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match res {
            Ok(items) if !items.is_empty() => {
                counter!("ingest_items_total").increment(items.len() as u64);
                tracing::info!(
                    target: "ingest",
                    provider = f.name(),
                    items = items.len(),
                    "fetcher succeeded"
                );
                return Some(FetchOutcome {
                    source: f.name(),
                    items,
                });
            }
            Ok(_) => {
                counter!("ingest_provider_errors_total").increment(1);
                tracing::warn!(target: "ingest", provider = f.name(), "fetcher returned no items");
            }
            Err(e) => {
                counter!("ingest_provider_errors_total").increment(1);
                tracing::warn!(target: "ingest", provider = f.name(), error = %e, "fetcher failed");
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, url: &str) -> RawItem {
        RawItem {
            title: title.into(),
            url: url.into(),
            source_name: "Test".into(),
            published_at: None,
        }
    }

    #[test]
    fn normalize_text_decodes_and_collapses() {
        let s = "  <b>Bitcoin&nbsp;&nbsp;rallies</b> &ldquo;again&rdquo;  ";
        assert_eq!(normalize_text(s), r#"Bitcoin rallies "again""#);
    }

    #[test]
    fn normalize_text_keeps_question_marks() {
        assert_eq!(normalize_text("Is ETH next?"), "Is ETH next?");
    }

    #[test]
    fn retain_valid_drops_bad_titles_and_urls() {
        let items = vec![
            item("Solana upgrade ships", "https://decrypt.co/1"),
            item("", "https://decrypt.co/2"),
            item("   ", "https://decrypt.co/3"),
            item("Off-list", "https://example.com/4"),
            item("Root", "https://cryptopanic.com/"),
        ];
        let (kept, dropped) = retain_valid(items);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 4);
        assert_eq!(kept[0].title, "Solana upgrade ships");
    }
}

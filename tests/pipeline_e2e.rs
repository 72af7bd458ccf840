// tests/pipeline_e2e.rs
//
// End-to-end pipeline behavior with scripted fetchers and a paused clock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use crypto_news_pipeline::config::TrackedCoin;
use crypto_news_pipeline::ingest::market::{CoinQuote, MarketDataProvider, MarketSnapshot};
use crypto_news_pipeline::ingest::rate_limit::RateLimitPolicy;
use crypto_news_pipeline::ingest::types::{FetchError, RawItem, SourceFetcher};
use crypto_news_pipeline::{Pipeline, PipelineConfig, Sentiment, TradingSignal};
use tokio::time::Instant;

/// Pops scripted responses; an empty script means "upstream down".
#[derive(Clone)]
struct Scripted {
    name: &'static str,
    script: Arc<Mutex<VecDeque<Vec<RawItem>>>>,
    calls: Arc<AtomicUsize>,
}

impl Default for Scripted {
    fn default() -> Self {
        Self::named("scripted")
    }
}

impl Scripted {
    fn named(name: &'static str) -> Self {
        Self {
            name,
            script: Arc::default(),
            calls: Arc::default(),
        }
    }
    fn push(&self, items: Vec<RawItem>) {
        self.script.lock().unwrap().push_back(items);
    }
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for Scripted {
    async fn fetch(&self, _timeout: Duration) -> Result<Vec<RawItem>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(items) if !items.is_empty() => Ok(items),
            Some(_) => Err(FetchError::Empty),
            None => Err(FetchError::Status(503)),
        }
    }
    fn name(&self) -> &'static str {
        self.name
    }
}

/// Serves one BTC quote per refresh, moving the price each time.
#[derive(Clone, Default)]
struct MovingMarket {
    refreshes: Arc<AtomicUsize>,
}

#[async_trait]
impl MarketDataProvider for MovingMarket {
    async fn snapshot(
        &self,
        _coins: &[TrackedCoin],
        _timeout: Duration,
    ) -> Result<MarketSnapshot, FetchError> {
        let n = self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(MarketSnapshot::new().with_quote(
            "BTC",
            CoinQuote {
                price: 64_000.0 + 10.0 * n as f64,
                change_24h_pct: 4.0 - 0.25 * n as f64,
                volume_24h: 31_000_000_000.0,
            },
        ))
    }
    fn name(&self) -> &'static str {
        "moving-market"
    }
}

fn item(title: &str, url: &str) -> RawItem {
    RawItem {
        title: title.into(),
        url: url.into(),
        source_name: "CoinDesk".into(),
        published_at: None,
    }
}

fn etf_item() -> RawItem {
    item(
        "Bitcoin ETF approval news",
        "https://www.coindesk.com/markets/btc-etf",
    )
}

const HALF_HOUR: Duration = Duration::from_secs(30 * 60);

#[tokio::test(start_paused = true)]
async fn first_two_fetchers_fail_third_wins() {
    let a = Scripted::named("cryptopanic");
    let b = Scripted::named("rss");
    let c = Scripted::named("exchange");
    c.push(vec![RawItem {
        source_name: "Decrypt".into(),
        ..item("Bitcoin ETF approval news", "https://decrypt.co/news/btc-etf")
    }]);

    let p = Pipeline::builder(&PipelineConfig::default())
        .fetcher(a.clone())
        .fetcher(b.clone())
        .fetcher(c.clone())
        .seed(3)
        .build();

    let t0 = Instant::now();
    let out = p.get_analyses().await;

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].coin, "BTC");
    assert_eq!(out[0].sentiment, Sentiment::Positive);
    assert_eq!(out[0].importance, 4);
    assert_eq!(out[0].source_name, "Decrypt");
    assert_eq!(out[0].url, "https://decrypt.co/news/btc-etf");
    assert_eq!(p.cached().await, Some(out.clone()));
    assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 1));
    // three rate-limited calls: immediate, +10s, +10s
    assert_eq!(t0.elapsed(), Duration::from_secs(20));
    assert_eq!(p.upstream_calls().await, 3);
}

#[tokio::test(start_paused = true)]
async fn winner_stops_the_chain() {
    let a = Scripted::default();
    let b = Scripted::default();
    a.push(vec![etf_item()]);

    let p = Pipeline::builder(&PipelineConfig::default())
        .fetcher(a.clone())
        .fetcher(b.clone())
        .seed(3)
        .build();

    p.get_analyses().await;
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn fallback_synthetic_twice_then_cache() {
    let f = Scripted::default();
    f.push(vec![etf_item()]);

    let p = Pipeline::builder(&PipelineConfig::default())
        .fetcher(f.clone())
        .seed(9)
        .build();

    let real = p.get_analyses().await;
    assert_eq!(real[0].title, "₿ Bitcoin ETF Update");

    // let the cache go stale so every call hits the (now failing) fetcher
    tokio::time::advance(HALF_HOUR + Duration::from_secs(1)).await;

    for cycle in 1..=2 {
        let out = p.get_analyses().await;
        assert_eq!(out.len(), 1, "cycle {cycle}");
        assert_eq!(out[0].url, "https://cryptopanic.com/news/");
        assert_ne!(out[0].headline, real[0].headline);
    }
    for _ in 3..=4 {
        let out = p.get_analyses().await;
        assert_eq!(out, real);
    }
    assert_eq!(p.fallback_cycles().await, 4);

    // a real record resets the counter
    f.push(vec![item(
        "Solana validators ship an upgrade",
        "https://decrypt.co/news/sol-upgrade",
    )]);
    let out = p.get_analyses().await;
    assert_eq!(out[0].coin, "SOL");
    assert_eq!(p.fallback_cycles().await, 0);
}

#[tokio::test(start_paused = true)]
async fn cache_boundary_is_exclusive() {
    let f = Scripted::default();
    f.push(vec![etf_item()]);
    f.push(vec![item(
        "Ethereum staking hits new milestone",
        "https://decrypt.co/news/eth-staking",
    )]);

    let p = Pipeline::builder(&PipelineConfig::default())
        .fetcher(f.clone())
        .seed(1)
        .build();

    let first = p.get_analyses().await;
    assert_eq!(f.calls(), 1);

    tokio::time::advance(HALF_HOUR - Duration::from_secs(1)).await;
    assert_eq!(p.get_analyses().await, first);
    assert_eq!(f.calls(), 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    let second = p.get_analyses().await;
    assert_eq!(f.calls(), 2);
    assert_eq!(second[0].coin, "ETH");
}

#[tokio::test(start_paused = true)]
async fn repeated_story_is_deduplicated() {
    let f = Scripted::default();
    f.push(vec![etf_item()]);
    f.push(vec![etf_item()]);

    let p = Pipeline::builder(&PipelineConfig::default())
        .fetcher(f.clone())
        .seed(5)
        .build();

    let first = p.get_analyses().await;
    tokio::time::advance(HALF_HOUR).await;
    let second = p.get_analyses().await;

    assert_eq!(f.calls(), 2);
    assert_ne!(second[0].title, first[0].title);
    assert_eq!(p.fallback_cycles().await, 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_are_serialized() {
    let f = Scripted::default();
    f.push(vec![etf_item()]);

    let p = Arc::new(
        Pipeline::builder(&PipelineConfig::default())
            .fetcher(f.clone())
            .seed(2)
            .build(),
    );

    let (x, y) = tokio::join!(p.get_analyses(), p.get_analyses());
    assert_eq!(x, y);
    assert_eq!(f.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn max_results_caps_output_but_cache_keeps_batch() {
    let f = Scripted::default();
    f.push(vec![
        etf_item(),
        item("Ethereum gas falls", "https://decrypt.co/news/gas"),
        item("Solana DEX volume grows", "https://decrypt.co/news/dex"),
    ]);

    let p = Pipeline::builder(&PipelineConfig {
        max_results_per_call: 2,
        ..Default::default()
    })
    .fetcher(f.clone())
    .seed(4)
    .build();

    let out = p.get_analyses().await;
    assert_eq!(out.len(), 2);
    assert_eq!(p.cached().await.map(|c| c.len()), Some(3));
}

#[tokio::test(start_paused = true)]
async fn repeated_story_is_deduplicated_while_the_market_moves() {
    let f = Scripted::default();
    f.push(vec![etf_item()]);
    f.push(vec![etf_item()]);
    let market = MovingMarket::default();

    let p = Pipeline::builder(&PipelineConfig::default())
        .fetcher(f.clone())
        .market_provider(market.clone())
        .rate_limit(RateLimitPolicy {
            min_interval: Duration::ZERO,
            cooldown_every: 0,
            cooldown: Duration::ZERO,
        })
        .seed(6)
        .build();

    let first = p.get_analyses().await;
    assert_eq!(first[0].signal, Some(TradingSignal::StrongBuy));
    assert!(first[0].commentary.contains("$64,000.00"));

    // both caches go stale, the quote is refreshed at a new price
    tokio::time::advance(HALF_HOUR + Duration::from_secs(60)).await;
    let second = p.get_analyses().await;

    assert_eq!(market.refreshes.load(Ordering::SeqCst), 2);
    assert_eq!(f.calls(), 2);
    assert_ne!(second[0].headline, first[0].headline);
    assert_eq!(second[0].url, "https://cryptopanic.com/news/");
    assert_eq!(p.fallback_cycles().await, 1);
}

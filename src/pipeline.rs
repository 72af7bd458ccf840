//! The aggregation pipeline: cache → rate-limited fetch chain → market refresh →
//! enrichment → dedup → fallback.
//!
//! All mutable state sits in one [`PipelineState`] behind a single async mutex
//! that is held for a whole `get_analyses` call, so concurrent callers are
//! serialized and never see a half-updated cache or fingerprint set.

use chrono::Utc;
use metrics::{counter, gauge};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::analyze::AnalysisEngine;
use crate::cache::{MarketCache, ResponseCache};
use crate::config::{PipelineConfig, TrackedCoin};
use crate::dedup::Deduplicator;
use crate::fallback::FallbackSupplier;
use crate::ingest::market::{CoinGeckoProvider, MarketDataProvider, MarketSnapshot};
use crate::ingest::providers::{
    http_client, CryptoPanicFetcher, ExchangeTickerFetcher, RssAggregateFetcher,
};
use crate::ingest::rate_limit::{RateLimitPolicy, RateLimiter};
use crate::ingest::types::{RawItem, SourceFetcher};
use crate::ingest::{ensure_metrics_described, fetch_first_available, retain_valid};
use crate::record::AnalysisRecord;

pub struct PipelineState {
    limiter: RateLimiter,
    cache: ResponseCache,
    market: MarketCache,
    dedup: Deduplicator,
    engine: AnalysisEngine,
    fallback: FallbackSupplier,
}

pub struct Pipeline {
    fetchers: Vec<Box<dyn SourceFetcher>>,
    market_provider: Option<Box<dyn MarketDataProvider>>,
    coins: Vec<TrackedCoin>,
    timeout: Duration,
    max_results: usize,
    state: Mutex<PipelineState>,
}

pub struct PipelineBuilder {
    config: PipelineConfig,
    fetchers: Vec<Box<dyn SourceFetcher>>,
    market_provider: Option<Box<dyn MarketDataProvider>>,
    rate_limit: Option<RateLimitPolicy>,
    seed: Option<u64>,
}

impl PipelineBuilder {
    /// Append a fetcher; call order is priority order.
    pub fn fetcher(mut self, f: impl SourceFetcher + 'static) -> Self {
        self.fetchers.push(Box::new(f));
        self
    }

    pub fn market_provider(mut self, p: impl MarketDataProvider + 'static) -> Self {
        self.market_provider = Some(Box::new(p));
        self
    }

    /// Override the configured spacing policy.
    pub fn rate_limit(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit = Some(policy);
        self
    }

    /// Seed every random choice (default templates, synthetic fallback).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Pipeline {
        let cfg = self.config;
        let policy = self
            .rate_limit
            .unwrap_or_else(|| RateLimitPolicy::from(cfg.rate_limit));
        let (engine, fallback) = match self.seed {
            Some(s) => (
                AnalysisEngine::with_seed(cfg.tracked_coins.clone(), s),
                FallbackSupplier::with_seed(cfg.max_results_per_call, s.wrapping_add(1)),
            ),
            None => (
                AnalysisEngine::new(cfg.tracked_coins.clone()),
                FallbackSupplier::new(cfg.max_results_per_call),
            ),
        };

        Pipeline {
            fetchers: self.fetchers,
            market_provider: self.market_provider,
            timeout: cfg.request_timeout(),
            max_results: cfg.max_results_per_call.max(1),
            state: Mutex::new(PipelineState {
                limiter: RateLimiter::new(policy),
                cache: ResponseCache::new(Duration::from_secs(cfg.news_ttl_secs)),
                market: MarketCache::new(Duration::from_secs(cfg.market_ttl_secs)),
                dedup: Deduplicator::new(cfg.dedup_bound),
                engine,
                fallback,
            }),
            coins: cfg.tracked_coins,
        }
    }
}

impl Pipeline {
    pub fn builder(config: &PipelineConfig) -> PipelineBuilder {
        PipelineBuilder {
            config: config.clone(),
            fetchers: Vec::new(),
            market_provider: None,
            rate_limit: None,
            seed: None,
        }
    }

    /// Production wiring: CryptoPanic → RSS → Binance movers, CoinGecko quotes.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let client = http_client();
        let symbols: Vec<String> = config
            .tracked_coins
            .iter()
            .map(|c| c.symbol.clone())
            .collect();

        Self::builder(config)
            .fetcher(CryptoPanicFetcher::new(
                client.clone(),
                config.cryptopanic_api_key.clone(),
                &symbols,
            ))
            .fetcher(RssAggregateFetcher::new(
                client.clone(),
                config.rss_feeds.clone(),
                Duration::from_millis(config.rss_pause_ms),
            ))
            .fetcher(ExchangeTickerFetcher::new(
                client.clone(),
                config.tracked_coins.clone(),
            ))
            .market_provider(CoinGeckoProvider::new(client))
            .build()
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Ready-to-publish records. Never fails and never returns an empty vector.
    pub async fn get_analyses(&self) -> Vec<AnalysisRecord> {
        ensure_metrics_described();
        counter!("pipeline_runs_total").increment(1);
        gauge!("pipeline_last_run_ts").set(Utc::now().timestamp() as f64);

        let mut guard = self.state.lock().await;
        let st = &mut *guard;

        if st.cache.should_use_cache() {
            if let Some(items) = st.cache.get().filter(|v| !v.is_empty()) {
                counter!("pipeline_cache_hits_total").increment(1);
                tracing::info!(target: "pipeline", items = items.len(), "serving fresh cache");
                return items.iter().take(self.max_results).cloned().collect();
            }
        }

        let records = match fetch_first_available(&self.fetchers, &mut st.limiter, self.timeout)
            .await
        {
            Some(outcome) => {
                self.refresh_market(&mut st.limiter, &mut st.market).await;
                let snapshot = st.market.get();
                let records = enrich(outcome.items, snapshot, &mut st.engine, &mut st.dedup);
                tracing::info!(
                    target: "pipeline",
                    source = outcome.source,
                    kept = records.len(),
                    "batch enriched"
                );
                records
            }
            None => {
                tracing::warn!(target: "pipeline", "all fetchers failed");
                Vec::new()
            }
        };

        if records.is_empty() {
            counter!("pipeline_fallback_total").increment(1);
            return st.fallback.supply(&st.cache);
        }

        st.fallback.reset();
        let out: Vec<AnalysisRecord> = records.iter().take(self.max_results).cloned().collect();
        st.cache.set(records);
        out
    }

    /// Refresh the market snapshot when stale. Failures keep the old one.
    async fn refresh_market(&self, limiter: &mut RateLimiter, cache: &mut MarketCache) {
        let Some(provider) = self.market_provider.as_deref() else {
            return;
        };
        if cache.should_use_cache() {
            return;
        }
        limiter.acquire().await;
        match provider.snapshot(&self.coins, self.timeout).await {
            Ok(snap) => {
                tracing::info!(
                    target: "pipeline",
                    provider = provider.name(),
                    quotes = snap.len(),
                    "market snapshot refreshed"
                );
                cache.set(snap);
            }
            Err(e) => {
                counter!("ingest_provider_errors_total").increment(1);
                tracing::warn!(
                    target: "pipeline",
                    provider = provider.name(),
                    error = %e,
                    stale = cache.get().is_some(),
                    "market refresh failed"
                );
            }
        }
    }

    /// Copy of the cached batch, fresh or stale.
    pub async fn cached(&self) -> Option<Vec<AnalysisRecord>> {
        self.state.lock().await.cache.get().cloned()
    }

    pub async fn fallback_cycles(&self) -> u32 {
        self.state.lock().await.fallback.empty_cycles()
    }

    pub async fn upstream_calls(&self) -> u64 {
        self.state.lock().await.limiter.calls()
    }
}

fn enrich(
    items: Vec<RawItem>,
    snapshot: Option<&MarketSnapshot>,
    engine: &mut AnalysisEngine,
    dedup: &mut Deduplicator,
) -> Vec<AnalysisRecord> {
    let (valid, dropped) = retain_valid(items);
    if dropped > 0 {
        counter!("ingest_filtered_total").increment(dropped as u64);
    }

    let mut out = Vec::with_capacity(valid.len());
    let mut duplicates = 0u64;
    for raw in &valid {
        let rec = engine.analyze(raw, snapshot);
        if dedup.is_new(&rec) {
            out.push(rec);
        } else {
            duplicates += 1;
        }
    }
    if duplicates > 0 {
        counter!("pipeline_dedup_total").increment(duplicates);
        tracing::debug!(target: "pipeline", duplicates, "duplicates removed");
    }
    out
}

//! Content for cycles that produced no real record.
//!
//! The first two empty cycles in a row get a freshly stamped synthetic analysis;
//! from the third on, the last cached batch is replayed (stale allowed). The
//! counter is reset by the pipeline as soon as a cycle yields real records.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::cache::ResponseCache;
use crate::record::{AnalysisRecord, MarketImpact, Sentiment};

/// Synthetic cycles before the cache is replayed.
pub const SYNTHETIC_CYCLES: u32 = 2;

const FALLBACK_URL: &str = "https://cryptopanic.com/news/";

struct Synthetic {
    coin: &'static str,
    title: &'static str,
    source: &'static str,
    commentary: &'static str,
    advice: &'static str,
}

static CURATED: &[Synthetic] = &[
    Synthetic {
        coin: "BTC",
        title: "₿ Bitcoin Market Intelligence",
        source: "Quantum Analytics",
        commentary: "Bitcoin market analysis in progress. Technical levels and institutional flows being monitored for trading signals.",
        advice: "Monitor key support levels. Consider DCA strategy during volatility.",
    },
    Synthetic {
        coin: "ETH",
        title: "🔷 Ethereum Network Update",
        source: "Market Intelligence",
        commentary: "Ethereum ecosystem developments and network upgrades being analyzed. DeFi and NFT sectors showing dynamic activity.",
        advice: "Watch for Layer-2 adoption metrics and gas fee trends.",
    },
];

pub struct FallbackSupplier {
    empty_cycles: u32,
    max_results: usize,
    rng: StdRng,
}

impl FallbackSupplier {
    pub fn new(max_results: usize) -> Self {
        Self::from_rng(max_results, StdRng::from_os_rng())
    }

    pub fn with_seed(max_results: usize, seed: u64) -> Self {
        Self::from_rng(max_results, StdRng::seed_from_u64(seed))
    }

    fn from_rng(max_results: usize, rng: StdRng) -> Self {
        Self {
            empty_cycles: 0,
            max_results: max_results.max(1),
            rng,
        }
    }

    pub fn empty_cycles(&self) -> u32 {
        self.empty_cycles
    }

    pub fn reset(&mut self) {
        self.empty_cycles = 0;
    }

    /// Never returns an empty vector.
    pub fn supply(&mut self, cache: &ResponseCache) -> Vec<AnalysisRecord> {
        self.empty_cycles = self.empty_cycles.saturating_add(1);

        if self.empty_cycles > SYNTHETIC_CYCLES {
            if let Some(cached) = cache.get().filter(|items| !items.is_empty()) {
                tracing::info!(
                    target: "pipeline",
                    cycle = self.empty_cycles,
                    "fallback replaying cached batch"
                );
                return cached.iter().take(self.max_results).cloned().collect();
            }
        }

        tracing::info!(
            target: "pipeline",
            cycle = self.empty_cycles,
            "fallback using synthetic content"
        );
        vec![self.synthetic()]
    }

    fn synthetic(&mut self) -> AnalysisRecord {
        let s = CURATED.choose(&mut self.rng).unwrap_or(&CURATED[0]);
        AnalysisRecord {
            title: s.title.to_string(),
            headline: s.title.to_string(),
            url: FALLBACK_URL.to_string(),
            source_name: s.source.to_string(),
            coin: s.coin.to_string(),
            sentiment: Sentiment::Neutral,
            importance: 3,
            market_impact: MarketImpact::High,
            commentary: s.commentary.to_string(),
            trading_advice: s.advice.to_string(),
            signal: None,
            created_at: Utc::now(),
        }
    }
}

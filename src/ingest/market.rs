//! Live market data: per-coin price / 24h change / volume.
//!
//! The snapshot is read-only for the analysis engine and refreshed by the
//! pipeline through its own TTL cache.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::TrackedCoin;
use crate::ingest::providers::get_text;
use crate::ingest::types::FetchError;

pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoinQuote {
    pub price: f64,
    pub change_24h_pct: f64,
    pub volume_24h: f64,
}

/// Latest quotes keyed by upper-case coin symbol ("BTC").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    quotes: HashMap<String, CoinQuote>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str, quote: CoinQuote) {
        self.quotes.insert(symbol.to_ascii_uppercase(), quote);
    }

    pub fn with_quote(mut self, symbol: &str, quote: CoinQuote) -> Self {
        self.insert(symbol, quote);
        self
    }

    pub fn quote(&self, symbol: &str) -> Option<&CoinQuote> {
        self.quotes.get(&symbol.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

/// Source of market snapshots.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn snapshot(
        &self,
        coins: &[TrackedCoin],
        timeout: Duration,
    ) -> Result<MarketSnapshot, FetchError>;
    fn name(&self) -> &'static str;
}

/// CoinGecko `simple/price` endpoint.
pub struct CoinGeckoProvider {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: COINGECKO_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Parse `{"bitcoin": {"usd": .., "usd_24h_change": .., "usd_24h_vol": ..}}`.
    /// Coins without a numeric price are skipped; missing change/volume read as 0.
    pub fn parse_simple_price(
        body: &str,
        coins: &[TrackedCoin],
    ) -> Result<MarketSnapshot, FetchError> {
        let raw: HashMap<String, serde_json::Value> =
            serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

        let mut snap = MarketSnapshot::new();
        for coin in coins {
            let Some(entry) = raw.get(&coin.id) else {
                continue;
            };
            let Some(price) = entry.get("usd").and_then(|v| v.as_f64()) else {
                continue;
            };
            let num = |k: &str| entry.get(k).and_then(|v| v.as_f64()).unwrap_or(0.0);
            snap.insert(
                &coin.symbol,
                CoinQuote {
                    price,
                    change_24h_pct: num("usd_24h_change"),
                    volume_24h: num("usd_24h_vol"),
                },
            );
        }

        if snap.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(snap)
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    async fn snapshot(
        &self,
        coins: &[TrackedCoin],
        timeout: Duration,
    ) -> Result<MarketSnapshot, FetchError> {
        let ids = coins
            .iter()
            .map(|c| c.id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let req = self
            .client
            .get(format!("{}/simple/price", self.base_url))
            .query(&[
                ("ids", ids.as_str()),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
                ("include_24hr_vol", "true"),
            ]);
        let body = get_text(req, timeout).await?;
        Self::parse_simple_price(&body, coins)
    }

    fn name(&self) -> &'static str {
        "CoinGecko"
    }
}

/// "$64,210.55" for prices ≥ 1, "$0.1234" below.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return "$-".to_string();
    }
    if value.abs() < 1.0 {
        return format!("${value:.4}");
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac}")
}

/// "$31.2B" / "$850.0M" / "$12,345.00".
pub fn format_compact_usd(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("${:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("${:.1}M", value / 1e6)
    } else {
        format_usd(value)
    }
}

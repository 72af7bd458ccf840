// src/ingest/providers/exchange_ticker.rs
//! Turns large 24h exchange moves into headline items.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::TrackedCoin;
use crate::ingest::market::format_usd;
use crate::ingest::providers::get_text;
use crate::ingest::types::{FetchError, RawItem, SourceFetcher};

pub const BINANCE_BASE_URL: &str = "https://api.binance.com";

/// Minimum absolute 24h change (percent) that makes a headline.
pub const MOVER_THRESHOLD_PCT: f64 = 3.0;

const QUOTE_ASSET: &str = "USDT";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    symbol: String,
    price_change_percent: String,
    last_price: String,
}

/// Binance 24h ticker, filtered to the tracked coins' USDT pairs.
pub struct ExchangeTickerFetcher {
    client: reqwest::Client,
    base_url: String,
    coins: Vec<TrackedCoin>,
}

impl ExchangeTickerFetcher {
    pub fn new(client: reqwest::Client, coins: Vec<TrackedCoin>) -> Self {
        Self {
            client,
            base_url: BINANCE_BASE_URL.to_string(),
            coins,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Parse the ticker array into mover headlines, biggest move first.
    pub fn parse_movers(body: &str, coins: &[TrackedCoin]) -> Result<Vec<RawItem>, FetchError> {
        let rows: Vec<serde_json::Value> =
            serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

        let by_pair: HashMap<String, &TrackedCoin> = coins
            .iter()
            .map(|c| (format!("{}{}", c.symbol.to_ascii_uppercase(), QUOTE_ASSET), c))
            .collect();

        let mut movers: Vec<(f64, RawItem)> = Vec::new();
        for row in rows {
            let Ok(t) = serde_json::from_value::<Ticker>(row) else {
                continue;
            };
            let Some(coin) = by_pair.get(&t.symbol) else {
                continue;
            };
            let (Ok(change), Ok(price)) = (
                t.price_change_percent.trim().parse::<f64>(),
                t.last_price.trim().parse::<f64>(),
            ) else {
                continue;
            };
            if !change.is_finite() || change.abs() < MOVER_THRESHOLD_PCT {
                continue;
            }
            movers.push((change.abs(), mover_item(coin, change, price)));
        }

        movers.sort_by(|a, b| b.0.total_cmp(&a.0));
        let out: Vec<RawItem> = movers.into_iter().map(|(_, it)| it).collect();
        if out.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(out)
    }
}

fn mover_item(coin: &TrackedCoin, change: f64, price: f64) -> RawItem {
    let title = if change >= 0.0 {
        format!(
            "{} surges {:.1}% in 24 hours as price hits {}",
            coin.name,
            change,
            format_usd(price)
        )
    } else {
        format!(
            "{} drops {:.1}% in 24 hours to {}",
            coin.name,
            change.abs(),
            format_usd(price)
        )
    };
    RawItem {
        title,
        url: format!(
            "https://www.binance.com/en/trade/{}_{}",
            coin.symbol.to_ascii_uppercase(),
            QUOTE_ASSET
        ),
        source_name: "Binance".to_string(),
        published_at: Some(chrono::Utc::now()),
    }
}

#[async_trait]
impl SourceFetcher for ExchangeTickerFetcher {
    async fn fetch(&self, timeout: Duration) -> Result<Vec<RawItem>, FetchError> {
        let req = self
            .client
            .get(format!("{}/api/v3/ticker/24hr", self.base_url));
        let body = get_text(req, timeout).await?;
        Self::parse_movers(&body, &self.coins)
    }

    fn name(&self) -> &'static str {
        "Binance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::pipeline::default_tracked_coins;
    use crate::ingest::urls::is_valid_url;

    #[test]
    fn only_tracked_big_movers_sorted_by_magnitude() {
        let body = r#"[
            {"symbol": "BTCUSDT", "priceChangePercent": "4.10", "lastPrice": "64000.00"},
            {"symbol": "ETHUSDT", "priceChangePercent": "-7.30", "lastPrice": "2900.50"},
            {"symbol": "SOLUSDT", "priceChangePercent": "1.00", "lastPrice": "150.00"},
            {"symbol": "PEPEUSDT", "priceChangePercent": "40.0", "lastPrice": "0.00001"},
            {"symbol": "ADAUSDT", "priceChangePercent": "n/a", "lastPrice": "0.5"},
            {"symbol": 12}
        ]"#;
        let items = ExchangeTickerFetcher::parse_movers(body, &default_tracked_coins()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Ethereum drops 7.3% in 24 hours to $2,900.50");
        assert!(items[1].title.starts_with("Bitcoin surges 4.1%"));
        assert!(items.iter().all(|it| is_valid_url(&it.url)));
        assert_eq!(items[0].source_name, "Binance");
    }

    #[test]
    fn quiet_market_is_empty() {
        let body = r#"[{"symbol": "BTCUSDT", "priceChangePercent": "0.4", "lastPrice": "1"}]"#;
        assert!(matches!(
            ExchangeTickerFetcher::parse_movers(body, &default_tracked_coins()),
            Err(FetchError::Empty)
        ));
    }
}

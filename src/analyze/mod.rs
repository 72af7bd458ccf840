// src/analyze/mod.rs
//! Analysis engine: turns a validated `RawItem` into an `AnalysisRecord`.
//!
//! Market-driven scoring is the primary mode: when the snapshot carries a quote
//! for the detected coin (BTC stands in for GENERAL items), the 24h change and
//! headline polarity decide signal, sentiment, importance and impact. Without a
//! quote the keyword rule cascade in [`rules`] produces a fixed template.

pub mod polarity;
pub mod rules;
pub mod scoring;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::config::TrackedCoin;
use crate::ingest::market::{format_compact_usd, format_usd, CoinQuote, MarketSnapshot};
use crate::ingest::types::RawItem;
use crate::record::{AnalysisRecord, GENERAL_COIN};

pub use polarity::{polarity, TitleText};
pub use rules::{match_rule, Rule, Template};
pub use scoring::Trend;

/// Coin used as the market proxy for GENERAL headlines.
pub const BELLWETHER: &str = "BTC";

pub struct AnalysisEngine {
    coins: Vec<TrackedCoin>,
    rng: StdRng,
}

impl AnalysisEngine {
    pub fn new(coins: Vec<TrackedCoin>) -> Self {
        Self {
            coins,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic engine for tests and replays.
    pub fn with_seed(coins: Vec<TrackedCoin>, seed: u64) -> Self {
        Self {
            coins,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn analyze(&mut self, raw: &RawItem, snapshot: Option<&MarketSnapshot>) -> AnalysisRecord {
        let text = TitleText::new(&raw.title);
        let rule = match_rule(&text);

        if let Some(snap) = snapshot {
            if let Some(rec) = self.market_record(raw, &text, rule, snap) {
                return rec;
            }
        }
        self.keyword_record(raw, rule)
    }

    fn keyword_record(&mut self, raw: &RawItem, rule: Option<&'static Rule>) -> AnalysisRecord {
        let tpl = match rule {
            Some(r) => r.template,
            None => *rules::DEFAULT_TEMPLATES
                .choose(&mut self.rng)
                .unwrap_or(&rules::DEFAULT_TEMPLATES[0]),
        };
        tracing::debug!(
            target: "pipeline",
            rule = rule.map(|r| r.name).unwrap_or("default"),
            coin = tpl.coin,
            "keyword analysis"
        );
        AnalysisRecord {
            title: tpl.title.to_string(),
            headline: raw.title.clone(),
            url: raw.url.clone(),
            source_name: raw.source_name.clone(),
            coin: tpl.coin.to_string(),
            sentiment: tpl.sentiment,
            importance: tpl.importance,
            market_impact: tpl.impact,
            commentary: tpl.commentary.to_string(),
            trading_advice: tpl.advice.to_string(),
            signal: None,
            created_at: Utc::now(),
        }
    }

    fn market_record(
        &self,
        raw: &RawItem,
        text: &TitleText,
        rule: Option<&'static Rule>,
        snap: &MarketSnapshot,
    ) -> Option<AnalysisRecord> {
        let coin = match rule {
            Some(r) => r.template.coin.to_string(),
            None => self
                .detect_coin(&raw.title)
                .unwrap_or_else(|| GENERAL_COIN.to_string()),
        };
        let quote_symbol = if coin == GENERAL_COIN { BELLWETHER } else { coin.as_str() };
        let quote = snap.quote(quote_symbol)?;

        let change = quote.change_24h_pct;
        let trend = Trend::from_change(change);
        let tone = polarity(text);
        let regulatory = rules::is_regulatory(text);
        let signal = scoring::trading_signal(change, tone);

        // Title and the lead of the commentary feed the dedup fingerprint, so
        // neither may carry live quote values.
        let title = match rule {
            Some(r) => r.template.title.to_string(),
            None if coin == GENERAL_COIN => "📊 Crypto Market Update".to_string(),
            None => format!("📊 {} Market Update", self.coin_name(&coin)),
        };

        let mut commentary = match rule {
            Some(r) => r.template.commentary.to_string(),
            None => story_lead(&self.coin_name(quote_symbol), &raw.title),
        };
        commentary.push(' ');
        commentary.push_str(&self.market_commentary(&coin, quote_symbol, quote, trend));

        tracing::debug!(
            target: "pipeline",
            coin = %coin,
            change = change,
            signal = signal.label(),
            "market analysis"
        );

        Some(AnalysisRecord {
            title,
            headline: raw.title.clone(),
            url: raw.url.clone(),
            source_name: raw.source_name.clone(),
            coin,
            sentiment: scoring::sentiment_for(signal, tone, trend),
            importance: scoring::importance_for(trend, signal, regulatory),
            market_impact: scoring::impact_for(change, regulatory),
            commentary,
            trading_advice: scoring::advice_for(signal).to_string(),
            signal: Some(signal),
            created_at: Utc::now(),
        })
    }

    fn market_commentary(
        &self,
        coin: &str,
        quote_symbol: &str,
        quote: &CoinQuote,
        trend: Trend,
    ) -> String {
        let subject = if coin == GENERAL_COIN {
            format!("{} (market bellwether)", self.coin_name(quote_symbol))
        } else {
            self.coin_name(coin)
        };
        format!(
            "{subject} trades at {} ({:+.2}% in 24h, volume {}), a {}.",
            format_usd(quote.price),
            quote.change_24h_pct,
            format_compact_usd(quote.volume_24h),
            trend.describe()
        )
    }

    /// Tracked coin mentioned by upper-case symbol ("XRP") or by name.
    fn detect_coin(&self, title: &str) -> Option<String> {
        let text = TitleText::new(title);
        self.coins
            .iter()
            .find(|c| {
                title
                    .split(|ch: char| !ch.is_alphanumeric())
                    .any(|t| t == c.symbol)
                    || text.mentions(&c.name.to_lowercase())
            })
            .map(|c| c.symbol.clone())
    }

    fn coin_name(&self, symbol: &str) -> String {
        self.coins
            .iter()
            .find(|c| c.symbol.eq_ignore_ascii_case(symbol))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| symbol.to_string())
    }
}

/// Quote-free opening for headlines no rule covers. Always longer than the
/// fingerprinted commentary prefix.
fn story_lead(subject: &str, headline: &str) -> String {
    format!(
        "{subject} in focus: {}. Price action and volume for the last 24 hours follow, \
         measured across major spot venues.",
        headline.trim_end_matches(['.', '!', '?'])
    )
}

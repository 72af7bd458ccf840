//! The enriched analysis record handed to delivery and persistence.
//!
//! Everything the pipeline returns is an `AnalysisRecord`. Records are built once
//! by the analysis engine (or the fallback supplier) and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coin tag used when a headline is not about a specific tracked coin.
pub const GENERAL_COIN: &str = "GENERAL";

/// Headline tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse market significance tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketImpact {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl MarketImpact {
    /// Human label used in rendered messages ("VERY HIGH").
    pub fn label(&self) -> &'static str {
        match self {
            MarketImpact::Low => "LOW",
            MarketImpact::Medium => "MEDIUM",
            MarketImpact::High => "HIGH",
            MarketImpact::VeryHigh => "VERY HIGH",
        }
    }
}

impl fmt::Display for MarketImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Combined price/keyword signal produced by market-driven scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingSignal {
    StrongBuy,
    StrongSell,
    Neutral,
    Mixed,
}

impl TradingSignal {
    pub fn label(&self) -> &'static str {
        match self {
            TradingSignal::StrongBuy => "STRONG BUY",
            TradingSignal::StrongSell => "STRONG SELL",
            TradingSignal::Neutral => "NEUTRAL",
            TradingSignal::Mixed => "MIXED",
        }
    }
}

/// Enriched, ready-to-publish analysis of one news item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Analysis heading (e.g. "₿ Bitcoin ETF Update").
    pub title: String,
    /// Upstream news title the analysis was built from.
    pub headline: String,
    pub url: String,
    pub source_name: String,
    pub coin: String,
    pub sentiment: Sentiment,
    /// 1..=5
    pub importance: u8,
    pub market_impact: MarketImpact,
    pub commentary: String,
    pub trading_advice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<TradingSignal>,
    pub created_at: DateTime<Utc>,
}

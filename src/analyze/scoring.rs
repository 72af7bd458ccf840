//! Market-driven scoring: 24h change + headline polarity → signal, sentiment,
//! importance and impact.

use crate::record::{MarketImpact, Sentiment, TradingSignal};

/// Price trend derived from the 24h change (percent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    StrongUp,
    ModerateUp,
    Sideways,
    ModerateDown,
    StrongDown,
}

impl Trend {
    pub fn from_change(change_pct: f64) -> Self {
        if change_pct > 5.0 {
            Trend::StrongUp
        } else if change_pct > 2.0 {
            Trend::ModerateUp
        } else if change_pct < -5.0 {
            Trend::StrongDown
        } else if change_pct < -2.0 {
            Trend::ModerateDown
        } else {
            Trend::Sideways
        }
    }

    pub fn is_strong(self) -> bool {
        matches!(self, Trend::StrongUp | Trend::StrongDown)
    }

    pub fn direction(self) -> Sentiment {
        match self {
            Trend::StrongUp | Trend::ModerateUp => Sentiment::Positive,
            Trend::StrongDown | Trend::ModerateDown => Sentiment::Negative,
            Trend::Sideways => Sentiment::Neutral,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Trend::StrongUp => "strong uptrend",
            Trend::ModerateUp => "moderate uptrend",
            Trend::Sideways => "sideways range",
            Trend::ModerateDown => "moderate downtrend",
            Trend::StrongDown => "strong downtrend",
        }
    }
}

/// Priority table: strong buy, strong sell, flat, otherwise mixed.
pub fn trading_signal(change_pct: f64, polarity: Sentiment) -> TradingSignal {
    if change_pct > 3.0 && polarity == Sentiment::Positive {
        TradingSignal::StrongBuy
    } else if change_pct < -3.0 && polarity == Sentiment::Negative {
        TradingSignal::StrongSell
    } else if (-1.0..=1.0).contains(&change_pct) {
        TradingSignal::Neutral
    } else {
        TradingSignal::Mixed
    }
}

pub fn sentiment_for(signal: TradingSignal, polarity: Sentiment, trend: Trend) -> Sentiment {
    match signal {
        TradingSignal::StrongBuy => Sentiment::Positive,
        TradingSignal::StrongSell => Sentiment::Negative,
        _ if polarity != Sentiment::Neutral => polarity,
        _ => trend.direction(),
    }
}

pub fn importance_for(trend: Trend, signal: TradingSignal, regulatory: bool) -> u8 {
    if regulatory {
        return 5;
    }
    let mut score: i32 = 3;
    if trend.is_strong() {
        score += 1;
    }
    if matches!(signal, TradingSignal::StrongBuy | TradingSignal::StrongSell) {
        score += 1;
    }
    score.clamp(1, 5) as u8
}

pub fn impact_for(change_pct: f64, regulatory: bool) -> MarketImpact {
    let abs = change_pct.abs();
    let tier = if abs >= 10.0 {
        MarketImpact::VeryHigh
    } else if abs >= 5.0 {
        MarketImpact::High
    } else if abs >= 2.0 {
        MarketImpact::Medium
    } else {
        MarketImpact::Low
    };
    if regulatory {
        tier.max(MarketImpact::High)
    } else {
        tier
    }
}

pub fn advice_for(signal: TradingSignal) -> &'static str {
    match signal {
        TradingSignal::StrongBuy => {
            "Momentum and news flow agree. Scale in gradually with a stop-loss below the 24h low."
        }
        TradingSignal::StrongSell => {
            "Downside confirmed by the news flow. Reduce exposure or hedge until selling pressure fades."
        }
        TradingSignal::Neutral => {
            "Price is flat. Wait for a confirmed breakout before opening new positions."
        }
        TradingSignal::Mixed => {
            "Price action and headline disagree. Keep position sizes small until they align."
        }
    }
}

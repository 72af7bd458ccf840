//! Markdown rendering of an analysis record for the channel.

use crate::record::{AnalysisRecord, MarketImpact, Sentiment};

fn sentiment_badge(s: Sentiment) -> &'static str {
    match s {
        Sentiment::Positive => "🟢 BULLISH",
        Sentiment::Negative => "🔴 BEARISH",
        Sentiment::Neutral => "🟡 NEUTRAL",
    }
}

fn importance_emoji(importance: u8) -> &'static str {
    match importance {
        1 => "🔸",
        2 => "🟡",
        4 => "🚀",
        5 => "⚡",
        _ => "📊",
    }
}

pub fn coin_emoji(coin: &str) -> &'static str {
    match coin {
        "BTC" => "₿",
        "ETH" => "🔷",
        "SOL" => "🟣",
        "DOGE" => "🐕",
        "BNB" => "💠",
        "ADA" => "🌐",
        "XRP" => "✨",
        "DOT" => "🔵",
        "AVAX" => "❄️",
        "MATIC" => "🟪",
        "LTC" => "⚡",
        _ => "📊",
    }
}

fn impact_emoji(impact: MarketImpact) -> &'static str {
    match impact {
        MarketImpact::VeryHigh => "🚨",
        MarketImpact::High => "⚡",
        _ => "📊",
    }
}

/// Hashtag-safe source name ("The Block" → "TheBlock").
fn source_tag(source: &str) -> String {
    source.chars().filter(|c| c.is_alphanumeric()).collect()
}

pub fn format_message(rec: &AnalysisRecord) -> String {
    let signal_line = rec
        .signal
        .map(|s| format!("**📶 Signal:** `{}`\n", s.label()))
        .unwrap_or_default();

    format!(
        "**{imp} {coin_e} {title}**\n\n\
         _{headline}_\n\n\
         **{badge} Market Analysis:**\n{commentary}\n\n\
         **💡 Trading Advice:**\n{advice}\n\n\
         **{impact_e} Market Impact:** `{impact}`\n\
         **📊 Importance:** `{importance}/5`\n\
         **🎯 Sentiment:** `{sentiment}`\n\
         {signal_line}\
         **💰 Coin:** `{coin}`\n\n\
         **🔗 Source:** `{source}`\n\
         **⏰ Time:** `{time}`\n\n\
         [📖 Read Full Story]({url})\n\n\
         #CryptoAnalysis #{tag} #{coin}",
        imp = importance_emoji(rec.importance),
        coin_e = coin_emoji(&rec.coin),
        title = rec.title,
        headline = rec.headline,
        badge = sentiment_badge(rec.sentiment),
        commentary = rec.commentary,
        advice = rec.trading_advice,
        impact_e = impact_emoji(rec.market_impact),
        impact = rec.market_impact.label(),
        importance = rec.importance,
        sentiment = rec.sentiment.as_str().to_uppercase(),
        coin = rec.coin,
        source = rec.source_name,
        time = rec.created_at.format("%H:%M"),
        url = rec.url,
        tag = source_tag(&rec.source_name),
    )
}

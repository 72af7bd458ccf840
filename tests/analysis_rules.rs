// tests/analysis_rules.rs
//
// Hand-picked headlines through the public analysis engine, in both modes.

use crypto_news_pipeline::config::pipeline::default_tracked_coins;
use crypto_news_pipeline::ingest::market::{CoinQuote, MarketSnapshot};
use crypto_news_pipeline::ingest::types::RawItem;
use crypto_news_pipeline::{AnalysisEngine, MarketImpact, Sentiment, TradingSignal};

fn raw(title: &str) -> RawItem {
    RawItem {
        title: title.into(),
        url: "https://cointelegraph.com/news/x".into(),
        source_name: "CoinTelegraph".into(),
        published_at: None,
    }
}

fn engine() -> AnalysisEngine {
    AnalysisEngine::with_seed(default_tracked_coins(), 11)
}

#[test]
fn keyword_cascade_handpicked() {
    let cases: &[(&str, &str, Sentiment, u8, MarketImpact)] = &[
        ("Bitcoin ETF approval news", "BTC", Sentiment::Positive, 4, MarketImpact::High),
        ("Institutions pile into BTC", "BTC", Sentiment::Positive, 4, MarketImpact::High),
        ("Bitcoin hashrate at all-time high", "BTC", Sentiment::Neutral, 3, MarketImpact::High),
        ("Dogecoin rally continues", "DOGE", Sentiment::Positive, 3, MarketImpact::Medium),
        ("ETH devs schedule next fork", "ETH", Sentiment::Neutral, 3, MarketImpact::High),
        ("Solana outage postmortem", "SOL", Sentiment::Neutral, 3, MarketImpact::Medium),
        ("New crypto regulation bill", "GENERAL", Sentiment::Neutral, 5, MarketImpact::VeryHigh),
        ("DeFi lending TVL doubles", "GENERAL", Sentiment::Neutral, 3, MarketImpact::Medium),
        ("Metaverse land sales slow", "GENERAL", Sentiment::Neutral, 2, MarketImpact::Low),
    ];

    let mut e = engine();
    for (title, coin, sentiment, importance, impact) in cases {
        let rec = e.analyze(&raw(title), None);
        assert_eq!(rec.coin, *coin, "{title}");
        assert_eq!(rec.sentiment, *sentiment, "{title}");
        assert_eq!(rec.importance, *importance, "{title}");
        assert_eq!(rec.market_impact, *impact, "{title}");
        assert!(rec.signal.is_none());
    }
}

#[test]
fn market_scoring_overrides_templates_when_quoted() {
    let snap = MarketSnapshot::new()
        .with_quote(
            "DOGE",
            CoinQuote {
                price: 0.21,
                change_24h_pct: -11.0,
                volume_24h: 900_000_000.0,
            },
        )
        .with_quote(
            "BTC",
            CoinQuote {
                price: 63_720.1,
                change_24h_pct: 0.5,
                volume_24h: 31_200_000_000.0,
            },
        );

    let mut e = engine();

    // template says positive; the market and the headline say otherwise
    let rec = e.analyze(&raw("Dogecoin price dump deepens as whales sell"), Some(&snap));
    assert_eq!(rec.coin, "DOGE");
    assert_eq!(rec.signal, Some(TradingSignal::StrongSell));
    assert_eq!(rec.sentiment, Sentiment::Negative);
    assert_eq!(rec.importance, 5);
    assert_eq!(rec.market_impact, MarketImpact::VeryHigh);
    assert!(rec.commentary.contains("$0.2100"));
    assert!(rec.commentary.contains("$900.0M"));

    let rec = e.analyze(&raw("Bitcoin miners not bearish yet"), Some(&snap));
    assert_eq!(rec.signal, Some(TradingSignal::Neutral));
    // negated "bearish" counts as positive
    assert_eq!(rec.sentiment, Sentiment::Positive);
    assert_eq!(rec.market_impact, MarketImpact::Low);
}

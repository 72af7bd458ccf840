//! Ordered keyword rule table.
//!
//! Each rule is a conjunction of keyword groups (a group matches when ANY of its
//! keywords is mentioned) mapped to a fixed analysis template. The table is
//! walked top-down and the first matching rule wins, so more specific rules
//! (DOGE momentum, BTC ETF) sit above their broader siblings.

use super::polarity::TitleText;
use crate::record::{MarketImpact, Sentiment, GENERAL_COIN};

pub const DOGE: &[&str] = &["dogecoin", "doge"];
pub const MOMENTUM: &[&str] = &["price", "surge", "pump", "rally"];
pub const BTC: &[&str] = &["bitcoin", "btc"];
pub const INSTITUTIONAL: &[&str] = &["etf", "institution"];
pub const ETH: &[&str] = &["ethereum", "eth"];
pub const SOL: &[&str] = &["solana", "sol"];
pub const REGULATORY: &[&str] = &["regulation", "sec", "legal"];
pub const DEFI: &[&str] = &["defi", "decentralized finance"];
pub const NFT: &[&str] = &["nft", "metaverse"];

/// Fixed analysis attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Template {
    pub coin: &'static str,
    pub title: &'static str,
    pub importance: u8,
    pub sentiment: Sentiment,
    pub impact: MarketImpact,
    pub commentary: &'static str,
    pub advice: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub all_of: &'static [&'static [&'static str]],
    pub template: Template,
}

impl Rule {
    pub fn matches(&self, text: &TitleText) -> bool {
        self.all_of.iter().all(|group| text.mentions_any(group))
    }
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "doge_momentum",
        all_of: &[DOGE, MOMENTUM],
        template: Template {
            coin: "DOGE",
            title: "🐕 Dogecoin Price Analysis",
            importance: 3,
            sentiment: Sentiment::Positive,
            impact: MarketImpact::Medium,
            commentary: "DOGE showing momentum with technical indicators suggesting potential upside. Meme coin sector activity increasing.",
            advice: "Consider small position size. Set stop-loss at 5-7% for risk management.",
        },
    },
    Rule {
        name: "btc_institutional",
        all_of: &[BTC, INSTITUTIONAL],
        template: Template {
            coin: "BTC",
            title: "₿ Bitcoin ETF Update",
            importance: 4,
            sentiment: Sentiment::Positive,
            impact: MarketImpact::High,
            commentary: "Bitcoin ETF developments influencing institutional flows. Regulatory clarity improving adoption prospects.",
            advice: "Accumulate on market dips. Monitor ETF flow data weekly.",
        },
    },
    Rule {
        name: "btc",
        all_of: &[BTC],
        template: Template {
            coin: "BTC",
            title: "₿ Bitcoin Market Intelligence",
            importance: 3,
            sentiment: Sentiment::Neutral,
            impact: MarketImpact::High,
            commentary: "BTC testing key technical levels. Market sentiment balanced between institutional accumulation and retail interest.",
            advice: "Set buy orders below current levels. Watch for volume confirmation.",
        },
    },
    Rule {
        name: "eth",
        all_of: &[ETH],
        template: Template {
            coin: "ETH",
            title: "🔷 Ethereum Network Update",
            importance: 3,
            sentiment: Sentiment::Neutral,
            impact: MarketImpact::High,
            commentary: "Ethereum ecosystem evolving with Layer-2 adoption and protocol upgrades. DeFi activity supporting network value.",
            advice: "Accumulate for long-term growth. Monitor gas fee trends.",
        },
    },
    Rule {
        name: "sol",
        all_of: &[SOL],
        template: Template {
            coin: "SOL",
            title: "🟣 Solana Ecosystem",
            importance: 3,
            sentiment: Sentiment::Neutral,
            impact: MarketImpact::Medium,
            commentary: "Solana network performance and ecosystem growth being monitored. Developer activity showing positive trajectory.",
            advice: "Trade with careful position sizing. Watch network metrics.",
        },
    },
    Rule {
        name: "regulatory",
        all_of: &[REGULATORY],
        template: Template {
            coin: GENERAL_COIN,
            title: "⚖️ Regulatory Update",
            importance: 5,
            sentiment: Sentiment::Neutral,
            impact: MarketImpact::VeryHigh,
            commentary: "Regulatory developments impacting crypto market structure. Institutional adoption dependent on regulatory clarity.",
            advice: "Stay informed on regulatory news. Diversify across jurisdictions.",
        },
    },
    Rule {
        name: "defi",
        all_of: &[DEFI],
        template: Template {
            coin: GENERAL_COIN,
            title: "🔄 DeFi Ecosystem Analysis",
            importance: 3,
            sentiment: Sentiment::Neutral,
            impact: MarketImpact::Medium,
            commentary: "DeFi protocols show innovation in yield strategies and cross-chain interoperability. Security remains paramount with increasing TVL.",
            advice: "Diversify across established protocols. Monitor governance token developments.",
        },
    },
    Rule {
        name: "nft",
        all_of: &[NFT],
        template: Template {
            coin: GENERAL_COIN,
            title: "🖼️ Digital Assets & Metaverse",
            importance: 2,
            sentiment: Sentiment::Neutral,
            impact: MarketImpact::Low,
            commentary: "NFT market matures with focus on utility and intellectual property. Gaming and entertainment sectors drive adoption.",
            advice: "Focus on projects with strong communities and utility.",
        },
    },
];

/// Generic per-coin analyses used when no rule matches.
pub static DEFAULT_TEMPLATES: &[Template] = &[
    default_template(
        "BTC",
        "₿ Bitcoin Market Analysis",
        MarketImpact::High,
        "Market consolidation with institutional interest steady.",
    ),
    default_template(
        "ETH",
        "🔷 Ethereum Market Analysis",
        MarketImpact::High,
        "Network upgrades and Layer-2 adoption progressing.",
    ),
    default_template(
        "SOL",
        "🟣 Solana Market Analysis",
        MarketImpact::Medium,
        "Ecosystem growth and developer activity monitored.",
    ),
    default_template(
        "BNB",
        "💠 BNB Chain Market Analysis",
        MarketImpact::Medium,
        "Exchange token performance correlating with platform growth.",
    ),
    default_template(
        "ADA",
        "🌐 Cardano Market Analysis",
        MarketImpact::Medium,
        "Development activity and ecosystem expansion ongoing.",
    ),
];

const fn default_template(
    coin: &'static str,
    title: &'static str,
    impact: MarketImpact,
    commentary: &'static str,
) -> Template {
    Template {
        coin,
        title,
        importance: 3,
        sentiment: Sentiment::Neutral,
        impact,
        commentary,
        advice: "Monitor key technical levels for entry opportunities.",
    }
}

/// First matching rule, if any.
pub fn match_rule(text: &TitleText) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.matches(text))
}

pub fn is_regulatory(text: &TitleText) -> bool {
    text.mentions_any(REGULATORY)
}

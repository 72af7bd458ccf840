//! Headline tokenization and keyword polarity.

use crate::record::Sentiment;

const POSITIVE: &[&str] = &[
    "bullish", "surge", "rally", "pump", "growth", "positive", "approval", "approved", "adoption",
    "gain", "soar", "record", "breakout", "inflow", "upgrade",
];

const NEGATIVE: &[&str] = &[
    "bearish", "crash", "drop", "dump", "warning", "negative", "rejection", "rejected", "hack",
    "hacked", "plunge", "lawsuit", "ban", "outflow", "exploit",
];

/// Lower-cased title plus its alphanumeric tokens.
#[derive(Debug, Clone)]
pub struct TitleText {
    pub lower: String,
    pub tokens: Vec<String>,
}

impl TitleText {
    pub fn new(title: &str) -> Self {
        let lower = title.to_lowercase();
        let tokens = tokenize(&lower);
        Self { lower, tokens }
    }

    /// Single words match whole tokens (a trailing plural "s" is tolerated);
    /// phrases containing a space match as substrings.
    pub fn mentions(&self, keyword: &str) -> bool {
        if keyword.contains(' ') {
            return self.lower.contains(keyword);
        }
        self.tokens.iter().any(|t| token_is(t, keyword))
    }

    pub fn mentions_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.mentions(k))
    }
}

fn tokenize(s: &str) -> Vec<String> {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn token_is(token: &str, word: &str) -> bool {
    token == word || token.strip_suffix('s') == Some(word)
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not" | "no" | "never" | "isn't" | "wasn't" | "aren't" | "won't" | "can't" | "cannot"
            | "without"
    )
}

/// Net vocabulary score: +1 per positive hit, -1 per negative hit.
/// A negator within the three preceding tokens flips the hit.
pub fn polarity_score(text: &TitleText) -> i32 {
    let tokens = &text.tokens;
    let mut score = 0;
    for (i, tok) in tokens.iter().enumerate() {
        let base = if POSITIVE.iter().any(|w| token_is(tok, w)) {
            1
        } else if NEGATIVE.iter().any(|w| token_is(tok, w)) {
            -1
        } else {
            continue;
        };
        let negated = (1..=3).any(|k| i >= k && is_negator(&tokens[i - k]));
        score += if negated { -base } else { base };
    }
    score
}

/// Positive/negative by net score; ties are neutral.
pub fn polarity(text: &TitleText) -> Sentiment {
    match polarity_score(text) {
        s if s > 0 => Sentiment::Positive,
        s if s < 0 => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_token_matching_with_plurals() {
        let t = TitleText::new("Solana ETFs see inflows as SOL rallies");
        assert!(t.mentions("etf"));
        assert!(t.mentions("sol"));
        assert!(!t.mentions("sec"));
        // "ethereum" is not hiding inside "ethereal"
        assert!(!TitleText::new("An ethereal rally").mentions("ethereum"));
    }

    #[test]
    fn phrases_match_as_substrings() {
        let t = TitleText::new("The rise of Decentralized Finance lending");
        assert!(t.mentions("decentralized finance"));
    }

    #[test]
    fn polarity_counts_and_ties() {
        let tone = |title: &str| polarity(&TitleText::new(title));
        assert_eq!(tone("Bitcoin surges on ETF approval"), Sentiment::Positive);
        assert_eq!(tone("Exchange hacked, prices crash"), Sentiment::Negative);
        assert_eq!(tone("Rally fades into a crash"), Sentiment::Neutral);
        assert_eq!(tone("Ethereum devs meet on Thursday"), Sentiment::Neutral);
    }

    #[test]
    fn negator_flips_nearby_hit() {
        let t = TitleText::new("SEC says this is not an approval");
        assert_eq!(polarity_score(&t), -1);
        // too far away to count
        let t = TitleText::new("not one two three approval");
        assert_eq!(polarity_score(&t), 1);
    }
}

//! Content fingerprints with a bounded set and wholesale reset.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt::Write;

use crate::record::AnalysisRecord;

pub const DEFAULT_BOUND: usize = 800;
const COMMENTARY_PREFIX_CHARS: usize = 80;

/// SHA-256 hex of `title + "_" + first 80 chars of commentary`.
pub fn fingerprint(record: &AnalysisRecord) -> String {
    let prefix: String = record
        .commentary
        .chars()
        .take(COMMENTARY_PREFIX_CHARS)
        .collect();
    let mut hasher = Sha256::new();
    hasher.update(record.title.as_bytes());
    hasher.update(b"_");
    hasher.update(prefix.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

#[derive(Debug)]
pub struct Deduplicator {
    seen: HashSet<String>,
    bound: usize,
}

impl Deduplicator {
    pub fn new(bound: usize) -> Self {
        Self {
            seen: HashSet::new(),
            bound: bound.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// True the first time a fingerprint is seen. Once the set grows past its
    /// bound it is cleared and only the current fingerprint is kept.
    pub fn is_new(&mut self, record: &AnalysisRecord) -> bool {
        let fp = fingerprint(record);
        if self.seen.contains(&fp) {
            return false;
        }
        self.seen.insert(fp.clone());
        if self.seen.len() > self.bound {
            tracing::info!(
                target: "pipeline",
                bound = self.bound,
                "fingerprint set full, resetting"
            );
            self.seen.clear();
            self.seen.insert(fp);
        }
        true
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_BOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MarketImpact, Sentiment};
    use chrono::Utc;

    fn rec(title: &str, commentary: &str) -> AnalysisRecord {
        AnalysisRecord {
            title: title.into(),
            headline: title.into(),
            url: "https://decrypt.co/x".into(),
            source_name: "Decrypt".into(),
            coin: "BTC".into(),
            sentiment: Sentiment::Neutral,
            importance: 3,
            market_impact: MarketImpact::Low,
            commentary: commentary.into(),
            trading_advice: String::new(),
            signal: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn fingerprint_is_hex_and_ignores_commentary_tail() {
        let long = "x".repeat(80);
        let a = fingerprint(&rec("T", &format!("{long}AAA")));
        let b = fingerprint(&rec("T", &format!("{long}BBB")));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, fingerprint(&rec("U", &long)));
    }

    #[test]
    fn first_sighting_is_new_then_not() {
        let mut d = Deduplicator::default();
        let r = rec("Bitcoin", "c");
        assert!(d.is_new(&r));
        assert_eq!(d.len(), 1);
        assert!(!d.is_new(&r));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn overflow_clears_and_keeps_current() {
        let n = 5;
        let mut d = Deduplicator::new(n);
        for i in 0..n {
            assert!(d.is_new(&rec(&format!("t{i}"), "c")));
        }
        assert_eq!(d.len(), n);
        assert!(d.is_new(&rec("overflow", "c")));
        assert_eq!(d.len(), 1);
        assert!(!d.is_new(&rec("overflow", "c")));
        // earlier ones were forgotten
        assert!(d.is_new(&rec("t0", "c")));
    }
}

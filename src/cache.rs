//! Single-entry TTL caches for the last analysis batch and the market snapshot.

use std::time::Duration;
use tokio::time::Instant;

use crate::ingest::market::MarketSnapshot;
use crate::record::AnalysisRecord;

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub items: T,
    pub fetched_at: Instant,
}

/// Holds at most one entry, replaced whole on every `set`.
/// Stale entries are kept around so callers can still serve them as a fallback.
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    entry: Option<CacheEntry<T>>,
}

pub type ResponseCache = TtlCache<Vec<AnalysisRecord>>;
pub type MarketCache = TtlCache<MarketSnapshot>;

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn should_use_cache(&self) -> bool {
        self.should_use_at(Instant::now())
    }

    /// Fresh iff an entry exists and its age is strictly below the TTL.
    pub fn should_use_at(&self, now: Instant) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| now.saturating_duration_since(e.fetched_at) < self.ttl)
    }

    pub fn get(&self) -> Option<&T> {
        self.entry.as_ref().map(|e| &e.items)
    }

    pub fn set(&mut self, items: T) {
        self.set_at(items, Instant::now());
    }

    pub fn set_at(&mut self, items: T, now: Instant) {
        self.entry = Some(CacheEntry {
            items,
            fetched_at: now,
        });
    }
}

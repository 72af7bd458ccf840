//! Delivery analytics: one event per delivered record, plus daily/weekly reports.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::sync::Mutex;

use crate::record::{AnalysisRecord, Sentiment};

pub const DEFAULT_CAPACITY: usize = 10_000;

/// Fewer deliveries than this over a week triggers a "post more" hint.
const WEEKLY_MIN_MESSAGES: usize = 7;
const TOP_COINS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub record_id: String,
    pub coin: String,
    pub sentiment: Sentiment,
    pub importance: u8,
    pub source_name: String,
    pub timestamp: DateTime<Utc>,
}

pub fn analytics_event(
    record: &AnalysisRecord,
    record_id: impl Into<String>,
    now: DateTime<Utc>,
) -> AnalyticsEvent {
    AnalyticsEvent {
        record_id: record_id.into(),
        coin: record.coin.clone(),
        sentiment: record.sentiment,
        importance: record.importance,
        source_name: record.source_name.clone(),
        timestamp: now,
    }
}

/// Sink for delivery events.
pub trait AnalyticsStore: Send + Sync {
    fn record(&self, event: AnalyticsEvent);
    /// Events with `timestamp >= since`, oldest first.
    fn events_since(&self, since: DateTime<Utc>) -> Vec<AnalyticsEvent>;
}

/// Capped in-memory store; the oldest events are dropped first.
#[derive(Debug)]
pub struct InMemoryAnalytics {
    inner: Mutex<Vec<AnalyticsEvent>>,
    cap: usize,
}

impl InMemoryAnalytics {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, DEFAULT_CAPACITY);
        Self {
            inner: Mutex::new(Vec::with_capacity(cap.min(1024))),
            cap,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AnalyticsEvent>> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for InMemoryAnalytics {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl AnalyticsStore for InMemoryAnalytics {
    fn record(&self, event: AnalyticsEvent) {
        let mut v = self.lock();
        v.push(event);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    fn events_since(&self, since: DateTime<Utc>) -> Vec<AnalyticsEvent> {
        self.lock()
            .iter()
            .filter(|e| e.timestamp >= since)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub messages: usize,
    pub top_coin: Option<String>,
    pub top_sentiment: Option<Sentiment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoinStats {
    pub coin: String,
    pub messages: usize,
    pub positive: usize,
    pub negative: usize,
    pub avg_importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentShare {
    pub sentiment: Sentiment,
    pub count: usize,
    pub pct: f64,
}

/// Most frequent key; ties go to the lexicographically smallest.
fn mode_of<K: Ord + Clone>(keys: impl Iterator<Item = K>) -> Option<K> {
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    for k in keys {
        *counts.entry(k).or_default() += 1;
    }
    let best = counts.values().copied().max()?;
    counts
        .into_iter()
        .find(|(_, n)| *n == best)
        .map(|(k, _)| k)
}

/// Per-day counts, newest day first. Days without events are omitted.
pub fn daily_summary(events: &[AnalyticsEvent]) -> Vec<DaySummary> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&AnalyticsEvent>> = BTreeMap::new();
    for e in events {
        by_day.entry(e.timestamp.date_naive()).or_default().push(e);
    }
    by_day
        .into_iter()
        .rev()
        .map(|(date, evs)| DaySummary {
            date,
            messages: evs.len(),
            top_coin: mode_of(evs.iter().map(|e| e.coin.clone())),
            top_sentiment: mode_of(evs.iter().map(|e| e.sentiment.as_str()))
                .and_then(sentiment_from_str),
        })
        .collect()
}

fn sentiment_from_str(s: &str) -> Option<Sentiment> {
    match s {
        "positive" => Some(Sentiment::Positive),
        "negative" => Some(Sentiment::Negative),
        "neutral" => Some(Sentiment::Neutral),
        _ => None,
    }
}

/// Per-coin counts, busiest coin first.
pub fn coin_breakdown(events: &[AnalyticsEvent]) -> Vec<CoinStats> {
    let mut acc: HashMap<&str, (usize, usize, usize, u64)> = HashMap::new();
    for e in events {
        let slot = acc.entry(e.coin.as_str()).or_default();
        slot.0 += 1;
        match e.sentiment {
            Sentiment::Positive => slot.1 += 1,
            Sentiment::Negative => slot.2 += 1,
            Sentiment::Neutral => {}
        }
        slot.3 += u64::from(e.importance);
    }
    let mut out: Vec<CoinStats> = acc
        .into_iter()
        .map(|(coin, (n, pos, neg, imp))| CoinStats {
            coin: coin.to_string(),
            messages: n,
            positive: pos,
            negative: neg,
            avg_importance: imp as f64 / n as f64,
        })
        .collect();
    out.sort_by(|a, b| b.messages.cmp(&a.messages).then_with(|| a.coin.cmp(&b.coin)));
    out
}

/// Count and percentage per sentiment, most common first.
pub fn sentiment_distribution(events: &[AnalyticsEvent]) -> Vec<SentimentShare> {
    let total = events.len();
    let mut out: Vec<SentimentShare> = [
        Sentiment::Positive,
        Sentiment::Negative,
        Sentiment::Neutral,
    ]
    .into_iter()
    .map(|s| {
        let count = events.iter().filter(|e| e.sentiment == s).count();
        SentimentShare {
            sentiment: s,
            count,
            pct: if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            },
        }
    })
    .filter(|s| s.count > 0)
    .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Daily,
    Weekly,
}

impl ReportKind {
    pub fn window(self) -> Duration {
        match self {
            ReportKind::Daily => Duration::days(1),
            ReportKind::Weekly => Duration::days(7),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Daily => "daily",
            ReportKind::Weekly => "weekly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub generated_at: DateTime<Utc>,
    pub total_messages: usize,
    pub days: Vec<DaySummary>,
    pub top_coins: Vec<CoinStats>,
    pub sentiment: Vec<SentimentShare>,
    pub recommendations: Vec<String>,
}

fn recommendations(kind: ReportKind, total: usize, dist: &[SentimentShare]) -> Vec<String> {
    let count_of = |s: Sentiment| {
        dist.iter()
            .find(|d| d.sentiment == s)
            .map_or(0, |d| d.count)
    };
    let positive = count_of(Sentiment::Positive) as f64;
    let negative = count_of(Sentiment::Negative) as f64;

    let mut out = Vec::new();
    if positive > negative * 1.5 {
        out.push(
            "Positive news draws more interest; keep highlighting upside stories.".to_string(),
        );
    } else if negative > positive {
        out.push(
            "Negative coverage dominates; balance it with neutral or positive analysis."
                .to_string(),
        );
    }
    if kind == ReportKind::Weekly && total < WEEKLY_MIN_MESSAGES {
        out.push(format!(
            "Only {total} analyses delivered this week; post more often to keep the channel active."
        ));
    }
    out
}

pub fn build_report(store: &dyn AnalyticsStore, kind: ReportKind, now: DateTime<Utc>) -> Report {
    let events = store.events_since(now - kind.window());
    let sentiment = sentiment_distribution(&events);
    let mut top_coins = coin_breakdown(&events);
    top_coins.truncate(TOP_COINS);
    Report {
        kind,
        generated_at: now,
        total_messages: events.len(),
        days: daily_summary(&events),
        recommendations: recommendations(kind, events.len(), &sentiment),
        top_coins,
        sentiment,
    }
}

pub fn weekly_report(store: &dyn AnalyticsStore, now: DateTime<Utc>) -> Report {
    build_report(store, ReportKind::Weekly, now)
}

pub fn daily_report(store: &dyn AnalyticsStore, now: DateTime<Utc>) -> Report {
    build_report(store, ReportKind::Daily, now)
}

/// Markdown rendering for channel delivery.
pub fn render_report(report: &Report) -> String {
    let heading = match report.kind {
        ReportKind::Daily => "📅 Daily Analytics Report",
        ReportKind::Weekly => "📊 Weekly Analytics Report",
    };
    let mut out = String::new();
    let _ = writeln!(out, "**{heading}**");
    let _ = writeln!(out, "_{}_", report.generated_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(out);
    let _ = writeln!(out, "**Messages:** `{}`", report.total_messages);

    if !report.top_coins.is_empty() {
        let _ = writeln!(out, "\n**Top coins:**");
        for c in &report.top_coins {
            let _ = writeln!(
                out,
                "• {}: {} ({}↑ / {}↓)",
                c.coin, c.messages, c.positive, c.negative
            );
        }
    }
    if !report.sentiment.is_empty() {
        let _ = writeln!(out, "\n**Sentiment:**");
        for s in &report.sentiment {
            let _ = writeln!(out, "• {}: {} ({:.0}%)", s.sentiment, s.count, s.pct);
        }
    }
    if report.kind == ReportKind::Weekly && !report.days.is_empty() {
        let _ = writeln!(out, "\n**By day:**");
        for d in &report.days {
            let _ = writeln!(
                out,
                "• {}: {} (top {})",
                d.date,
                d.messages,
                d.top_coin.as_deref().unwrap_or("-")
            );
        }
    }
    if !report.recommendations.is_empty() {
        let _ = writeln!(out, "\n**Recommendations:**");
        for r in &report.recommendations {
            let _ = writeln!(out, "• {r}");
        }
    }
    out.trim_end().to_string()
}

//! Delivery of rendered analyses to the channel.

pub mod format;
pub mod telegram;

use anyhow::Result;
use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::analytics::{analytics_event, AnalyticsStore};
use crate::config::PipelineConfig;
use crate::dedup::fingerprint;
use crate::record::AnalysisRecord;

pub use format::format_message;
pub use telegram::TelegramNotifier;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message; returns the channel's message id when it reports one.
    async fn send(&self, text: &str) -> Result<Option<i64>>;
    fn name(&self) -> &'static str;
}

/// Writes messages to the log instead of a channel.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<Option<i64>> {
        tracing::info!(target: "notify", chars = text.chars().count(), "\n{text}");
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublishStats {
    pub sent: u64,
    pub failed: u64,
}

/// Sends the head of each batch and records delivery analytics.
pub struct Publisher {
    notifier: Arc<dyn Notifier>,
    analytics: Arc<dyn AnalyticsStore>,
    sent: AtomicU64,
    failed: AtomicU64,
}

impl Publisher {
    pub fn new(notifier: Arc<dyn Notifier>, analytics: Arc<dyn AnalyticsStore>) -> Self {
        Self {
            notifier,
            analytics,
            sent: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Telegram when configured, log output otherwise.
    pub fn from_config(cfg: &PipelineConfig, analytics: Arc<dyn AnalyticsStore>) -> Self {
        let notifier: Arc<dyn Notifier> = match TelegramNotifier::from_config(&cfg.telegram) {
            Some(tg) => Arc::new(tg.with_timeout(cfg.request_timeout_secs)),
            None => {
                tracing::info!(target: "notify", "telegram not configured, logging messages");
                Arc::new(LogNotifier)
            }
        };
        Self::new(notifier, analytics)
    }

    pub fn stats(&self) -> PublishStats {
        PublishStats {
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Deliver the first record of the batch. Returns true on success.
    pub async fn publish(&self, records: &[AnalysisRecord]) -> bool {
        let Some(rec) = records.first() else {
            return false;
        };
        match self.deliver(&format_message(rec)).await {
            Some(id) => {
                let record_id = id.map_or_else(|| fingerprint(rec), |id| id.to_string());
                self.analytics
                    .record(analytics_event(rec, record_id, Utc::now()));
                tracing::info!(
                    target: "notify",
                    coin = %rec.coin,
                    sent = self.sent.load(Ordering::Relaxed),
                    "analysis delivered"
                );
                true
            }
            None => false,
        }
    }

    /// Deliver free text (reports). No analytics are recorded.
    pub async fn send_text(&self, text: &str) -> bool {
        self.deliver(text).await.is_some()
    }

    async fn deliver(&self, text: &str) -> Option<Option<i64>> {
        match self.notifier.send(text).await {
            Ok(id) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                counter!("notify_sent_total").increment(1);
                Some(id)
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                counter!("notify_failed_total").increment(1);
                tracing::error!(
                    target: "notify",
                    notifier = self.notifier.name(),
                    error = %e,
                    "delivery failed"
                );
                None
            }
        }
    }
}

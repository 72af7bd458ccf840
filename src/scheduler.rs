// src/scheduler.rs
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::analytics::{build_report, render_report, AnalyticsStore, ReportKind};
use crate::notify::Publisher;
use crate::pipeline::Pipeline;

/// Run the news cycle immediately, then every `interval`.
pub fn spawn_news_job(
    pipeline: Arc<Pipeline>,
    publisher: Arc<Publisher>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_news_cycle(&pipeline, &publisher).await;
        }
    })
}

/// One fetch → publish pass. Exposed for hosts that drive their own timer.
pub async fn run_news_cycle(pipeline: &Pipeline, publisher: &Publisher) -> bool {
    let records = pipeline.get_analyses().await;
    counter!("scheduler_news_ticks_total").increment(1);
    let delivered = publisher.publish(&records).await;
    let stats = publisher.stats();
    tracing::info!(
        target: "pipeline",
        records = records.len(),
        delivered,
        sent = stats.sent,
        failed = stats.failed,
        "news cycle finished"
    );
    delivered
}

/// Publish a daily or weekly report every `period`, starting one period from now.
pub fn spawn_report_job(
    analytics: Arc<dyn AnalyticsStore>,
    publisher: Arc<Publisher>,
    period: Duration,
    kind: ReportKind,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = build_report(analytics.as_ref(), kind, Utc::now());
            let ok = publisher.send_text(&render_report(&report)).await;
            tracing::info!(
                target: "pipeline",
                kind = kind.as_str(),
                messages = report.total_messages,
                delivered = ok,
                "report published"
            );
        }
    })
}

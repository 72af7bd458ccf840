//! Crypto news pipeline: binary entrypoint.
//! Boots the Axum HTTP surface and the background news/report jobs.

use std::sync::Arc;
use std::time::Duration;

use shuttle_axum::ShuttleAxum;

use crypto_news_pipeline::analytics::{AnalyticsStore, InMemoryAnalytics, ReportKind};
use crypto_news_pipeline::api::{self, AppState};
use crypto_news_pipeline::metrics::Metrics;
use crypto_news_pipeline::notify::Publisher;
use crypto_news_pipeline::{init_tracing, scheduler, Pipeline, PipelineConfig};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = PipelineConfig::load_default()?;
    cfg.validate_delivery()?;
    tracing::info!(
        interval_secs = cfg.check_interval_secs,
        max_results = cfg.max_results_per_call,
        coins = cfg.tracked_coins.len(),
        "pipeline config loaded"
    );

    let metrics = Metrics::init(&cfg)?;
    let analytics: Arc<dyn AnalyticsStore> = Arc::new(InMemoryAnalytics::default());
    let pipeline = Arc::new(Pipeline::from_config(&cfg));
    let publisher = Arc::new(Publisher::from_config(&cfg, analytics.clone()));

    scheduler::spawn_news_job(pipeline.clone(), publisher.clone(), cfg.check_interval());
    scheduler::spawn_report_job(analytics.clone(), publisher.clone(), DAY, ReportKind::Daily);
    scheduler::spawn_report_job(
        analytics.clone(),
        publisher.clone(),
        7 * DAY,
        ReportKind::Weekly,
    );

    let state = AppState::new(pipeline, analytics)
        .with_publisher(publisher)
        .with_metrics(metrics.handle);
    let router = api::create_router(state);

    Ok(router.into())
}

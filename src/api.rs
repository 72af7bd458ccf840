use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;

use crate::analytics::{build_report, AnalyticsStore, Report, ReportKind};
use crate::notify::{format_message, PublishStats, Publisher};
use crate::pipeline::Pipeline;
use crate::record::AnalysisRecord;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub analytics: Arc<dyn AnalyticsStore>,
    pub publisher: Option<Arc<Publisher>>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, analytics: Arc<dyn AnalyticsStore>) -> Self {
        Self {
            pipeline,
            analytics,
            publisher: None,
            metrics: None,
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/analyses", get(analyses))
        .route("/analyses/preview", get(analyses_preview))
        .route("/reports/daily", get(report_daily))
        .route("/reports/weekly", get(report_weekly))
        .route("/stats", get(stats));

    if let Some(handle) = state.metrics.clone() {
        router = router.route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        );
    }

    router
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn analyses(State(state): State<AppState>) -> Json<Vec<AnalysisRecord>> {
    Json(state.pipeline.get_analyses().await)
}

/// Renders the cached batch without running a cycle, so polling this route
/// leaves the rate limiter, dedup set and fallback counter untouched.
async fn analyses_preview(State(state): State<AppState>) -> Json<Vec<String>> {
    let records = state.pipeline.cached().await.unwrap_or_default();
    Json(
        records
            .iter()
            .take(state.pipeline.max_results())
            .map(format_message)
            .collect(),
    )
}

async fn report_daily(State(state): State<AppState>) -> Json<Report> {
    Json(build_report(state.analytics.as_ref(), ReportKind::Daily, Utc::now()))
}

async fn report_weekly(State(state): State<AppState>) -> Json<Report> {
    Json(build_report(state.analytics.as_ref(), ReportKind::Weekly, Utc::now()))
}

async fn stats(State(state): State<AppState>) -> Json<Option<PublishStats>> {
    Json(state.publisher.as_ref().map(|p| p.stats()))
}

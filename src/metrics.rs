use anyhow::{Context, Result};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::PipelineConfig;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and publish the cache TTLs as static gauges.
    pub fn init(cfg: &PipelineConfig) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        crate::ingest::ensure_metrics_described();
        gauge!("pipeline_news_cache_ttl_secs").set(cfg.news_ttl_secs as f64);
        gauge!("pipeline_market_cache_ttl_secs").set(cfg.market_ttl_secs as f64);

        Ok(Self { handle })
    }
}

// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analytics;
pub mod analyze;
pub mod api;
pub mod cache;
pub mod config;
pub mod dedup;
pub mod fallback;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod record;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::analyze::AnalysisEngine;
pub use crate::config::PipelineConfig;
pub use crate::pipeline::Pipeline;
pub use crate::record::{AnalysisRecord, MarketImpact, Sentiment, TradingSignal};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` drives the filter (default `crypto_news_pipeline=info,warn`);
/// `LOG_FORMAT=json` switches to JSON lines. A subscriber that is already
/// installed (e.g. by the host runtime) is left in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crypto_news_pipeline=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

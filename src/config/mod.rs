pub mod pipeline;

pub use pipeline::{PipelineConfig, RateLimitConfig, TelegramConfig, TrackedCoin};

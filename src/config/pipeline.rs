// src/config/pipeline.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_RESULTS: usize = 1;
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 1800;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}
fn default_check_interval_secs() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}
fn default_news_ttl_secs() -> u64 {
    30 * 60
}
fn default_market_ttl_secs() -> u64 {
    10 * 60
}
fn default_dedup_bound() -> usize {
    800
}
fn default_rss_pause_ms() -> u64 {
    1000
}
fn default_rss_feeds() -> Vec<String> {
    vec![
        "https://cryptopanic.com/news/rss/".to_string(),
        "https://cryptoslate.com/feed/".to_string(),
        "https://cointelegraph.com/rss".to_string(),
    ]
}

/// A coin the pipeline tracks for market data and ticker headlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedCoin {
    /// CoinGecko id, e.g. "bitcoin".
    pub id: String,
    /// Ticker symbol, e.g. "BTC".
    pub symbol: String,
    /// Display name, e.g. "Bitcoin".
    pub name: String,
}

impl TrackedCoin {
    fn new(id: &str, symbol: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }
}

pub fn default_tracked_coins() -> Vec<TrackedCoin> {
    [
        ("bitcoin", "BTC", "Bitcoin"),
        ("ethereum", "ETH", "Ethereum"),
        ("solana", "SOL", "Solana"),
        ("binancecoin", "BNB", "Binance Coin"),
        ("cardano", "ADA", "Cardano"),
        ("ripple", "XRP", "XRP"),
        ("polkadot", "DOT", "Polkadot"),
        ("dogecoin", "DOGE", "Dogecoin"),
        ("avalanche-2", "AVAX", "Avalanche"),
        ("matic-network", "MATIC", "Polygon"),
        ("litecoin", "LTC", "Litecoin"),
        ("uniswap", "UNI", "Uniswap"),
        ("chainlink", "LINK", "Chainlink"),
    ]
    .into_iter()
    .map(|(id, symbol, name)| TrackedCoin::new(id, symbol, name))
    .collect()
}

/// Spacing policy for upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub min_interval_secs: u64,
    /// Every n-th call waits the extra cooldown.
    pub cooldown_every: u64,
    pub cooldown_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 10,
            cooldown_every: 10,
            cooldown_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
}

/// Process-wide pipeline configuration. Read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_results")]
    pub max_results_per_call: usize,
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    #[serde(default = "default_news_ttl_secs")]
    pub news_ttl_secs: u64,
    #[serde(default = "default_market_ttl_secs")]
    pub market_ttl_secs: u64,
    #[serde(default = "default_dedup_bound")]
    pub dedup_bound: usize,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default = "default_rss_feeds")]
    pub rss_feeds: Vec<String>,
    #[serde(default = "default_rss_pause_ms")]
    pub rss_pause_ms: u64,
    #[serde(default = "default_tracked_coins")]
    pub tracked_coins: Vec<TrackedCoin>,
    #[serde(default)]
    pub cryptopanic_api_key: Option<String>,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout_secs(),
            max_results_per_call: default_max_results(),
            check_interval_secs: default_check_interval_secs(),
            news_ttl_secs: default_news_ttl_secs(),
            market_ttl_secs: default_market_ttl_secs(),
            dedup_bound: default_dedup_bound(),
            rate_limit: RateLimitConfig::default(),
            rss_feeds: default_rss_feeds(),
            rss_pause_ms: default_rss_pause_ms(),
            tracked_coins: default_tracked_coins(),
            cryptopanic_api_key: None,
            telegram: TelegramConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from an explicit TOML file, then apply env overrides.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        let cfg: PipelineConfig = toml::from_str(&content)
            .with_context(|| format!("parsing pipeline config {}", path.display()))?;
        Ok(cfg.with_env_overrides().sanitized())
    }

    /// Load using env var + fallbacks:
    /// 1) $PIPELINE_CONFIG_PATH
    /// 2) config/pipeline.toml
    /// 3) built-in defaults
    ///
    /// Env overrides are applied in every case.
    pub fn load_default() -> Result<Self> {
        let _ = dotenvy::dotenv();

        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from_file(&default_path);
        }
        Ok(Self::default().with_env_overrides().sanitized())
    }

    /// Environment variables win over file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse::<u64>("REQUEST_TIMEOUT") {
            self.request_timeout_secs = v;
        }
        if let Some(v) = env_parse::<usize>("MAX_POSTS_PER_CHECK") {
            self.max_results_per_call = v;
        }
        if let Some(v) = env_parse::<u64>("CHECK_INTERVAL") {
            self.check_interval_secs = v;
        }
        if let Some(v) = env_string("CRYPTOPANIC_API_KEY") {
            self.cryptopanic_api_key = Some(v);
        }
        if let Some(v) = env_string("BOT_TOKEN") {
            self.telegram.bot_token = Some(v);
        }
        if let Some(v) = env_string("CHANNEL_ID") {
            self.telegram.channel_id = Some(v);
        }
        self
    }

    /// Replace nonsensical zero values with defaults.
    pub fn sanitized(mut self) -> Self {
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
        if self.max_results_per_call == 0 {
            self.max_results_per_call = DEFAULT_MAX_RESULTS;
        }
        if self.check_interval_secs == 0 {
            self.check_interval_secs = DEFAULT_CHECK_INTERVAL_SECS;
        }
        if self.dedup_bound == 0 {
            self.dedup_bound = default_dedup_bound();
        }
        if self.tracked_coins.is_empty() {
            self.tracked_coins = default_tracked_coins();
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Telegram delivery is optional, but a half-configured channel is an error.
    pub fn validate_delivery(&self) -> Result<()> {
        let tg = &self.telegram;
        if tg.bot_token.is_none() {
            return Ok(());
        }
        match tg.channel_id.as_deref() {
            None => bail!("BOT_TOKEN is set but CHANNEL_ID is missing"),
            Some(id) if !id.starts_with('@') => {
                bail!("CHANNEL_ID must start with '@' (e.g. @channelname), got {id}")
            }
            Some(_) => Ok(()),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    const ENV_KEYS: [&str; 6] = [
        "REQUEST_TIMEOUT",
        "MAX_POSTS_PER_CHECK",
        "CHECK_INTERVAL",
        "CRYPTOPANIC_API_KEY",
        "BOT_TOKEN",
        "CHANNEL_ID",
    ];

    fn clear_env() {
        for k in ENV_KEYS {
            env::remove_var(k);
        }
        env::remove_var(ENV_CONFIG_PATH);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: PipelineConfig = toml::from_str(
            r#"
            max_results_per_call = 3
            [rate_limit]
            min_interval_secs = 2
            cooldown_every = 5
            cooldown_secs = 7
            "#,
        )
        .unwrap();
        assert_eq!(cfg.max_results_per_call, 3);
        assert_eq!(cfg.request_timeout_secs, 15);
        assert_eq!(cfg.rate_limit.cooldown_every, 5);
        assert_eq!(cfg.tracked_coins.len(), 13);
        assert_eq!(cfg.news_ttl_secs, 1800);
    }

    #[test]
    fn sanitize_replaces_zeroes() {
        let cfg = PipelineConfig {
            request_timeout_secs: 0,
            max_results_per_call: 0,
            tracked_coins: vec![],
            ..Default::default()
        }
        .sanitized();
        assert_eq!(cfg.request_timeout_secs, 15);
        assert_eq!(cfg.max_results_per_call, 1);
        assert!(!cfg.tracked_coins.is_empty());
    }

    #[test]
    fn delivery_validation_requires_at_prefix() {
        let mut cfg = PipelineConfig::default();
        assert!(cfg.validate_delivery().is_ok());

        cfg.telegram.bot_token = Some("123:abc".into());
        assert!(cfg.validate_delivery().is_err());

        cfg.telegram.channel_id = Some("mychannel".into());
        assert!(cfg.validate_delivery().is_err());

        cfg.telegram.channel_id = Some("@mychannel".into());
        assert!(cfg.validate_delivery().is_ok());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_path_then_overrides() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        clear_env();

        // No file in CWD -> defaults
        let cfg = PipelineConfig::load_default().unwrap();
        assert_eq!(cfg.max_results_per_call, 1);

        // Env path wins, env vars win over the file
        let p = tmp.path().join("custom.toml");
        fs::write(&p, "max_results_per_call = 4\nrequest_timeout_secs = 12\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        env::set_var("REQUEST_TIMEOUT", "9");
        let cfg = PipelineConfig::load_default().unwrap();
        assert_eq!(cfg.max_results_per_call, 4);
        assert_eq!(cfg.request_timeout_secs, 9);

        // Dangling path is an error
        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(PipelineConfig::load_default().is_err());

        clear_env();
        env::set_current_dir(&old).unwrap();
    }
}

pub mod cryptopanic;
pub mod exchange_ticker;
pub mod rss_aggregate;

use std::time::Duration;

use crate::ingest::types::FetchError;

pub use cryptopanic::CryptoPanicFetcher;
pub use exchange_ticker::ExchangeTickerFetcher;
pub use rss_aggregate::RssAggregateFetcher;

const USER_AGENT: &str = "crypto-news-pipeline/0.1";

/// Shared HTTP client for upstream calls. Timeouts are applied per request.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(5))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default reqwest client");
            reqwest::Client::new()
        })
}

/// GET a URL and return the body; non-2xx is a soft `FetchError::Status`.
pub(crate) async fn get_text(
    req: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<String, FetchError> {
    let resp = req.timeout(timeout).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(resp.text().await?)
}

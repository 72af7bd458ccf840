// tests/notify_telegram.rs
//
// Telegram delivery against an in-process Bot API stand-in, plus one full
// news cycle through the scheduler entry point.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

use crypto_news_pipeline::analytics::{AnalyticsStore, InMemoryAnalytics};
use crypto_news_pipeline::ingest::types::{FetchError, RawItem, SourceFetcher};
use crypto_news_pipeline::notify::{Notifier, Publisher, TelegramNotifier};
use crypto_news_pipeline::scheduler::run_news_cycle;
use crypto_news_pipeline::{Pipeline, PipelineConfig};

#[derive(Clone, Default)]
struct Bot {
    calls: Arc<AtomicUsize>,
    fail_first: usize,
    last_body: Arc<Mutex<Option<Value>>>,
}

async fn send_message(
    State(bot): State<Bot>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = bot.calls.fetch_add(1, Ordering::SeqCst);
    *bot.last_body.lock().unwrap() = Some(body);
    if n < bot.fail_first {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"ok": false, "description": "try later"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"ok": true, "result": {"message_id": 77 + n as i64}})),
    )
}

async fn serve(bot: Bot) -> String {
    let router = Router::new()
        .route("/botTEST/sendMessage", post(send_message))
        .with_state(bot);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}

fn notifier(base: &str) -> TelegramNotifier {
    TelegramNotifier::new("TEST".into(), "@crypto_news".into()).with_base_url(base)
}

#[tokio::test]
async fn sends_markdown_message_and_returns_id() {
    let bot = Bot::default();
    let base = serve(bot.clone()).await;

    let id = notifier(&base).send("*hello*").await.expect("send");
    assert_eq!(id, Some(77));

    let body = bot.last_body.lock().unwrap().clone().expect("body captured");
    assert_eq!(body["chat_id"], "@crypto_news");
    assert_eq!(body["text"], "*hello*");
    assert_eq!(body["parse_mode"], "Markdown");
}

#[tokio::test]
async fn retries_after_server_error() {
    let bot = Bot {
        fail_first: 1,
        ..Default::default()
    };
    let base = serve(bot.clone()).await;

    let id = notifier(&base).send("retry me").await.expect("second attempt succeeds");
    assert_eq!(id, Some(78));
    assert_eq!(bot.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let bot = Bot {
        fail_first: usize::MAX,
        ..Default::default()
    };
    let base = serve(bot.clone()).await;

    let err = notifier(&base)
        .with_retries(2)
        .send("never lands")
        .await
        .expect_err("all attempts fail");
    assert!(err.to_string().contains("500"), "{err}");
    assert_eq!(bot.calls.load(Ordering::SeqCst), 2);
}

struct OneStory;

#[async_trait]
impl SourceFetcher for OneStory {
    async fn fetch(&self, _timeout: Duration) -> Result<Vec<RawItem>, FetchError> {
        Ok(vec![RawItem {
            title: "Ethereum gas fees fall to yearly lows".into(),
            url: "https://decrypt.co/news/eth-gas".into(),
            source_name: "Decrypt".into(),
            published_at: None,
        }])
    }
    fn name(&self) -> &'static str {
        "one-story"
    }
}

#[tokio::test]
async fn news_cycle_delivers_and_records_analytics() {
    let bot = Bot::default();
    let base = serve(bot.clone()).await;

    let pipeline = Pipeline::builder(&PipelineConfig::default())
        .fetcher(OneStory)
        .seed(8)
        .build();
    let analytics = Arc::new(InMemoryAnalytics::default());
    let publisher = Publisher::new(Arc::new(notifier(&base)), analytics.clone());

    assert!(run_news_cycle(&pipeline, &publisher).await);
    assert_eq!(publisher.stats().sent, 1);

    let events = analytics.events_since(chrono::Utc::now() - chrono::Duration::hours(1));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].record_id, "77");
    assert_eq!(events[0].coin, "ETH");

    let body = bot.last_body.lock().unwrap().clone().expect("body captured");
    let text = body["text"].as_str().unwrap_or_default();
    assert!(text.contains("Ethereum Network Update"));
    assert!(text.contains("#Decrypt #ETH"));
}

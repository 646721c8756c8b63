//! Shared helpers for integration tests.
//!
//! Provides stub feed and generation API servers bound to loopback, plus
//! builders for an orchestrator wired against them.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use news_batcher::config::{FeedConfig, SummarizerConfig};
use news_batcher::{ArticleStore, Database, FeedFetcher, Orchestrator, Summarizer};

/// Marker that makes the stub generation API fail for a prompt.
pub const FAIL_MARKER: &str = "[fail]";

/// Marker that makes the stub generation API stall before answering.
pub const SLOW_MARKER: &str = "[slow]";

/// How long a stalled generation request waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(5);

/// Summary text returned by the stub generation API.
pub const STUB_SUMMARY: &str = "첫째 줄\n둘째 줄\n셋째 줄";

/// One feed item.
pub struct Item<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub pub_date: Option<&'a str>,
}

impl<'a> Item<'a> {
    pub fn new(title: &'a str, link: &'a str) -> Self {
        Self {
            title,
            link,
            pub_date: Some("Tue, 10 Jun 2025 04:00:00 GMT"),
        }
    }

    pub fn with_pub_date(mut self, pub_date: Option<&'a str>) -> Self {
        self.pub_date = pub_date;
        self
    }
}

/// Render an RSS 2.0 document.
pub fn rss(items: &[Item<'_>]) -> String {
    let mut body = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\"><channel>\
         <title>Economy</title><link>https://news.example.com</link>",
    );
    for item in items {
        body.push_str("<item>");
        body.push_str(&format!("<title>{}</title>", item.title));
        if !item.link.is_empty() {
            body.push_str(&format!("<link>{}</link>", item.link));
        }
        if let Some(date) = item.pub_date {
            body.push_str(&format!("<pubDate>{date}</pubDate>"));
        }
        body.push_str(&format!("<description>Story about {}</description>", item.title));
        body.push_str("</item>");
    }
    body.push_str("</channel></rss>");
    body
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[derive(Clone)]
struct FeedState {
    status: Arc<Mutex<StatusCode>>,
    body: Arc<Mutex<String>>,
}

/// Stub feed server whose response can be changed between runs.
pub struct StubFeed {
    pub url: String,
    state: FeedState,
}

impl StubFeed {
    pub async fn start(body: String) -> Self {
        let state = FeedState {
            status: Arc::new(Mutex::new(StatusCode::OK)),
            body: Arc::new(Mutex::new(body)),
        };
        let app = Router::new()
            .route("/rss", get(serve_feed))
            .with_state(state.clone());
        let addr = spawn(app).await;
        Self {
            url: format!("http://{addr}/rss"),
            state,
        }
    }

    pub fn set_body(&self, body: String) {
        *self.state.body.lock().unwrap() = body;
    }

    pub fn set_status(&self, status: StatusCode) {
        *self.state.status.lock().unwrap() = status;
    }
}

async fn serve_feed(State(state): State<FeedState>) -> impl IntoResponse {
    let status = *state.status.lock().unwrap();
    let body = state.body.lock().unwrap().clone();
    (status, body)
}

#[derive(Clone, Default)]
struct GeminiState {
    generate_calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

/// Stub generation API counting its calls.
pub struct StubGemini {
    pub api_base: String,
    state: GeminiState,
}

impl StubGemini {
    pub async fn start() -> Self {
        let state = GeminiState::default();
        let app = Router::new()
            .route("/v1beta/models", get(list_models))
            .route("/v1beta/models/:action", post(generate))
            .with_state(state.clone());
        let addr = spawn(app).await;
        Self {
            api_base: format!("http://{addr}/v1beta"),
            state,
        }
    }

    pub fn generate_calls(&self) -> usize {
        self.state.generate_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.prompts.lock().unwrap().clone()
    }
}

async fn list_models() -> Json<Value> {
    Json(json!({
        "models": [
            {"name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent"]}
        ]
    }))
}

async fn generate(State(state): State<GeminiState>, Json(body): Json<Value>) -> impl IntoResponse {
    state.generate_calls.fetch_add(1, Ordering::SeqCst);
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    state.prompts.lock().unwrap().push(prompt.clone());

    if prompt.contains(SLOW_MARKER) {
        tokio::time::sleep(SLOW_DELAY).await;
    }
    if prompt.contains(FAIL_MARKER) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": {"code": 500, "message": "backend exploded", "status": "INTERNAL"}})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"candidates": [{"content": {"parts": [{"text": STUB_SUMMARY}]}}]})),
    )
}

/// Build an orchestrator over `db`, summarizing through `gemini` when given.
pub async fn orchestrator(
    feed_url: &str,
    gemini: Option<&StubGemini>,
    db: &Database,
) -> Arc<Orchestrator> {
    let timeout = SummarizerConfig::default().request_timeout_secs;
    orchestrator_with_timeout(feed_url, gemini, db, timeout).await
}

/// Like [`orchestrator`], with generation requests bounded by `request_timeout_secs`.
pub async fn orchestrator_with_timeout(
    feed_url: &str,
    gemini: Option<&StubGemini>,
    db: &Database,
    request_timeout_secs: u64,
) -> Arc<Orchestrator> {
    let fetcher = FeedFetcher::new(&FeedConfig {
        url: feed_url.to_string(),
        ..FeedConfig::default()
    })
    .unwrap();

    let summarizer_config = match gemini {
        Some(stub) => SummarizerConfig {
            api_key: "test-key".to_string(),
            api_base: stub.api_base.clone(),
            request_timeout_secs,
            ..SummarizerConfig::default()
        },
        None => SummarizerConfig::default(),
    };
    let summarizer = Summarizer::from_config(&summarizer_config).await.unwrap();

    Arc::new(Orchestrator::new(
        fetcher,
        Arc::new(summarizer),
        ArticleStore::new(db.pool().clone()),
    ))
}

/// A URL nothing listens on.
pub async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/rss")
}

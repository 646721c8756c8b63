//! HTTP API tests.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use common::{orchestrator, rss, Item, StubFeed, StubGemini};
use news_batcher::web::handlers::AppState;
use news_batcher::web::router::create_router;
use news_batcher::{ArticleRepository, Database, NewArticle};

async fn create_test_server(feed_url: &str, gemini: Option<&StubGemini>) -> (TestServer, Database) {
    let db = Database::open_in_memory().await.unwrap();
    let orch = orchestrator(feed_url, gemini, &db).await;
    let state = Arc::new(AppState::new(db.clone(), orch, 10));
    let server = TestServer::new(create_router(state, &[])).expect("Failed to create test server");
    (server, db)
}

async fn seed(db: &Database, count: u32) {
    let repo = ArticleRepository::new(db.pool());
    for i in 0..count {
        repo.create(&NewArticle::new(
            format!("Article {i}"),
            format!("https://news.example.com/{i}"),
            "summary",
            Utc.with_ymd_and_hms(2025, 6, 1 + i, 0, 0, 0).unwrap(),
        ))
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn test_status_before_any_run() {
    let feed = StubFeed::start(rss(&[])).await;
    let (server, _db) = create_test_server(&feed.url, None).await;

    let response = server.get("/").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "running");
    assert_eq!(body["service"], "News Batcher");
    assert!(body["last_run"].is_null());
}

#[tokio::test]
async fn test_trigger_batch_post() {
    let feed = StubFeed::start(rss(&[
        Item::new("One", "https://news.example.com/a"),
        Item::new("Two", "https://news.example.com/b"),
    ]))
    .await;
    let gemini = StubGemini::start().await;
    let (server, db) = create_test_server(&feed.url, Some(&gemini)).await;

    let response = server.post("/trigger-batch").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["message"], "Batch executed successfully");
    assert_eq!(body["new_articles_count"], 2);

    let repo = ArticleRepository::new(db.pool());
    assert_eq!(repo.count().await.unwrap(), 2);

    // Status now reports the run
    let status = server.get("/").await.json::<Value>();
    assert_eq!(status["last_run"]["phase"], "done");
    assert_eq!(status["last_run"]["new_articles"], 2);
}

#[tokio::test]
async fn test_trigger_batch_get_with_limit() {
    let feed = StubFeed::start(rss(&[
        Item::new("One", "https://news.example.com/a"),
        Item::new("Two", "https://news.example.com/b"),
        Item::new("Three", "https://news.example.com/c"),
    ]))
    .await;
    let (server, _db) = create_test_server(&feed.url, None).await;

    let response = server
        .get("/trigger-batch")
        .add_query_param("limit", 1)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["new_articles_count"], 1);

    // Second call picks up only what is left
    let response = server.get("/trigger-batch").await;
    assert_eq!(response.json::<Value>()["new_articles_count"], 2);
}

#[tokio::test]
async fn test_trigger_batch_rejects_bad_limit() {
    let feed = StubFeed::start(rss(&[])).await;
    let (server, _db) = create_test_server(&feed.url, None).await;

    for limit in [0, 101] {
        let response = server
            .post("/trigger-batch")
            .add_query_param("limit", limit)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"]["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn test_trigger_batch_feed_failure_returns_zero() {
    let feed = StubFeed::start(rss(&[])).await;
    feed.set_status(StatusCode::BAD_GATEWAY);
    let (server, _db) = create_test_server(&feed.url, None).await;

    let response = server.post("/trigger-batch").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["new_articles_count"], 0);

    let status = server.get("/").await.json::<Value>();
    assert_eq!(status["last_run"]["phase"], "aborted");
}

#[tokio::test]
async fn test_trigger_batch_commit_failure_returns_500() {
    let feed = StubFeed::start(rss(&[Item::new("One", "https://news.example.com/a")])).await;
    let (server, db) = create_test_server(&feed.url, None).await;

    sqlx::raw_sql("DROP TABLE news_articles")
        .execute(db.pool())
        .await
        .unwrap();

    let response = server.post("/trigger-batch").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("database error"));
}

#[tokio::test]
async fn test_list_news_order_and_limit() {
    let feed = StubFeed::start(rss(&[])).await;
    let (server, db) = create_test_server(&feed.url, None).await;
    seed(&db, 15).await;

    let response = server.get("/news").await;
    response.assert_status_ok();
    let articles = response.json::<Vec<Value>>();
    assert_eq!(articles.len(), 10);
    assert_eq!(articles[0]["title"], "Article 14");
    assert_eq!(articles[9]["title"], "Article 5");
    assert_eq!(articles[0]["original_url"], "https://news.example.com/14");
    assert_eq!(articles[0]["summary"], "summary");
    assert!(articles[0]["published_at"]
        .as_str()
        .unwrap()
        .starts_with("2025-06-15T00:00:00"));

    let response = server.get("/news").add_query_param("limit", 3).await;
    let articles = response.json::<Vec<Value>>();
    assert_eq!(articles.len(), 3);
    assert_eq!(articles[2]["title"], "Article 12");
}

#[tokio::test]
async fn test_list_news_empty() {
    let feed = StubFeed::start(rss(&[])).await;
    let (server, _db) = create_test_server(&feed.url, None).await;

    let response = server.get("/news").await;
    response.assert_status_ok();
    assert!(response.json::<Vec<Value>>().is_empty());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let feed = StubFeed::start(rss(&[])).await;
    let (server, _db) = create_test_server(&feed.url, None).await;

    server
        .get("/does-not-exist")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

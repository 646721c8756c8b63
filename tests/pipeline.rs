//! Ingestion pipeline tests against stub feed and generation servers.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, TimeZone, Utc};

use common::{
    closed_url, orchestrator, orchestrator_with_timeout, rss, Item, StubFeed, StubGemini,
    FAIL_MARKER, SLOW_MARKER, STUB_SUMMARY,
};
use news_batcher::summarizer::{ERROR_SUMMARY_PREFIX, NO_SUMMARY};
use news_batcher::{ArticleRepository, BatcherError, Database, NewArticle, RunPhase};

#[tokio::test]
async fn test_end_to_end_skips_known_url() {
    let db = Database::open_in_memory().await.unwrap();
    let repo = ArticleRepository::new(db.pool());
    repo.create(&NewArticle::new(
        "Existing A",
        "https://news.example.com/a",
        "old summary",
        Utc::now(),
    ))
    .await
    .unwrap();

    let feed = StubFeed::start(rss(&[
        Item::new("Story A", "https://news.example.com/a"),
        Item::new("Story B", "https://news.example.com/b"),
    ]))
    .await;
    let gemini = StubGemini::start().await;
    let orch = orchestrator(&feed.url, Some(&gemini), &db).await;

    let report = orch.run_once(10).await.unwrap();
    assert_eq!(report.phase, RunPhase::Done);
    assert_eq!(report.new_articles, 1);
    assert_eq!(report.duplicates_skipped, 1);

    // Only B reached the generation API
    assert_eq!(gemini.generate_calls(), 1);
    assert!(gemini.prompts()[0].contains("Story B"));

    assert_eq!(repo.count_by_url("https://news.example.com/a").await.unwrap(), 1);
    assert_eq!(repo.count_by_url("https://news.example.com/b").await.unwrap(), 1);

    let articles = repo.list_recent(10).await.unwrap();
    let b = articles
        .iter()
        .find(|a| a.original_url == "https://news.example.com/b")
        .unwrap();
    assert_eq!(b.title, "Story B");
    assert_eq!(b.summary.as_deref(), Some(STUB_SUMMARY));
    assert_eq!(
        b.published_at,
        Some(Utc.with_ymd_and_hms(2025, 6, 10, 4, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let db = Database::open_in_memory().await.unwrap();
    let feed = StubFeed::start(rss(&[
        Item::new("One", "https://news.example.com/1"),
        Item::new("Two", "https://news.example.com/2"),
    ]))
    .await;
    let gemini = StubGemini::start().await;
    let orch = orchestrator(&feed.url, Some(&gemini), &db).await;

    assert_eq!(orch.run_once(10).await.unwrap().new_articles, 2);
    let calls_after_first = gemini.generate_calls();

    let second = orch.run_once(10).await.unwrap();
    assert_eq!(second.new_articles, 0);
    assert_eq!(second.duplicates_skipped, 2);
    assert_eq!(gemini.generate_calls(), calls_after_first);

    let repo = ArticleRepository::new(db.pool());
    assert_eq!(repo.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_limit_caps_evaluation_and_generation() {
    let db = Database::open_in_memory().await.unwrap();
    let repo = ArticleRepository::new(db.pool());
    // First entry is already known; it still counts toward the cap.
    repo.create(&NewArticle::new(
        "Known",
        "https://news.example.com/0",
        "s",
        Utc::now(),
    ))
    .await
    .unwrap();

    let items: Vec<String> = (0..6).map(|i| format!("https://news.example.com/{i}")).collect();
    let titles: Vec<String> = (0..6).map(|i| format!("Story {i}")).collect();
    let feed_items: Vec<Item<'_>> = items
        .iter()
        .zip(titles.iter())
        .map(|(link, title)| Item::new(title, link))
        .collect();

    let feed = StubFeed::start(rss(&feed_items)).await;
    let gemini = StubGemini::start().await;
    let orch = orchestrator(&feed.url, Some(&gemini), &db).await;

    let report = orch.run_once(3).await.unwrap();
    assert_eq!(report.entries_fetched, 6);
    assert_eq!(report.entries_evaluated, 3);
    assert_eq!(report.duplicates_skipped, 1);
    assert_eq!(report.new_articles, 2);
    assert!(gemini.generate_calls() <= 3);
    assert_eq!(gemini.generate_calls(), 2);

    assert!(repo.exists_by_url("https://news.example.com/2").await.unwrap());
    assert!(!repo.exists_by_url("https://news.example.com/3").await.unwrap());
}

#[tokio::test]
async fn test_unparseable_date_falls_back_to_now() {
    let db = Database::open_in_memory().await.unwrap();
    let feed = StubFeed::start(rss(&[
        Item::new("Odd date", "https://news.example.com/odd").with_pub_date(Some("someday soon")),
        Item::new("No date", "https://news.example.com/none").with_pub_date(None),
    ]))
    .await;
    let orch = orchestrator(&feed.url, None, &db).await;

    let before = Utc::now() - Duration::seconds(1);
    let report = orch.run_once(10).await.unwrap();
    let after = Utc::now() + Duration::seconds(1);
    assert_eq!(report.new_articles, 2);

    let repo = ArticleRepository::new(db.pool());
    for article in repo.list_recent(10).await.unwrap() {
        let published = article.published_at.unwrap();
        assert!(published >= before && published <= after, "{published}");
    }
}

#[tokio::test]
async fn test_one_failed_summary_does_not_abort_run() {
    let db = Database::open_in_memory().await.unwrap();
    let title = format!("Troubled {FAIL_MARKER}");
    let feed = StubFeed::start(rss(&[
        Item::new("Fine one", "https://news.example.com/1"),
        Item::new(&title, "https://news.example.com/2"),
        Item::new("Fine two", "https://news.example.com/3"),
    ]))
    .await;
    let gemini = StubGemini::start().await;
    let orch = orchestrator(&feed.url, Some(&gemini), &db).await;

    let report = orch.run_once(10).await.unwrap();
    assert_eq!(report.phase, RunPhase::Done);
    assert_eq!(report.new_articles, 3);
    assert_eq!(gemini.generate_calls(), 3);

    let repo = ArticleRepository::new(db.pool());
    let articles = repo.list_recent(10).await.unwrap();
    assert_eq!(articles.len(), 3);

    let failed: Vec<_> = articles
        .iter()
        .filter(|a| {
            a.summary
                .as_deref()
                .is_some_and(|s| s.starts_with(ERROR_SUMMARY_PREFIX))
        })
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].original_url, "https://news.example.com/2");
    assert!(failed[0]
        .summary
        .as_deref()
        .unwrap()
        .contains("backend exploded"));
}

#[tokio::test]
async fn test_hung_generation_times_out_and_run_commits() {
    let db = Database::open_in_memory().await.unwrap();
    let title = format!("Stalled {SLOW_MARKER}");
    let feed = StubFeed::start(rss(&[
        Item::new(&title, "https://news.example.com/1"),
        Item::new("Answered", "https://news.example.com/2"),
    ]))
    .await;
    let gemini = StubGemini::start().await;
    let orch = orchestrator_with_timeout(&feed.url, Some(&gemini), &db, 1).await;

    let started = std::time::Instant::now();
    let report = orch.run_once(10).await.unwrap();
    assert!(started.elapsed() < common::SLOW_DELAY);
    assert_eq!(report.phase, RunPhase::Done);
    assert_eq!(report.new_articles, 2);

    let repo = ArticleRepository::new(db.pool());
    let articles = repo.list_recent(10).await.unwrap();
    let stalled = articles
        .iter()
        .find(|a| a.original_url == "https://news.example.com/1")
        .unwrap();
    assert!(stalled
        .summary
        .as_deref()
        .unwrap()
        .starts_with(ERROR_SUMMARY_PREFIX));
    let answered = articles
        .iter()
        .find(|a| a.original_url == "https://news.example.com/2")
        .unwrap();
    assert_eq!(answered.summary.as_deref(), Some(STUB_SUMMARY));
}

#[tokio::test]
async fn test_malformed_feed_ingests_recoverable_items() {
    let db = Database::open_in_memory().await.unwrap();
    let mut body = rss(&[
        Item::new("Rates held", "https://news.example.com/1"),
        Item::new("Tom & Jerry", "https://news.example.com/2?a=1&b=2"),
        Item::new("Cut off", "https://news.example.com/3"),
    ]);
    // Drop the closing markup of the last item.
    let cut = body.rfind("<description>").unwrap();
    body.truncate(cut);
    let feed = StubFeed::start(body).await;
    let orch = orchestrator(&feed.url, None, &db).await;

    let report = orch.run_once(10).await.unwrap();
    assert_eq!(report.phase, RunPhase::Done);
    assert_eq!(report.entries_fetched, 2);
    assert_eq!(report.new_articles, 2);

    let repo = ArticleRepository::new(db.pool());
    assert!(repo
        .exists_by_url("https://news.example.com/2?a=1&b=2")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_disabled_summarizer_stores_placeholder() {
    let db = Database::open_in_memory().await.unwrap();
    let feed = StubFeed::start(rss(&[Item::new("One", "https://news.example.com/1")])).await;
    let orch = orchestrator(&feed.url, None, &db).await;

    assert_eq!(orch.run_once(10).await.unwrap().new_articles, 1);

    let repo = ArticleRepository::new(db.pool());
    let article = &repo.list_recent(1).await.unwrap()[0];
    assert_eq!(article.summary.as_deref(), Some(NO_SUMMARY));
}

#[tokio::test]
async fn test_entries_without_link_are_skipped() {
    let db = Database::open_in_memory().await.unwrap();
    let feed = StubFeed::start(rss(&[
        Item::new("Linkless", ""),
        Item::new("Linked", "https://news.example.com/1"),
    ]))
    .await;
    let orch = orchestrator(&feed.url, None, &db).await;

    let report = orch.run_once(10).await.unwrap();
    assert_eq!(report.missing_links, 1);
    assert_eq!(report.new_articles, 1);
}

#[tokio::test]
async fn test_http_error_aborts_with_zero() {
    let db = Database::open_in_memory().await.unwrap();
    let feed = StubFeed::start(rss(&[Item::new("One", "https://news.example.com/1")])).await;
    feed.set_status(StatusCode::FORBIDDEN);
    let gemini = StubGemini::start().await;
    let orch = orchestrator(&feed.url, Some(&gemini), &db).await;

    let report = orch.run_once(10).await.unwrap();
    assert_eq!(report.phase, RunPhase::Aborted);
    assert_eq!(report.new_articles, 0);
    assert!(report.abort_reason.unwrap().contains("403"));
    assert_eq!(gemini.generate_calls(), 0);

    // The feed recovers; the next run ingests normally.
    feed.set_status(StatusCode::OK);
    assert_eq!(orch.run_once(10).await.unwrap().new_articles, 1);
}

#[tokio::test]
async fn test_unreachable_feed_aborts_with_zero() {
    let db = Database::open_in_memory().await.unwrap();
    let orch = orchestrator(&closed_url().await, None, &db).await;

    let report = orch.run_once(10).await.unwrap();
    assert_eq!(report.phase, RunPhase::Aborted);
    assert_eq!(report.new_articles, 0);
}

#[tokio::test]
async fn test_empty_and_malformed_feeds_abort_with_zero() {
    let db = Database::open_in_memory().await.unwrap();
    let feed = StubFeed::start(rss(&[])).await;
    let orch = orchestrator(&feed.url, None, &db).await;

    let report = orch.run_once(10).await.unwrap();
    assert_eq!(report.phase, RunPhase::Aborted);
    assert_eq!(report.new_articles, 0);
    assert_eq!(report.entries_fetched, 0);

    feed.set_body("<html><body>Service Unavailable".to_string());
    let report = orch.run_once(10).await.unwrap();
    assert_eq!(report.phase, RunPhase::Aborted);
    assert_eq!(report.new_articles, 0);
}

#[tokio::test]
async fn test_commit_failure_persists_nothing() {
    let db = Database::open_in_memory().await.unwrap();
    let feed = StubFeed::start(rss(&[
        Item::new("One", "https://news.example.com/1"),
        Item::new("Two", "https://news.example.com/2"),
    ]))
    .await;
    let orch = orchestrator(&feed.url, None, &db).await;

    sqlx::raw_sql(
        "CREATE TRIGGER reject_second BEFORE INSERT ON news_articles
         WHEN (SELECT COUNT(*) FROM news_articles) >= 1
         BEGIN SELECT RAISE(ABORT, 'storage rejected'); END;",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let err = orch.run_once(10).await.unwrap_err();
    assert!(matches!(err, BatcherError::Database(_)));

    let repo = ArticleRepository::new(db.pool());
    assert_eq!(repo.count().await.unwrap(), 0);

    let last = orch.last_report().await.unwrap();
    assert_eq!(last.phase, RunPhase::Aborted);
    assert_eq!(last.new_articles, 0);
}

#[tokio::test]
async fn test_concurrent_runs_do_not_duplicate() {
    let db = Database::open_in_memory().await.unwrap();
    let feed = StubFeed::start(rss(&[
        Item::new("One", "https://news.example.com/1"),
        Item::new("Two", "https://news.example.com/2"),
    ]))
    .await;
    let gemini = StubGemini::start().await;
    let orch = orchestrator(&feed.url, Some(&gemini), &db).await;

    let (a, b) = tokio::join!(orch.run_once(10), orch.run_once(10));
    let total = a.unwrap().new_articles + b.unwrap().new_articles;
    assert_eq!(total, 2);

    let repo = ArticleRepository::new(db.pool());
    assert_eq!(repo.count().await.unwrap(), 2);
    assert_eq!(gemini.generate_calls(), 2);
}

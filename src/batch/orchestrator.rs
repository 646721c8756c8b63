//! One ingestion run: fetch, filter, summarize, commit.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::article::{ArticleStore, NewArticle};
use crate::datetime::published_or;
use crate::feed::FeedFetcher;
use crate::summarizer::Summarizer;
use crate::Result;

/// Phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Not started.
    Idle,
    /// Retrieving the feed.
    Fetching,
    /// Filtering entries and generating summaries.
    Summarizing,
    /// Persisting staged articles.
    Committing,
    /// Finished successfully.
    Done,
    /// Stopped early; see `abort_reason`.
    Aborted,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Fetching => "fetching",
            RunPhase::Summarizing => "summarizing",
            RunPhase::Committing => "committing",
            RunPhase::Done => "done",
            RunPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Final phase (`Done` or `Aborted` once the run has returned).
    pub phase: RunPhase,
    /// Item limit the run was started with.
    pub limit: usize,
    /// Entries the feed returned.
    pub entries_fetched: usize,
    /// Entries examined, capped at `limit`.
    pub entries_evaluated: usize,
    /// Entries skipped because their URL was already known.
    pub duplicates_skipped: usize,
    /// Entries skipped because they carried no link.
    pub missing_links: usize,
    /// Articles persisted.
    pub new_articles: usize,
    /// Why the run stopped early.
    pub abort_reason: Option<String>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    fn new(limit: usize) -> Self {
        Self {
            phase: RunPhase::Idle,
            limit,
            entries_fetched: 0,
            entries_evaluated: 0,
            duplicates_skipped: 0,
            missing_links: 0,
            new_articles: 0,
            abort_reason: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!(from = %self.phase, to = %phase, "Run phase transition");
        self.phase = phase;
    }

    fn finish(&mut self) {
        self.enter(RunPhase::Done);
        self.finished_at = Some(Utc::now());
    }

    fn abort(&mut self, reason: impl Into<String>) {
        self.enter(RunPhase::Aborted);
        self.new_articles = 0;
        self.abort_reason = Some(reason.into());
        self.finished_at = Some(Utc::now());
    }

    /// Whether the run completed.
    pub fn is_done(&self) -> bool {
        self.phase == RunPhase::Done
    }
}

/// Drives ingestion runs.
///
/// Runs are serialized: a run started while another is in progress waits for
/// it to finish. This only holds within one process.
pub struct Orchestrator {
    fetcher: FeedFetcher,
    summarizer: Arc<Summarizer>,
    store: ArticleStore,
    run_lock: Mutex<()>,
    last_report: RwLock<Option<RunReport>>,
}

impl Orchestrator {
    /// Create an orchestrator.
    pub fn new(fetcher: FeedFetcher, summarizer: Arc<Summarizer>, store: ArticleStore) -> Self {
        Self {
            fetcher,
            summarizer,
            store,
            run_lock: Mutex::new(()),
            last_report: RwLock::new(None),
        }
    }

    /// The report of the most recent finished run.
    pub async fn last_report(&self) -> Option<RunReport> {
        self.last_report.read().await.clone()
    }

    /// Execute one run over at most `limit` feed entries.
    ///
    /// Feed failures abort the run and return `Ok` with zero new articles.
    /// Store failures (duplicate lookup or commit) return `Err` and nothing
    /// from the run is persisted.
    pub async fn run_once(&self, limit: usize) -> Result<RunReport> {
        let _guard = self.run_lock.lock().await;

        let mut report = RunReport::new(limit);
        info!(limit, feed = %self.fetcher.url(), "Batch run started");

        let result = self.execute(&mut report).await;
        match &result {
            Ok(()) if report.is_done() => info!(
                phase = %report.phase,
                new_articles = report.new_articles,
                skipped = report.duplicates_skipped,
                evaluated = report.entries_evaluated,
                "Batch run completed"
            ),
            Ok(()) => warn!(
                phase = %report.phase,
                reason = report.abort_reason.as_deref().unwrap_or_default(),
                "Batch run aborted"
            ),
            Err(e) => error!(phase = %report.phase, "Batch run failed: {}", e),
        }

        *self.last_report.write().await = Some(report.clone());
        result.map(|()| report)
    }

    async fn execute(&self, report: &mut RunReport) -> Result<()> {
        report.enter(RunPhase::Fetching);
        let entries = match self.fetcher.fetch().await {
            Ok(entries) => entries,
            Err(e) => {
                if e.is_network_or_http() {
                    error!("Feed retrieval failed: {}", e);
                } else {
                    warn!("Feed retrieval returned nothing: {}", e);
                }
                report.abort(e.to_string());
                return Ok(());
            }
        };
        report.entries_fetched = entries.len();
        debug!(count = entries.len(), "Feed entries fetched");

        report.enter(RunPhase::Summarizing);
        let mut session = self.store.session();

        for entry in entries.iter().take(report.limit) {
            report.entries_evaluated += 1;

            let published_at = published_or(&entry.published, Utc::now());

            if !entry.has_link() {
                warn!(title = %entry.title, "Skipping entry without link");
                report.missing_links += 1;
                continue;
            }

            match session.exists(&entry.link).await {
                Ok(true) => {
                    info!(title = %entry.title, "Skipping duplicate");
                    report.duplicates_skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    report.abort(format!("duplicate lookup failed: {e}"));
                    return Err(e);
                }
            }

            let summary = self.summarizer.summarize(&entry.title, &entry.snippet).await;
            session.add(NewArticle::new(
                entry.title.clone(),
                entry.link.clone(),
                summary,
                published_at,
            ));
        }

        report.enter(RunPhase::Committing);
        debug!(pending = session.pending_count(), "Committing staged articles");
        match session.commit().await {
            Ok(count) => {
                report.new_articles = count;
                report.finish();
                Ok(())
            }
            Err(e) => {
                report.abort(format!("commit failed: {e}"));
                Err(e)
            }
        }
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("feed", &self.fetcher.url())
            .field("summarizer", &self.summarizer.model())
            .finish()
    }
}

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};

use news_batcher::{
    ArticleStore, BatchScheduler, Config, Database, FeedFetcher, Orchestrator, Result, Summarizer,
    WebServer,
};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let config = match Config::load_with_env(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = news_batcher::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        news_batcher::logging::init_console_only(&config.logging.level);
    }

    info!("News Batcher starting");

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let db = Database::open(&config.database.path).await?;
    let fetcher = FeedFetcher::new(&config.feed)?;
    let summarizer = Arc::new(Summarizer::from_config(&config.summarizer).await?);
    let orchestrator = Arc::new(Orchestrator::new(
        fetcher,
        summarizer,
        ArticleStore::new(db.pool().clone()),
    ));

    let mut scheduler = BatchScheduler::new(config.schedule.clone(), Arc::clone(&orchestrator)).await?;
    scheduler.start().await?;

    let server = WebServer::new(&config.server, &config.schedule, db.clone(), orchestrator)?;
    let served = server.run(shutdown_signal()).await;

    if let Err(e) = scheduler.shutdown().await {
        warn!("Failed to stop scheduler cleanly: {}", e);
    }
    db.close().await;
    info!("News Batcher stopped");

    served
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

use std::{sync::Arc, time::Duration};

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use wreckage::{
    cache::{RedisCache, SharedCache},
    config::Config,
    error::Error,
    esi::{EsiClient, EsiTracker},
    model::killmail::KillmailReference,
    scheduler::{
        cron::start_scheduler, refresh::RefreshTarget, Alliances, Characters, Corporations,
        Refresher,
    },
    service::killmail::{
        history::{HistoryConfig, HistoryExporter},
        recalculate::{dispatch, DispatchConfig},
        Notifier,
    },
    startup,
    worker::{
        ImportHandler, KillmailQueue, KillmailQueueConfig, MessageHandler, RecalculateHandler,
        WorkerPool, WorkerPoolConfig,
    },
};

#[derive(Parser)]
#[command(name = "wreckage", version, about = "Killmail ingestion and enrichment for EVE Online")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import killmails from the processing queue and run the market price cron job
    Ingress {
        /// Killmails processed at once
        #[arg(long, default_value_t = 4)]
        workers: usize,
        /// Milliseconds to pause after each killmail
        #[arg(long, default_value_t = 0)]
        sleep: u64,
    },
    /// Queue killmail references from the killboard history, newest day first
    Egress {
        /// Oldest day to export (YYYYMMDD)
        #[arg(long, value_parser = parse_date)]
        mindate: NaiveDate,
        /// Newest day to export (YYYYMMDD), defaults to today
        #[arg(long, value_parser = parse_date)]
        maxdate: Option<NaiveDate>,
        /// Wait after each day until the queue is shorter than this
        #[arg(long)]
        datehold: Option<u64>,
    },
    /// Re-derive values and flags of every stored killmail
    Recalculate {
        #[arg(long, default_value_t = 4)]
        workers: usize,
        #[arg(long, default_value_t = 0)]
        sleep: u64,
        /// Start after this killmail ID
        #[arg(long, default_value_t = 0)]
        after: i64,
        /// Queue length at which the dispatcher waits
        #[arg(long, default_value_t = 1000)]
        trigger: u64,
    },
    /// Keep alliances, corporations and characters current
    Refresh,
    /// Queue a single killmail (`id:hash`)
    Add {
        #[arg(value_parser = parse_reference)]
        reference: KillmailReference,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|e| format!("expected a YYYYMMDD date: {e}"))
}

fn parse_reference(value: &str) -> Result<KillmailReference, String> {
    let (id, hash) = value
        .split_once(':')
        .ok_or_else(|| "expected id:hash".to_string())?;
    let id = id
        .parse::<i64>()
        .map_err(|e| format!("invalid killmail id: {e}"))?;

    if hash.is_empty() {
        return Err("killmail hash is empty".to_string());
    }

    Ok(KillmailReference::new(id, hash))
}

struct App {
    config: Config,
    db: DatabaseConnection,
    valkey: fred::prelude::Pool,
    cache: SharedCache,
    esi: EsiClient,
}

impl App {
    fn queue(&self, queue: KillmailQueueConfig) -> KillmailQueue {
        KillmailQueue::new(self.valkey.clone(), queue)
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, config).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command, config: Config) -> Result<(), Error> {
    let esi = startup::build_esi_client(&config, EsiTracker::new())?;
    let db = startup::connect_to_database(&config).await?;
    let valkey = startup::connect_to_valkey(&config).await?;
    let cache: SharedCache = Arc::new(RedisCache::new(valkey.clone()));

    let app = App {
        config,
        db,
        valkey,
        cache,
        esi,
    };

    match command {
        Command::Ingress { workers, sleep } => ingress(&app, workers, sleep).await,
        Command::Egress {
            mindate,
            maxdate,
            datehold,
        } => egress(&app, mindate, maxdate, datehold).await,
        Command::Recalculate {
            workers,
            sleep,
            after,
            trigger,
        } => recalculate(&app, workers, sleep, after, trigger).await,
        Command::Refresh => refresh(&app).await,
        Command::Add { reference } => add(&app, reference).await,
    }
}

async fn ingress(app: &App, workers: usize, sleep: u64) -> Result<(), Error> {
    let queue = app.queue(
        KillmailQueueConfig::processing().with_max_attempts(app.config.max_fetch_attempts),
    );

    let mut handler = ImportHandler::new(app.db.clone(), app.cache.clone(), app.esi.clone());
    let mut publisher = None;
    if app.config.notifier_enabled {
        let (notifier, handle) = Notifier::spawn(
            Arc::new(RedisCache::new(app.valkey.clone())),
            app.config.notifier_value_threshold,
        );
        handler = handler.with_notifier(notifier);
        publisher = Some(handle);
    }

    let mut scheduler = start_scheduler(&app.db, &app.esi).await?;

    let pool = WorkerPool::new(
        WorkerPoolConfig::new(workers).with_message_sleep(sleep),
        queue,
        Arc::new(handler),
    );
    pool.start().await?;

    wait_for_shutdown().await;

    pool.stop().await?;
    scheduler.shutdown().await?;
    if let Some(publisher) = publisher {
        publisher.abort();
    }

    Ok(())
}

async fn egress(
    app: &App,
    mindate: NaiveDate,
    maxdate: Option<NaiveDate>,
    datehold: Option<u64>,
) -> Result<(), Error> {
    let queue = app.queue(KillmailQueueConfig::processing());

    let mut config = HistoryConfig::new(&app.config.history_url, &app.config.user_agent);
    if let Some(threshold) = datehold {
        config = config.with_hold_threshold(threshold);
    }

    let newest = maxdate.unwrap_or_else(|| Utc::now().date_naive());
    let queued = HistoryExporter::new(&queue, config)?
        .export(mindate, newest)
        .await?;

    tracing::info!(queued, %mindate, %newest, "killboard history export finished");

    Ok(())
}

async fn recalculate(
    app: &App,
    workers: usize,
    sleep: u64,
    after: i64,
    trigger: u64,
) -> Result<(), Error> {
    let queue = app.queue(KillmailQueueConfig::recalculate());

    let handler: Arc<dyn MessageHandler> = Arc::new(RecalculateHandler::new(
        app.db.clone(),
        app.cache.clone(),
        app.esi.clone(),
    ));
    let pool = WorkerPool::new(
        WorkerPoolConfig::new(workers).with_message_sleep(sleep),
        queue.clone(),
        handler,
    );
    pool.start().await?;

    let config = DispatchConfig {
        after_id: after,
        trigger,
        ..Default::default()
    };
    let dispatched = dispatch(&app.db, &queue, &config).await?;
    tracing::info!(dispatched, "all killmails dispatched for recalculation");

    while !queue.is_empty().await? || pool.active_job_count() > 0 {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    pool.stop().await
}

async fn refresh(app: &App) -> Result<(), Error> {
    let refreshers = [
        spawn_refresher::<Alliances>(app),
        spawn_refresher::<Corporations>(app),
        spawn_refresher::<Characters>(app),
    ];

    wait_for_shutdown().await;

    for refresher in refreshers {
        refresher.abort();
    }

    Ok(())
}

/// Runs the refresh loop of one entity kind on its own task
fn spawn_refresher<T: RefreshTarget + 'static>(app: &App) -> JoinHandle<()> {
    let db = app.db.clone();
    let cache = app.cache.clone();
    let esi = app.esi.clone();

    tokio::spawn(async move {
        Refresher::new(&db, cache.as_ref(), &esi).run::<T>().await;
    })
}

async fn add(app: &App, reference: KillmailReference) -> Result<(), Error> {
    let queue = app.queue(KillmailQueueConfig::processing());
    let score = reference.id as f64;

    if queue.push(&reference, score).await? {
        tracing::info!(killmail_id = reference.id, "killmail queued");
    } else {
        tracing::info!(killmail_id = reference.id, "killmail already queued");
    }

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Unable to listen for shutdown signal: {}", e);
        return;
    }

    tracing::info!("Shutdown signal received");
}

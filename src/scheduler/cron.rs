//! Cron jobs run alongside the importer.

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{error::Error, esi::EsiClient, service::market::MarketIngestService};

/// Daily at 11:30 UTC, after ESI downtime has settled
pub const MARKET_PRICES_CRON: &str = "0 30 11 * * *";

/// Registers the cron jobs and starts the scheduler.
///
/// The returned scheduler must be kept alive for the jobs to keep running.
pub async fn start_scheduler(
    db: &DatabaseConnection,
    esi: &EsiClient,
) -> Result<JobScheduler, Error> {
    let sched = JobScheduler::new().await?;

    let db_clone = db.clone();
    let esi_clone = esi.clone();

    sched
        .add(Job::new_async(MARKET_PRICES_CRON, move |_, _| {
            let db = db_clone.clone();
            let esi = esi_clone.clone();

            Box::pin(async move {
                let today = Utc::now().date_naive();

                match MarketIngestService::new(&db, &esi).ingest_prices(today).await {
                    Ok(count) => tracing::info!("Stored {} market price(s) for {}", count, today),
                    Err(e) => tracing::error!("Error ingesting market prices: {}", e),
                }
            })
        })?)
        .await?;

    sched.start().await?;

    Ok(sched)
}

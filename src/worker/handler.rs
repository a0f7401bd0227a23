//! Message handlers run by the worker pool.
//!
//! A handler turns one killmail reference into a [`Disposition`] telling the pool what to do
//! with the queue entry. Handlers own their connections and build the borrowing services per
//! message.

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::{
    cache::SharedCache,
    error::Error,
    esi::EsiClient,
    model::killmail::KillmailReference,
    service::killmail::{ImportOutcome, KillmailPipeline, Notifier, Recalculator},
};

/// What the pool does with a reference after its handler returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Finished, attempt bookkeeping is cleared
    Done,
    /// Handed back to the queue, dead-lettered once attempts run out
    Requeue { reason: String },
    /// Parked in the invalid set and never retried
    Invalid,
}

#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, reference: &KillmailReference) -> Result<Disposition, Error>;
}

/// Imports killmails from the processing queue
pub struct ImportHandler {
    db: DatabaseConnection,
    cache: SharedCache,
    esi: EsiClient,
    notifier: Option<Notifier>,
}

impl ImportHandler {
    pub fn new(db: DatabaseConnection, cache: SharedCache, esi: EsiClient) -> Self {
        Self {
            db,
            cache,
            esi,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

#[async_trait]
impl MessageHandler for ImportHandler {
    async fn handle(&self, reference: &KillmailReference) -> Result<Disposition, Error> {
        tracing::debug!(killmail_id = reference.id, "Processing killmail import");

        self.esi.tracker().gate_keeper().await;

        let mut pipeline = KillmailPipeline::new(&self.db, self.cache.as_ref(), &self.esi);
        if let Some(notifier) = &self.notifier {
            pipeline = pipeline.with_notifier(notifier);
        }

        let outcome = pipeline.import(reference).await.map_err(|e| {
            tracing::error!(killmail_id = reference.id, "Failed to import killmail: {}", e);
            e
        })?;

        Ok(match outcome {
            ImportOutcome::Imported(_) | ImportOutcome::Skipped => Disposition::Done,
            ImportOutcome::Requeue { reason } => Disposition::Requeue { reason },
            ImportOutcome::Invalid => Disposition::Invalid,
        })
    }
}

/// Re-derives stored killmails from the recalculation queue
pub struct RecalculateHandler {
    db: DatabaseConnection,
    cache: SharedCache,
    esi: EsiClient,
}

impl RecalculateHandler {
    pub fn new(db: DatabaseConnection, cache: SharedCache, esi: EsiClient) -> Self {
        Self { db, cache, esi }
    }
}

#[async_trait]
impl MessageHandler for RecalculateHandler {
    async fn handle(&self, reference: &KillmailReference) -> Result<Disposition, Error> {
        tracing::debug!(killmail_id = reference.id, "Processing killmail recalculation");

        self.esi.tracker().gate_keeper().await;

        Recalculator::new(&self.db, self.cache.as_ref(), &self.esi)
            .recalculate(reference)
            .await
            .map_err(|e| {
                tracing::error!(
                    killmail_id = reference.id,
                    "Failed to recalculate killmail: {}",
                    e
                );
                e
            })?;

        Ok(Disposition::Done)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wreckage_test_utils::{fixtures::eve::mockito, prelude::*};

    use super::*;
    use crate::{cache::MemoryCache, esi::test_client};

    const KILLMAIL_ID: i64 = 117654321;
    const HASH: &str = "0a1b2c3d4e5f";

    fn handler(test: &TestContext) -> ImportHandler {
        ImportHandler::new(
            test.db.clone(),
            Arc::new(MemoryCache::new()),
            test_client(&test.server_url()),
        )
    }

    #[tokio::test]
    async fn unprocessable_hash_is_invalid() {
        let test = TestBuilder::new()
            .with_killmail_tables()
            .with_status_endpoint(&mockito::killmail_path(KILLMAIL_ID, HASH), 422, 1)
            .build()
            .await
            .unwrap();

        let disposition = handler(&test)
            .handle(&KillmailReference::new(KILLMAIL_ID, HASH))
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Invalid);
        test.assert_mocks();
    }

    #[tokio::test]
    async fn outage_requeues() {
        let test = TestBuilder::new()
            .with_killmail_tables()
            .with_status_endpoint(&mockito::killmail_path(KILLMAIL_ID, HASH), 503, 3)
            .build()
            .await
            .unwrap();

        let disposition = handler(&test)
            .handle(&KillmailReference::new(KILLMAIL_ID, HASH))
            .await
            .unwrap();

        assert!(matches!(disposition, Disposition::Requeue { .. }));
        test.assert_mocks();
    }

    #[tokio::test]
    async fn stored_killmail_done() {
        let test = TestBuilder::new()
            .with_killmail_tables()
            .build()
            .await
            .unwrap();
        killmail::insert_killmail(&test.db, KILLMAIL_ID, HASH)
            .await
            .unwrap();

        let disposition = handler(&test)
            .handle(&KillmailReference::new(KILLMAIL_ID, HASH))
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Done);
    }

    #[tokio::test]
    async fn missing_killmail_recalculation_done() {
        let test = TestBuilder::new()
            .with_killmail_tables()
            .build()
            .await
            .unwrap();
        let handler = RecalculateHandler::new(
            test.db.clone(),
            Arc::new(MemoryCache::new()),
            test_client(&test.server_url()),
        );

        let disposition = handler
            .handle(&KillmailReference::new(KILLMAIL_ID, HASH))
            .await
            .unwrap();

        assert_eq!(disposition, Disposition::Done);
    }
}

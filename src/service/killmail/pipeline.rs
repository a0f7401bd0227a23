//! Killmail import.
//!
//! One reference at a time: dedupe against the store, fetch the body from ESI, prime every
//! referenced entity, price the ship and items, then write the killmail, victim, attackers and
//! items in a single transaction. Derived flags and values are written by a separate update
//! after the commit; a failed update leaves them zeroed for the recalculation sweep. The
//! outcome tells the worker what to do with the queue entry.

use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};

use super::{
    classify::classify,
    notify::Notifier,
    participant,
    prime::{PrimeTargets, Primer},
    value::{aggregate_values, item_tree, merge_items, price_items, unit_price},
};
use crate::{
    cache::Cache,
    data::{is_unique_violation, killmail::KillmailRepository},
    error::{Error, ResultExt},
    esi::{killmail::EsiKillmail, EsiClient},
    model::killmail::{KillmailFlags, KillmailGraph, KillmailReference, PricedItem},
    service::{eve::types::TypeService, market::PriceService},
};

#[derive(Debug)]
pub enum ImportOutcome {
    /// Stored with derived fields
    Imported(Box<entity::killmail::Model>),
    /// Already stored
    Skipped,
    /// ESI could not deliver the body, try again later
    Requeue { reason: String },
    /// ESI rejected the hash
    Invalid,
}

pub struct KillmailPipeline<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn Cache,
    esi: &'a EsiClient,
    notifier: Option<&'a Notifier>,
}

impl<'a> KillmailPipeline<'a> {
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn Cache, esi: &'a EsiClient) -> Self {
        Self {
            db,
            cache,
            esi,
            notifier: None,
        }
    }

    /// Announce imported killmails above the notifier's threshold
    pub fn with_notifier(mut self, notifier: &'a Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn import(&self, reference: &KillmailReference) -> Result<ImportOutcome, Error> {
        let killmail_id = reference.id;
        let repo = KillmailRepository::new(self.db);

        if repo
            .exists(killmail_id, &reference.hash)
            .await
            .context("unable to check for existing killmail")?
        {
            tracing::debug!(killmail_id, "killmail already stored, skipping");
            return Ok(ImportOutcome::Skipped);
        }

        let response = self.esi.get_killmail(killmail_id, &reference.hash).await;
        if response.meta.is_unprocessable() {
            tracing::warn!(killmail_id, hash = %reference.hash, "ESI rejected killmail hash");
            return Ok(ImportOutcome::Invalid);
        }

        let killmail = match response.into_result() {
            Ok((killmail, _)) => killmail,
            Err(e) => {
                tracing::warn!(killmail_id, "failed to fetch killmail: {}", e);
                return Ok(ImportOutcome::Requeue {
                    reason: e.to_string(),
                });
            }
        };

        Primer::new(self.db, self.cache, self.esi)
            .prime(killmail_id, &PrimeTargets::from_esi(&killmail))
            .await;

        // Everything that may hit the store outside the transaction happens first
        let date = killmail.killmail_time.date_naive();
        let prices = PriceService::new(self.db, self.cache, self.esi);
        let ship_value = unit_price(&prices, killmail.victim.ship_type_id, 0, date).await;
        let items = price_items(&prices, &killmail.victim.items, date).await;
        let values = aggregate_values(ship_value, &items);
        let flags = self.classify(&killmail).await;

        let created = match self
            .persist(&killmail, &reference.hash, &items, values.ship_value)
            .await
        {
            Ok(created) => created,
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!(killmail_id, "killmail stored concurrently, skipping");
                return Ok(ImportOutcome::Skipped);
            }
            Err(e) => {
                return Err(e).context(format!("unable to store killmail {killmail_id}"));
            }
        };

        let stored = match KillmailRepository::new(self.db)
            .update_derived(killmail_id, flags, values)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!(killmail_id, "failed to store killmail flags and values: {}", e);
                created
            }
        };

        tracing::info!(
            killmail_id,
            total_value = stored.total_value,
            is_npc = stored.is_npc,
            is_solo = stored.is_solo,
            is_awox = stored.is_awox,
            "imported killmail"
        );

        if let Some(notifier) = self.notifier {
            notifier.notify(&stored);
        }

        Ok(ImportOutcome::Imported(Box::new(stored)))
    }

    async fn classify(&self, killmail: &EsiKillmail) -> KillmailFlags {
        let types = TypeService::new(self.db, self.cache, self.esi);

        let victim = participant(
            &types,
            killmail.victim.corporation_id,
            Some(killmail.victim.ship_type_id),
        )
        .await;

        let mut attackers = Vec::with_capacity(killmail.attackers.len());
        for attacker in &killmail.attackers {
            attackers.push(participant(&types, attacker.corporation_id, attacker.ship_type_id).await);
        }

        classify(&victim, &attackers)
    }

    async fn persist(
        &self,
        killmail: &EsiKillmail,
        hash: &str,
        items: &[PricedItem],
        ship_value: f64,
    ) -> Result<entity::killmail::Model, DbErr> {
        let killmail_id = killmail.killmail_id;
        let txn = self.db.begin().await?;
        let repo = KillmailRepository::new(&txn);

        let created = repo.create(killmail, hash).await?;
        repo.create_victim(killmail_id, &killmail.victim, ship_value)
            .await?;
        repo.create_attackers(killmail_id, &killmail.attackers)
            .await?;
        repo.create_items(killmail_id, items).await?;

        txn.commit().await?;

        Ok(created)
    }

    /// Stored killmail with victim, attackers and merged items
    pub async fn full_killmail(&self, killmail_id: i64) -> Result<KillmailGraph, Error> {
        let repo = KillmailRepository::new(self.db);

        let killmail = repo
            .find_by_id(killmail_id)
            .await
            .context("unable to load killmail")?
            .ok_or(Error::NotFound {
                entity: "killmail",
                id: killmail_id,
            })?;

        let victim = repo
            .find_victim(killmail_id)
            .await
            .context("unable to load killmail victim")?;
        let attackers = repo
            .find_attackers(killmail_id)
            .await
            .context("unable to load killmail attackers")?;
        let rows = repo
            .find_items(killmail_id)
            .await
            .context("unable to load killmail items")?;

        Ok(KillmailGraph {
            killmail,
            victim,
            attackers,
            items: merge_items(&item_tree(&rows)),
        })
    }
}

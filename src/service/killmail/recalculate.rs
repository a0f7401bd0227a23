//! Recalculation sweep.
//!
//! The dispatcher walks every stored killmail by ascending ID and feeds them to the
//! recalculation queue in pages, holding off while the queue is still busy. Consumers re-prime
//! the referenced entities, re-price the ship and items and write back fresh flags and values.
//! Recalculating the same killmail twice yields the same row.

use std::time::Duration;

use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};

use super::{
    classify::classify,
    participant,
    prime::{PrimeTargets, Primer},
    value::{aggregate_values, item_tree, unit_price},
};
use crate::{
    cache::Cache,
    data::killmail::KillmailRepository,
    error::{Error, ResultExt},
    esi::EsiClient,
    model::killmail::{KillmailFlags, KillmailReference, KillmailValues},
    service::{eve::types::TypeService, market::PriceService},
    worker::queue::KillmailQueue,
};

/// Paging for [`dispatch`]
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Killmails read per page
    pub page_size: u64,
    /// Queue length at which the dispatcher waits
    pub trigger: u64,
    /// Start after this killmail ID
    pub after_id: i64,
    /// Wait between queue length checks
    pub poll_interval: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            trigger: 1000,
            after_id: 0,
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Queue every stored killmail after `config.after_id`, returns how many were dispatched.
pub async fn dispatch(
    db: &DatabaseConnection,
    queue: &KillmailQueue,
    config: &DispatchConfig,
) -> Result<u64, Error> {
    let repo = KillmailRepository::new(db);
    let mut cursor = config.after_id;
    let mut dispatched = 0;

    loop {
        while queue.len().await? >= config.trigger {
            tokio::time::sleep(config.poll_interval).await;
        }

        let page = repo
            .find_page(cursor, config.page_size)
            .await
            .context("unable to page killmails for recalculation")?;

        let Some(last) = page.last() else {
            break;
        };
        cursor = last.id;

        let entries: Vec<(KillmailReference, f64)> = page
            .iter()
            .map(|killmail| {
                (
                    KillmailReference::new(killmail.id, killmail.hash.clone()),
                    killmail.id as f64,
                )
            })
            .collect();

        queue.push_batch(&entries).await?;
        dispatched += entries.len() as u64;

        tracing::info!(cursor, dispatched, "dispatched killmails for recalculation");
    }

    Ok(dispatched)
}

pub struct Recalculator<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn Cache,
    esi: &'a EsiClient,
}

impl<'a> Recalculator<'a> {
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn Cache, esi: &'a EsiClient) -> Self {
        Self { db, cache, esi }
    }

    /// Recompute one killmail, `None` if it is not stored
    pub async fn recalculate(
        &self,
        reference: &KillmailReference,
    ) -> Result<Option<entity::killmail::Model>, Error> {
        let killmail_id = reference.id;
        let repo = KillmailRepository::new(self.db);

        let Some(killmail) = repo
            .find_by_id(killmail_id)
            .await
            .context("unable to load killmail")?
        else {
            tracing::warn!(killmail_id, "killmail queued for recalculation is not stored");
            return Ok(None);
        };

        let victim = repo
            .find_victim(killmail_id)
            .await
            .context("unable to load killmail victim")?;
        let attackers = repo
            .find_attackers(killmail_id)
            .await
            .context("unable to load killmail attackers")?;
        let mut items = repo
            .find_items(killmail_id)
            .await
            .context("unable to load killmail items")?;

        Primer::new(self.db, self.cache, self.esi)
            .prime(
                killmail_id,
                &PrimeTargets::from_stored(&killmail, victim.as_ref(), &attackers, &items),
            )
            .await;

        let date = killmail.killmail_time.date();
        let prices = PriceService::new(self.db, self.cache, self.esi);

        let ship_value = match &victim {
            Some(victim) => unit_price(&prices, victim.ship_type_id, 0, date).await,
            None => 0.0,
        };

        for item in items.iter_mut() {
            item.item_value = unit_price(&prices, item.item_type_id, item.singleton, date).await;
            item.total_value =
                item.item_value * (item.quantity_destroyed + item.quantity_dropped) as f64;
        }

        let values = aggregate_values(ship_value, &item_tree(&items));

        let types = TypeService::new(self.db, self.cache, self.esi);
        let victim_participant = match &victim {
            Some(victim) => {
                participant(&types, victim.corporation_id, Some(victim.ship_type_id)).await
            }
            None => Default::default(),
        };
        let mut attacker_participants = Vec::with_capacity(attackers.len());
        for attacker in &attackers {
            attacker_participants
                .push(participant(&types, attacker.corporation_id, attacker.ship_type_id).await);
        }
        let flags = classify(&victim_participant, &attacker_participants);

        let updated = self
            .store(killmail_id, victim.is_some(), &items, flags, values)
            .await
            .context(format!("unable to update killmail {killmail_id}"))?;

        tracing::debug!(killmail_id, total_value = updated.total_value, "recalculated killmail");

        Ok(Some(updated))
    }

    async fn store(
        &self,
        killmail_id: i64,
        has_victim: bool,
        items: &[entity::killmail_item::Model],
        flags: KillmailFlags,
        values: KillmailValues,
    ) -> Result<entity::killmail::Model, DbErr> {
        let txn = self.db.begin().await?;
        let repo = KillmailRepository::new(&txn);

        if has_victim {
            repo.update_ship_value(killmail_id, values.ship_value)
                .await?;
        }
        for item in items {
            repo.update_item_value(item.id, item.item_value, item.total_value)
                .await?;
        }
        let updated = repo.update_derived(killmail_id, flags, values).await?;

        txn.commit().await?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::{
    esi::killmail::{EsiAttacker, EsiKillmail, EsiVictim},
    model::killmail::{KillmailFlags, KillmailValues, PricedItem},
};

pub struct KillmailRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> KillmailRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Whether a killmail with this id and hash is already stored
    pub async fn exists(&self, killmail_id: i64, hash: &str) -> Result<bool, DbErr> {
        let count = entity::prelude::Killmail::find()
            .filter(entity::killmail::Column::Id.eq(killmail_id))
            .filter(entity::killmail::Column::Hash.eq(hash))
            .count(self.db)
            .await?;

        Ok(count > 0)
    }

    /// Insert the killmail row, derived fields start zeroed
    pub async fn create(
        &self,
        killmail: &EsiKillmail,
        hash: &str,
    ) -> Result<entity::killmail::Model, DbErr> {
        let now = Utc::now().naive_utc();

        entity::killmail::ActiveModel {
            id: ActiveValue::Set(killmail.killmail_id),
            hash: ActiveValue::Set(hash.to_string()),
            solar_system_id: ActiveValue::Set(killmail.solar_system_id),
            moon_id: ActiveValue::Set(killmail.moon_id),
            war_id: ActiveValue::Set(killmail.war_id),
            killmail_time: ActiveValue::Set(killmail.killmail_time.naive_utc()),
            is_npc: ActiveValue::Set(false),
            is_awox: ActiveValue::Set(false),
            is_solo: ActiveValue::Set(false),
            dropped_value: ActiveValue::Set(0.0),
            destroyed_value: ActiveValue::Set(0.0),
            fitted_value: ActiveValue::Set(0.0),
            total_value: ActiveValue::Set(0.0),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(self.db)
        .await
    }

    pub async fn create_victim(
        &self,
        killmail_id: i64,
        victim: &EsiVictim,
        ship_value: f64,
    ) -> Result<entity::killmail_victim::Model, DbErr> {
        entity::killmail_victim::ActiveModel {
            killmail_id: ActiveValue::Set(killmail_id),
            alliance_id: ActiveValue::Set(victim.alliance_id),
            character_id: ActiveValue::Set(victim.character_id),
            corporation_id: ActiveValue::Set(victim.corporation_id),
            faction_id: ActiveValue::Set(victim.faction_id),
            damage_taken: ActiveValue::Set(victim.damage_taken),
            ship_type_id: ActiveValue::Set(victim.ship_type_id),
            ship_value: ActiveValue::Set(ship_value),
            pos_x: ActiveValue::Set(victim.position.map(|p| p.x)),
            pos_y: ActiveValue::Set(victim.position.map(|p| p.y)),
            pos_z: ActiveValue::Set(victim.position.map(|p| p.z)),
        }
        .insert(self.db)
        .await
    }

    /// Bulk insert attackers
    pub async fn create_attackers(
        &self,
        killmail_id: i64,
        attackers: &[EsiAttacker],
    ) -> Result<(), DbErr> {
        if attackers.is_empty() {
            return Ok(());
        }

        let models = attackers
            .iter()
            .map(|attacker| entity::killmail_attacker::ActiveModel {
                killmail_id: ActiveValue::Set(killmail_id),
                alliance_id: ActiveValue::Set(attacker.alliance_id),
                character_id: ActiveValue::Set(attacker.character_id),
                corporation_id: ActiveValue::Set(attacker.corporation_id),
                faction_id: ActiveValue::Set(attacker.faction_id),
                damage_done: ActiveValue::Set(attacker.damage_done),
                final_blow: ActiveValue::Set(attacker.final_blow),
                security_status: ActiveValue::Set(attacker.security_status),
                ship_type_id: ActiveValue::Set(attacker.ship_type_id),
                weapon_type_id: ActiveValue::Set(attacker.weapon_type_id),
                ..Default::default()
            });

        entity::prelude::KillmailAttacker::insert_many(models)
            .exec_without_returning(self.db)
            .await?;

        Ok(())
    }

    /// Insert the item tree level by level.
    ///
    /// Containers are inserted one at a time to learn their row id for their contents, leaf
    /// items of each level go in a single bulk insert.
    pub async fn create_items(&self, killmail_id: i64, items: &[PricedItem]) -> Result<(), DbErr> {
        let mut pending: Vec<(Option<i64>, &[PricedItem])> = vec![(None, items)];

        while let Some((parent_id, level)) = pending.pop() {
            let mut leaves = Vec::new();

            for item in level {
                let model = item_model(killmail_id, parent_id, item);

                if item.items.is_empty() {
                    leaves.push(model);
                } else {
                    let container = model.insert(self.db).await?;
                    pending.push((Some(container.id), item.items.as_slice()));
                }
            }

            if !leaves.is_empty() {
                entity::prelude::KillmailItem::insert_many(leaves)
                    .exec_without_returning(self.db)
                    .await?;
            }
        }

        Ok(())
    }

    /// Write classification flags and value totals
    pub async fn update_derived(
        &self,
        killmail_id: i64,
        flags: KillmailFlags,
        values: KillmailValues,
    ) -> Result<entity::killmail::Model, DbErr> {
        entity::killmail::ActiveModel {
            id: ActiveValue::Unchanged(killmail_id),
            is_npc: ActiveValue::Set(flags.is_npc),
            is_solo: ActiveValue::Set(flags.is_solo),
            is_awox: ActiveValue::Set(flags.is_awox),
            dropped_value: ActiveValue::Set(values.dropped),
            destroyed_value: ActiveValue::Set(values.destroyed),
            fitted_value: ActiveValue::Set(values.fitted),
            total_value: ActiveValue::Set(values.total),
            updated_at: ActiveValue::Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .update(self.db)
        .await
    }

    /// Update the stored ship value of a victim
    pub async fn update_ship_value(&self, killmail_id: i64, ship_value: f64) -> Result<(), DbErr> {
        entity::killmail_victim::ActiveModel {
            killmail_id: ActiveValue::Unchanged(killmail_id),
            ship_value: ActiveValue::Set(ship_value),
            ..Default::default()
        }
        .update(self.db)
        .await?;

        Ok(())
    }

    /// Update an item's unit and stack value
    pub async fn update_item_value(
        &self,
        item_id: i64,
        item_value: f64,
        total_value: f64,
    ) -> Result<(), DbErr> {
        entity::killmail_item::ActiveModel {
            id: ActiveValue::Unchanged(item_id),
            item_value: ActiveValue::Set(item_value),
            total_value: ActiveValue::Set(total_value),
            ..Default::default()
        }
        .update(self.db)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(
        &self,
        killmail_id: i64,
    ) -> Result<Option<entity::killmail::Model>, DbErr> {
        entity::prelude::Killmail::find_by_id(killmail_id)
            .one(self.db)
            .await
    }

    /// Killmails with an id above `after_id`, ascending
    pub async fn find_page(
        &self,
        after_id: i64,
        limit: u64,
    ) -> Result<Vec<entity::killmail::Model>, DbErr> {
        entity::prelude::Killmail::find()
            .filter(entity::killmail::Column::Id.gt(after_id))
            .order_by_asc(entity::killmail::Column::Id)
            .limit(limit)
            .all(self.db)
            .await
    }

    pub async fn find_victim(
        &self,
        killmail_id: i64,
    ) -> Result<Option<entity::killmail_victim::Model>, DbErr> {
        entity::prelude::KillmailVictim::find_by_id(killmail_id)
            .one(self.db)
            .await
    }

    pub async fn find_attackers(
        &self,
        killmail_id: i64,
    ) -> Result<Vec<entity::killmail_attacker::Model>, DbErr> {
        entity::prelude::KillmailAttacker::find()
            .filter(entity::killmail_attacker::Column::KillmailId.eq(killmail_id))
            .order_by_asc(entity::killmail_attacker::Column::Id)
            .all(self.db)
            .await
    }

    pub async fn find_items(
        &self,
        killmail_id: i64,
    ) -> Result<Vec<entity::killmail_item::Model>, DbErr> {
        entity::prelude::KillmailItem::find()
            .filter(entity::killmail_item::Column::KillmailId.eq(killmail_id))
            .order_by_asc(entity::killmail_item::Column::Id)
            .all(self.db)
            .await
    }
}

fn item_model(
    killmail_id: i64,
    parent_id: Option<i64>,
    item: &PricedItem,
) -> entity::killmail_item::ActiveModel {
    entity::killmail_item::ActiveModel {
        killmail_id: ActiveValue::Set(killmail_id),
        parent_id: ActiveValue::Set(parent_id),
        flag: ActiveValue::Set(item.flag),
        item_type_id: ActiveValue::Set(item.item_type_id),
        quantity_dropped: ActiveValue::Set(item.quantity_dropped),
        quantity_destroyed: ActiveValue::Set(item.quantity_destroyed),
        singleton: ActiveValue::Set(item.singleton),
        item_value: ActiveValue::Set(item.item_value),
        total_value: ActiveValue::Set(item.total_value),
        is_parent: ActiveValue::Set(!item.items.is_empty()),
        ..Default::default()
    }
}

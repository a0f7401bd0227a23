//! Warms cache and store with every entity a killmail references.
//!
//! Priming is best effort: a failed lookup is logged and the import carries on, the entity is
//! picked up again on the next killmail or by the refresher.

use std::collections::BTreeSet;

use sea_orm::DatabaseConnection;

use crate::{
    cache::Cache,
    esi::{
        killmail::{EsiItem, EsiKillmail},
        EsiClient,
    },
    service::eve::{
        alliance::AllianceService, character::CharacterService,
        corporation::CorporationService, types::TypeService, universe::UniverseService,
    },
};

/// Deduplicated entity IDs referenced by a killmail
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrimeTargets {
    pub solar_system_id: Option<i64>,
    pub alliance_ids: BTreeSet<i64>,
    pub corporation_ids: BTreeSet<i64>,
    pub character_ids: BTreeSet<i64>,
    pub type_ids: BTreeSet<i64>,
}

impl PrimeTargets {
    pub fn from_esi(killmail: &EsiKillmail) -> Self {
        let mut targets = Self {
            solar_system_id: Some(killmail.solar_system_id),
            ..Default::default()
        };

        let victim = &killmail.victim;
        targets.add_affiliation(victim.alliance_id, victim.corporation_id, victim.character_id);
        targets.type_ids.insert(victim.ship_type_id);
        targets.add_items(&victim.items);

        for attacker in &killmail.attackers {
            targets.add_affiliation(
                attacker.alliance_id,
                attacker.corporation_id,
                attacker.character_id,
            );
            targets.type_ids.extend(attacker.ship_type_id);
            targets.type_ids.extend(attacker.weapon_type_id);
        }

        targets
    }

    pub fn from_stored(
        killmail: &entity::killmail::Model,
        victim: Option<&entity::killmail_victim::Model>,
        attackers: &[entity::killmail_attacker::Model],
        items: &[entity::killmail_item::Model],
    ) -> Self {
        let mut targets = Self {
            solar_system_id: Some(killmail.solar_system_id),
            ..Default::default()
        };

        if let Some(victim) = victim {
            targets.add_affiliation(victim.alliance_id, victim.corporation_id, victim.character_id);
            targets.type_ids.insert(victim.ship_type_id);
        }

        for attacker in attackers {
            targets.add_affiliation(
                attacker.alliance_id,
                attacker.corporation_id,
                attacker.character_id,
            );
            targets.type_ids.extend(attacker.ship_type_id);
            targets.type_ids.extend(attacker.weapon_type_id);
        }

        targets
            .type_ids
            .extend(items.iter().map(|item| item.item_type_id));

        targets
    }

    /// Item types at every container depth
    fn add_items(&mut self, items: &[EsiItem]) {
        for item in items {
            self.type_ids.insert(item.item_type_id);
            self.add_items(&item.items);
        }
    }

    fn add_affiliation(
        &mut self,
        alliance_id: Option<i64>,
        corporation_id: Option<i64>,
        character_id: Option<i64>,
    ) {
        self.alliance_ids.extend(alliance_id);
        self.corporation_ids.extend(corporation_id);
        self.character_ids.extend(character_id);
    }
}

pub struct Primer<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn Cache,
    esi: &'a EsiClient,
}

impl<'a> Primer<'a> {
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn Cache, esi: &'a EsiClient) -> Self {
        Self { db, cache, esi }
    }

    /// Resolves every target, returns how many lookups failed
    pub async fn prime(&self, killmail_id: i64, targets: &PrimeTargets) -> usize {
        let mut failures = 0;

        if let Some(system_id) = targets.solar_system_id {
            let universe = UniverseService::new(self.db, self.cache, self.esi);
            if let Err(e) = universe.get_solar_system(system_id).await {
                tracing::error!(killmail_id, system_id, "failed to prime solar system: {}", e);
                failures += 1;
            }
        }

        let alliances = AllianceService::new(self.db, self.cache, self.esi);
        for alliance_id in &targets.alliance_ids {
            if let Err(e) = alliances.get(*alliance_id).await {
                tracing::error!(killmail_id, alliance_id, "failed to prime alliance: {}", e);
                failures += 1;
            }
        }

        let corporations = CorporationService::new(self.db, self.cache, self.esi);
        for corporation_id in &targets.corporation_ids {
            if let Err(e) = corporations.get(*corporation_id).await {
                tracing::error!(
                    killmail_id,
                    corporation_id,
                    "failed to prime corporation: {}",
                    e
                );
                failures += 1;
            }
        }

        let characters = CharacterService::new(self.db, self.cache, self.esi);
        for character_id in &targets.character_ids {
            if let Err(e) = characters.get(*character_id).await {
                tracing::error!(killmail_id, character_id, "failed to prime character: {}", e);
                failures += 1;
            }
        }

        let types = TypeService::new(self.db, self.cache, self.esi);
        for type_id in &targets.type_ids {
            if let Err(e) = types.get_type(*type_id).await {
                tracing::error!(killmail_id, type_id, "failed to prime type: {}", e);
                failures += 1;
            }
        }

        failures
    }
}

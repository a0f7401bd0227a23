use sea_orm::DatabaseConnection;

use super::{cache_aside, cache_aside_many, inserted_or_existing, remote_result};
use crate::{
    cache::{key, Cache},
    data::eve::universe::UniverseRepository,
    error::Error,
    esi::EsiClient,
};

/// Solar systems, constellations and regions
pub struct UniverseService<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn Cache,
    esi: &'a EsiClient,
}

impl<'a> UniverseService<'a> {
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn Cache, esi: &'a EsiClient) -> Self {
        Self { db, cache, esi }
    }

    pub async fn get_solar_system(
        &self,
        system_id: i64,
    ) -> Result<entity::eve_solar_system::Model, Error> {
        let repo = &UniverseRepository::new(self.db);

        cache_aside(
            self.cache,
            "solar system",
            &key::solar_system(system_id),
            key::VOLATILE_TTL,
            || repo.find_solar_system(system_id),
            move || async move {
                let (system, _) = remote_result(
                    "solar system",
                    system_id,
                    self.esi.get_solar_system(system_id).await,
                )?;
                let inserted = repo.create_solar_system(system).await;

                inserted_or_existing(
                    "solar system",
                    system_id,
                    inserted,
                    repo.find_solar_system(system_id),
                )
                .await
            },
        )
        .await
    }

    pub async fn get_solar_systems(
        &self,
        system_ids: &[i64],
    ) -> Result<Vec<entity::eve_solar_system::Model>, Error> {
        let repo = &UniverseRepository::new(self.db);

        cache_aside_many(
            self.cache,
            "solar system",
            system_ids,
            key::solar_system,
            key::VOLATILE_TTL,
            |system: &entity::eve_solar_system::Model| system.id,
            |missing| async move { repo.find_solar_systems(&missing).await },
        )
        .await
    }

    pub async fn get_constellation(
        &self,
        constellation_id: i64,
    ) -> Result<entity::eve_constellation::Model, Error> {
        let repo = &UniverseRepository::new(self.db);

        cache_aside(
            self.cache,
            "constellation",
            &key::constellation(constellation_id),
            key::STATIC_TTL,
            || repo.find_constellation(constellation_id),
            move || async move {
                let (constellation, _) = remote_result(
                    "constellation",
                    constellation_id,
                    self.esi.get_constellation(constellation_id).await,
                )?;
                let inserted = repo.create_constellation(constellation).await;

                inserted_or_existing(
                    "constellation",
                    constellation_id,
                    inserted,
                    repo.find_constellation(constellation_id),
                )
                .await
            },
        )
        .await
    }

    pub async fn get_region(&self, region_id: i64) -> Result<entity::eve_region::Model, Error> {
        let repo = &UniverseRepository::new(self.db);

        cache_aside(
            self.cache,
            "region",
            &key::region(region_id),
            key::STATIC_TTL,
            || repo.find_region(region_id),
            move || async move {
                let (region, _) =
                    remote_result("region", region_id, self.esi.get_region(region_id).await)?;
                let inserted = repo.create_region(region).await;

                inserted_or_existing("region", region_id, inserted, repo.find_region(region_id))
                    .await
            },
        )
        .await
    }
}

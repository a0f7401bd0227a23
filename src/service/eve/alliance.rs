use sea_orm::DatabaseConnection;

use super::{cache_aside, cache_aside_many, inserted_or_existing, remote_result};
use crate::{
    cache::{key, Cache},
    data::eve::alliance::AllianceRepository,
    error::Error,
    esi::EsiClient,
};

pub struct AllianceService<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn Cache,
    esi: &'a EsiClient,
}

impl<'a> AllianceService<'a> {
    /// Creates a new instance of [`AllianceService`]
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn Cache, esi: &'a EsiClient) -> Self {
        Self { db, cache, esi }
    }

    /// Get an alliance from cache, database or ESI
    pub async fn get(&self, alliance_id: i64) -> Result<entity::eve_alliance::Model, Error> {
        let repo = AllianceRepository::new(self.db);

        cache_aside(
            self.cache,
            "alliance",
            &key::alliance(alliance_id),
            key::VOLATILE_TTL,
            || repo.find_by_id(alliance_id),
            || self.fetch_and_store(alliance_id),
        )
        .await
    }

    /// Get every known alliance among `alliance_ids` without calling ESI
    pub async fn get_by_ids(
        &self,
        alliance_ids: &[i64],
    ) -> Result<Vec<entity::eve_alliance::Model>, Error> {
        let repo = AllianceRepository::new(self.db);

        cache_aside_many(
            self.cache,
            "alliance",
            alliance_ids,
            key::alliance,
            key::VOLATILE_TTL,
            |alliance: &entity::eve_alliance::Model| alliance.id,
            |missing| async move { repo.find_by_ids(&missing).await },
        )
        .await
    }

    async fn fetch_and_store(&self, alliance_id: i64) -> Result<entity::eve_alliance::Model, Error> {
        let repo = AllianceRepository::new(self.db);

        let (alliance, meta) = remote_result(
            "alliance",
            alliance_id,
            self.esi.get_alliance(alliance_id, None).await,
        )?;

        let inserted = repo
            .create(alliance_id, alliance, meta.expires().timestamp(), meta.etag())
            .await;

        inserted_or_existing("alliance", alliance_id, inserted, repo.find_by_id(alliance_id)).await
    }
}

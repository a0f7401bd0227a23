use sea_orm::DatabaseConnection;

use super::{cache_aside, cache_aside_many, inserted_or_existing, remote_result};
use crate::{
    cache::{key, Cache},
    data::eve::corporation::CorporationRepository,
    error::Error,
    esi::EsiClient,
};

pub struct CorporationService<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn Cache,
    esi: &'a EsiClient,
}

impl<'a> CorporationService<'a> {
    /// Creates a new instance of [`CorporationService`]
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn Cache, esi: &'a EsiClient) -> Self {
        Self { db, cache, esi }
    }

    /// Get a corporation from cache, database or ESI
    pub async fn get(&self, corporation_id: i64) -> Result<entity::eve_corporation::Model, Error> {
        let repo = CorporationRepository::new(self.db);

        cache_aside(
            self.cache,
            "corporation",
            &key::corporation(corporation_id),
            key::VOLATILE_TTL,
            || repo.find_by_id(corporation_id),
            || self.fetch_and_store(corporation_id),
        )
        .await
    }

    /// Get every known corporation among `corporation_ids` without calling ESI
    pub async fn get_by_ids(
        &self,
        corporation_ids: &[i64],
    ) -> Result<Vec<entity::eve_corporation::Model>, Error> {
        let repo = CorporationRepository::new(self.db);

        cache_aside_many(
            self.cache,
            "corporation",
            corporation_ids,
            key::corporation,
            key::VOLATILE_TTL,
            |corporation: &entity::eve_corporation::Model| corporation.id,
            |missing| async move { repo.find_by_ids(&missing).await },
        )
        .await
    }

    async fn fetch_and_store(
        &self,
        corporation_id: i64,
    ) -> Result<entity::eve_corporation::Model, Error> {
        let repo = CorporationRepository::new(self.db);

        let (corporation, meta) = remote_result(
            "corporation",
            corporation_id,
            self.esi.get_corporation(corporation_id, None).await,
        )?;

        let inserted = repo
            .create(corporation_id, corporation, meta.expires().timestamp(), meta.etag())
            .await;

        inserted_or_existing(
            "corporation",
            corporation_id,
            inserted,
            repo.find_by_id(corporation_id),
        )
        .await
    }
}

use sea_orm::DatabaseConnection;

use super::{cache_aside, inserted_or_existing, remote_result};
use crate::{
    cache::{key, Cache},
    data::eve::types::TypeRepository,
    error::Error,
    esi::EsiClient,
};

/// Inventory types and their classification
pub struct TypeService<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn Cache,
    esi: &'a EsiClient,
}

impl<'a> TypeService<'a> {
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn Cache, esi: &'a EsiClient) -> Self {
        Self { db, cache, esi }
    }

    /// Get a type, storing its dogma attributes when it is fetched from ESI
    pub async fn get_type(&self, type_id: i64) -> Result<entity::eve_type::Model, Error> {
        let repo = &TypeRepository::new(self.db);

        cache_aside(
            self.cache,
            "type",
            &key::inventory_type(type_id),
            key::VOLATILE_TTL,
            || repo.find_type(type_id),
            move || async move {
                let (esi_type, _) =
                    remote_result("type", type_id, self.esi.get_type(type_id).await)?;
                let inserted = repo.create_type(esi_type).await;

                inserted_or_existing("type", type_id, inserted, repo.find_type(type_id)).await
            },
        )
        .await
    }

    pub async fn get_group(&self, group_id: i64) -> Result<entity::eve_type_group::Model, Error> {
        let repo = &TypeRepository::new(self.db);

        cache_aside(
            self.cache,
            "type group",
            &key::type_group(group_id),
            key::STATIC_TTL,
            || repo.find_group(group_id),
            move || async move {
                let (group, _) =
                    remote_result("type group", group_id, self.esi.get_group(group_id).await)?;
                let inserted = repo.create_group(group).await;

                inserted_or_existing("type group", group_id, inserted, repo.find_group(group_id))
                    .await
            },
        )
        .await
    }

    pub async fn get_category(
        &self,
        category_id: i64,
    ) -> Result<entity::eve_type_category::Model, Error> {
        let repo = &TypeRepository::new(self.db);

        cache_aside(
            self.cache,
            "type category",
            &key::type_category(category_id),
            key::STATIC_TTL,
            || repo.find_category(category_id),
            move || async move {
                let (category, _) = remote_result(
                    "type category",
                    category_id,
                    self.esi.get_category(category_id).await,
                )?;
                let inserted = repo.create_category(category).await;

                inserted_or_existing(
                    "type category",
                    category_id,
                    inserted,
                    repo.find_category(category_id),
                )
                .await
            },
        )
        .await
    }

    /// Category of a type, resolving the group in between
    pub async fn get_type_category(
        &self,
        type_id: i64,
    ) -> Result<entity::eve_type_category::Model, Error> {
        let inventory_type = self.get_type(type_id).await?;
        let group = self.get_group(inventory_type.group_id).await?;

        self.get_category(group.category_id).await
    }

    /// Inventory flags are static data loaded with the SDE, ESI does not serve them
    pub async fn get_flag(&self, flag_id: i64) -> Result<entity::eve_type_flag::Model, Error> {
        let repo = &TypeRepository::new(self.db);

        cache_aside(
            self.cache,
            "type flag",
            &key::type_flag(flag_id),
            key::STATIC_TTL,
            || repo.find_flag(flag_id),
            move || async move {
                Err(Error::NotFound {
                    entity: "type flag",
                    id: flag_id,
                })
            },
        )
        .await
    }

    /// Dogma attributes stored alongside a type
    pub async fn get_attributes(
        &self,
        type_id: i64,
    ) -> Result<Vec<entity::eve_type_attribute::Model>, Error> {
        let repo = &TypeRepository::new(self.db);

        cache_aside(
            self.cache,
            "type attributes",
            &key::type_attributes(type_id),
            key::VOLATILE_TTL,
            move || async move { repo.find_attributes(type_id).await.map(Some) },
            move || async move { Ok(Vec::new()) },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use wreckage_test_utils::{fixtures::eve::mockito as mocks, prelude::*};

    use super::*;
    use crate::{cache::MemoryCache, esi::test_client};

    /// Expect the type, group and category chain to be fetched and attributes stored
    #[tokio::test]
    async fn resolves_type_hierarchy() -> Result<(), TestError> {
        let test = TestBuilder::new()
            .with_eve_tables()
            .with_json_endpoint(&mocks::type_path(587), data::inventory_type(587, 25, true), 1)
            .with_json_endpoint(&mocks::group_path(25), data::group(25, 6), 1)
            .with_json_endpoint(&mocks::category_path(6), data::category(6), 1)
            .build()
            .await?;
        let esi = test_client(&test.server_url());
        let cache = MemoryCache::new();
        let service = TypeService::new(&test.db, &cache, &esi);

        let category = service.get_type_category(587).await.unwrap();
        let attributes = service.get_attributes(587).await.unwrap();

        assert_eq!(category.id, 6);
        assert_eq!(attributes.len(), 2);
        test.assert_mocks();

        Ok(())
    }

    /// Expect an unknown flag to be a not found error rather than an ESI call
    #[tokio::test]
    async fn flags_are_store_only() -> Result<(), TestError> {
        let test = TestBuilder::new().with_eve_tables().build().await?;
        factory::insert_flag(&test.db, 11, "LoSlot0").await?;
        let esi = test_client(&test.server_url());
        let cache = MemoryCache::new();
        let service = TypeService::new(&test.db, &cache, &esi);

        let flag = service.get_flag(11).await.unwrap();
        let missing = service.get_flag(9999).await;

        assert_eq!(flag.name, "LoSlot0");
        assert!(missing.unwrap_err().is_not_found());

        Ok(())
    }
}

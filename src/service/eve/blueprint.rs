use sea_orm::DatabaseConnection;

use super::cache_aside;
use crate::{
    cache::{key, Cache},
    data::eve::blueprint::BlueprintRepository,
    error::Error,
};

/// Manufacturing data from the static data export, served from the database only
pub struct BlueprintService<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn Cache,
}

impl<'a> BlueprintService<'a> {
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn Cache) -> Self {
        Self { db, cache }
    }

    pub async fn materials(
        &self,
        blueprint_type_id: i64,
    ) -> Result<Vec<entity::eve_blueprint_material::Model>, Error> {
        let repo = &BlueprintRepository::new(self.db);

        cache_aside(
            self.cache,
            "blueprint materials",
            &key::blueprint_materials(blueprint_type_id),
            key::VOLATILE_TTL,
            move || async move { repo.find_materials(blueprint_type_id).await.map(Some) },
            move || async move { Ok(Vec::new()) },
        )
        .await
    }

    pub async fn product(
        &self,
        blueprint_type_id: i64,
    ) -> Result<Option<entity::eve_blueprint_product::Model>, Error> {
        let repo = &BlueprintRepository::new(self.db);

        cache_aside(
            self.cache,
            "blueprint product",
            &key::blueprint_product(blueprint_type_id),
            key::STATIC_TTL,
            move || async move { repo.find_product(blueprint_type_id).await.map(Some) },
            move || async move { Ok(None) },
        )
        .await
    }

    /// Blueprint that manufactures `product_type_id`, if any
    pub async fn by_product_type(
        &self,
        product_type_id: i64,
    ) -> Result<Option<entity::eve_blueprint_product::Model>, Error> {
        let repo = &BlueprintRepository::new(self.db);

        cache_aside(
            self.cache,
            "blueprint product",
            &key::blueprint_product_type(product_type_id),
            key::STATIC_TTL,
            move || async move { repo.find_by_product_type(product_type_id).await.map(Some) },
            move || async move { Ok(None) },
        )
        .await
    }
}

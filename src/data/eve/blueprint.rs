use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

/// Manufacturing activity
pub const ACTIVITY_MANUFACTURING: i32 = 1;

pub struct BlueprintRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> BlueprintRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Manufacturing materials of a blueprint
    pub async fn find_materials(
        &self,
        blueprint_type_id: i64,
    ) -> Result<Vec<entity::eve_blueprint_material::Model>, DbErr> {
        entity::prelude::EveBlueprintMaterial::find()
            .filter(entity::eve_blueprint_material::Column::TypeId.eq(blueprint_type_id))
            .filter(entity::eve_blueprint_material::Column::ActivityId.eq(ACTIVITY_MANUFACTURING))
            .all(self.db)
            .await
    }

    /// Manufacturing output of a blueprint
    pub async fn find_product(
        &self,
        blueprint_type_id: i64,
    ) -> Result<Option<entity::eve_blueprint_product::Model>, DbErr> {
        entity::prelude::EveBlueprintProduct::find()
            .filter(entity::eve_blueprint_product::Column::TypeId.eq(blueprint_type_id))
            .filter(entity::eve_blueprint_product::Column::ActivityId.eq(ACTIVITY_MANUFACTURING))
            .one(self.db)
            .await
    }

    /// Blueprint manufacturing `product_type_id`
    pub async fn find_by_product_type(
        &self,
        product_type_id: i64,
    ) -> Result<Option<entity::eve_blueprint_product::Model>, DbErr> {
        entity::prelude::EveBlueprintProduct::find()
            .filter(entity::eve_blueprint_product::Column::ProductTypeId.eq(product_type_id))
            .filter(entity::eve_blueprint_product::Column::ActivityId.eq(ACTIVITY_MANUFACTURING))
            .one(self.db)
            .await
    }
}

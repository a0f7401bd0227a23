use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
};

use crate::esi::universe::{EsiCategory, EsiGroup, EsiType};

/// Inventory types with their groups, categories, flags and dogma attributes
pub struct TypeRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TypeRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Create a type along with its dogma attributes
    pub async fn create_type(&self, esi_type: EsiType) -> Result<entity::eve_type::Model, DbErr> {
        let attributes: Vec<entity::eve_type_attribute::ActiveModel> = esi_type
            .dogma_attributes
            .iter()
            .map(|attribute| entity::eve_type_attribute::ActiveModel {
                type_id: ActiveValue::Set(esi_type.type_id),
                attribute_id: ActiveValue::Set(attribute.attribute_id),
                value: ActiveValue::Set(attribute.value),
            })
            .collect();

        let model = entity::eve_type::ActiveModel {
            id: ActiveValue::Set(esi_type.type_id),
            group_id: ActiveValue::Set(esi_type.group_id),
            name: ActiveValue::Set(esi_type.name),
            description: ActiveValue::Set(esi_type.description),
            published: ActiveValue::Set(esi_type.published),
            market_group_id: ActiveValue::Set(esi_type.market_group_id),
            volume: ActiveValue::Set(esi_type.volume),
            capacity: ActiveValue::Set(esi_type.capacity),
            mass: ActiveValue::Set(esi_type.mass),
            created_at: ActiveValue::Set(Utc::now().naive_utc()),
        }
        .insert(self.db)
        .await?;

        if !attributes.is_empty() {
            entity::prelude::EveTypeAttribute::insert_many(attributes)
                .exec_without_returning(self.db)
                .await?;
        }

        Ok(model)
    }

    pub async fn find_type(&self, type_id: i64) -> Result<Option<entity::eve_type::Model>, DbErr> {
        entity::prelude::EveType::find_by_id(type_id)
            .one(self.db)
            .await
    }

    pub async fn find_types(&self, type_ids: &[i64]) -> Result<Vec<entity::eve_type::Model>, DbErr> {
        entity::prelude::EveType::find()
            .filter(entity::eve_type::Column::Id.is_in(type_ids.to_vec()))
            .all(self.db)
            .await
    }

    pub async fn create_group(&self, group: EsiGroup) -> Result<entity::eve_type_group::Model, DbErr> {
        entity::eve_type_group::ActiveModel {
            id: ActiveValue::Set(group.group_id),
            category_id: ActiveValue::Set(group.category_id),
            name: ActiveValue::Set(group.name),
            published: ActiveValue::Set(group.published),
            created_at: ActiveValue::Set(Utc::now().naive_utc()),
        }
        .insert(self.db)
        .await
    }

    pub async fn find_group(
        &self,
        group_id: i64,
    ) -> Result<Option<entity::eve_type_group::Model>, DbErr> {
        entity::prelude::EveTypeGroup::find_by_id(group_id)
            .one(self.db)
            .await
    }

    pub async fn find_groups(
        &self,
        group_ids: &[i64],
    ) -> Result<Vec<entity::eve_type_group::Model>, DbErr> {
        entity::prelude::EveTypeGroup::find()
            .filter(entity::eve_type_group::Column::Id.is_in(group_ids.to_vec()))
            .all(self.db)
            .await
    }

    pub async fn create_category(
        &self,
        category: EsiCategory,
    ) -> Result<entity::eve_type_category::Model, DbErr> {
        entity::eve_type_category::ActiveModel {
            id: ActiveValue::Set(category.category_id),
            name: ActiveValue::Set(category.name),
            published: ActiveValue::Set(category.published),
            created_at: ActiveValue::Set(Utc::now().naive_utc()),
        }
        .insert(self.db)
        .await
    }

    pub async fn find_category(
        &self,
        category_id: i64,
    ) -> Result<Option<entity::eve_type_category::Model>, DbErr> {
        entity::prelude::EveTypeCategory::find_by_id(category_id)
            .one(self.db)
            .await
    }

    pub async fn find_flag(&self, flag_id: i64) -> Result<Option<entity::eve_type_flag::Model>, DbErr> {
        entity::prelude::EveTypeFlag::find_by_id(flag_id)
            .one(self.db)
            .await
    }

    pub async fn find_attributes(
        &self,
        type_id: i64,
    ) -> Result<Vec<entity::eve_type_attribute::Model>, DbErr> {
        entity::prelude::EveTypeAttribute::find()
            .filter(entity::eve_type_attribute::Column::TypeId.eq(type_id))
            .all(self.db)
            .await
    }
}

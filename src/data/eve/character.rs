use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use super::RefreshState;
use crate::esi::character::EsiCharacter;

pub struct CharacterRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> CharacterRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        character_id: i64,
        character: EsiCharacter,
        cached_until: i64,
        etag: Option<String>,
    ) -> Result<entity::eve_character::Model, DbErr> {
        let now = Utc::now().naive_utc();

        entity::eve_character::ActiveModel {
            id: ActiveValue::Set(character_id),
            name: ActiveValue::Set(character.name),
            corporation_id: ActiveValue::Set(character.corporation_id),
            alliance_id: ActiveValue::Set(character.alliance_id),
            faction_id: ActiveValue::Set(character.faction_id),
            birthday: ActiveValue::Set(character.birthday.naive_utc()),
            security_status: ActiveValue::Set(character.security_status),
            cached_until: ActiveValue::Set(cached_until),
            etag: ActiveValue::Set(etag),
            not_modified_count: ActiveValue::Set(0),
            update_priority: ActiveValue::Set(0),
            update_error: ActiveValue::Set(0),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(self.db)
        .await
    }

    pub async fn find_by_id(
        &self,
        character_id: i64,
    ) -> Result<Option<entity::eve_character::Model>, DbErr> {
        entity::prelude::EveCharacter::find_by_id(character_id)
            .one(self.db)
            .await
    }

    pub async fn find_by_ids(
        &self,
        character_ids: &[i64],
    ) -> Result<Vec<entity::eve_character::Model>, DbErr> {
        entity::prelude::EveCharacter::find()
            .filter(entity::eve_character::Column::Id.is_in(character_ids.to_vec()))
            .all(self.db)
            .await
    }

    pub async fn find_expired(
        &self,
        now: i64,
        max_errors: i32,
        limit: u64,
    ) -> Result<Vec<entity::eve_character::Model>, DbErr> {
        entity::prelude::EveCharacter::find()
            .filter(entity::eve_character::Column::CachedUntil.lt(now))
            .filter(entity::eve_character::Column::UpdateError.lt(max_errors))
            .order_by_asc(entity::eve_character::Column::CachedUntil)
            .limit(limit)
            .all(self.db)
            .await
    }

    pub async fn update_from_esi(
        &self,
        character_id: i64,
        character: EsiCharacter,
        state: RefreshState,
    ) -> Result<entity::eve_character::Model, DbErr> {
        entity::eve_character::ActiveModel {
            id: ActiveValue::Unchanged(character_id),
            name: ActiveValue::Set(character.name),
            corporation_id: ActiveValue::Set(character.corporation_id),
            alliance_id: ActiveValue::Set(character.alliance_id),
            faction_id: ActiveValue::Set(character.faction_id),
            security_status: ActiveValue::Set(character.security_status),
            cached_until: ActiveValue::Set(state.cached_until),
            etag: ActiveValue::Set(state.etag),
            not_modified_count: ActiveValue::Set(state.not_modified_count),
            update_priority: ActiveValue::Set(state.update_priority),
            update_error: ActiveValue::Set(state.update_error),
            updated_at: ActiveValue::Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .update(self.db)
        .await
    }

    pub async fn update_refresh_state(
        &self,
        character_id: i64,
        state: RefreshState,
    ) -> Result<entity::eve_character::Model, DbErr> {
        entity::eve_character::ActiveModel {
            id: ActiveValue::Unchanged(character_id),
            cached_until: ActiveValue::Set(state.cached_until),
            etag: ActiveValue::Set(state.etag),
            not_modified_count: ActiveValue::Set(state.not_modified_count),
            update_priority: ActiveValue::Set(state.update_priority),
            update_error: ActiveValue::Set(state.update_error),
            updated_at: ActiveValue::Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .update(self.db)
        .await
    }
}

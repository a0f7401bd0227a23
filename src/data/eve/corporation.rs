use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use super::RefreshState;
use crate::esi::character::EsiCorporation;

pub struct CorporationRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> CorporationRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        corporation_id: i64,
        corporation: EsiCorporation,
        cached_until: i64,
        etag: Option<String>,
    ) -> Result<entity::eve_corporation::Model, DbErr> {
        let now = Utc::now().naive_utc();

        entity::eve_corporation::ActiveModel {
            id: ActiveValue::Set(corporation_id),
            name: ActiveValue::Set(corporation.name),
            ticker: ActiveValue::Set(corporation.ticker),
            alliance_id: ActiveValue::Set(corporation.alliance_id),
            faction_id: ActiveValue::Set(corporation.faction_id),
            ceo_id: ActiveValue::Set(corporation.ceo_id),
            creator_id: ActiveValue::Set(corporation.creator_id),
            member_count: ActiveValue::Set(corporation.member_count),
            tax_rate: ActiveValue::Set(corporation.tax_rate),
            date_founded: ActiveValue::Set(corporation.date_founded.map(|date| date.naive_utc())),
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
        corporation_id: i64,
    ) -> Result<Option<entity::eve_corporation::Model>, DbErr> {
        entity::prelude::EveCorporation::find_by_id(corporation_id)
            .one(self.db)
            .await
    }

    pub async fn find_by_ids(
        &self,
        corporation_ids: &[i64],
    ) -> Result<Vec<entity::eve_corporation::Model>, DbErr> {
        entity::prelude::EveCorporation::find()
            .filter(entity::eve_corporation::Column::Id.is_in(corporation_ids.to_vec()))
            .all(self.db)
            .await
    }

    pub async fn find_expired(
        &self,
        now: i64,
        max_errors: i32,
        limit: u64,
    ) -> Result<Vec<entity::eve_corporation::Model>, DbErr> {
        entity::prelude::EveCorporation::find()
            .filter(entity::eve_corporation::Column::CachedUntil.lt(now))
            .filter(entity::eve_corporation::Column::UpdateError.lt(max_errors))
            .order_by_asc(entity::eve_corporation::Column::CachedUntil)
            .limit(limit)
            .all(self.db)
            .await
    }

    pub async fn update_from_esi(
        &self,
        corporation_id: i64,
        corporation: EsiCorporation,
        state: RefreshState,
    ) -> Result<entity::eve_corporation::Model, DbErr> {
        entity::eve_corporation::ActiveModel {
            id: ActiveValue::Unchanged(corporation_id),
            name: ActiveValue::Set(corporation.name),
            ticker: ActiveValue::Set(corporation.ticker),
            alliance_id: ActiveValue::Set(corporation.alliance_id),
            faction_id: ActiveValue::Set(corporation.faction_id),
            ceo_id: ActiveValue::Set(corporation.ceo_id),
            member_count: ActiveValue::Set(corporation.member_count),
            tax_rate: ActiveValue::Set(corporation.tax_rate),
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
        corporation_id: i64,
        state: RefreshState,
    ) -> Result<entity::eve_corporation::Model, DbErr> {
        entity::eve_corporation::ActiveModel {
            id: ActiveValue::Unchanged(corporation_id),
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

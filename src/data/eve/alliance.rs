use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use super::RefreshState;
use crate::esi::character::EsiAlliance;

pub struct AllianceRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AllianceRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Create an alliance using its ESI model
    pub async fn create(
        &self,
        alliance_id: i64,
        alliance: EsiAlliance,
        cached_until: i64,
        etag: Option<String>,
    ) -> Result<entity::eve_alliance::Model, DbErr> {
        let now = Utc::now().naive_utc();

        entity::eve_alliance::ActiveModel {
            id: ActiveValue::Set(alliance_id),
            name: ActiveValue::Set(alliance.name),
            ticker: ActiveValue::Set(alliance.ticker),
            creator_corporation_id: ActiveValue::Set(alliance.creator_corporation_id),
            executor_corporation_id: ActiveValue::Set(alliance.executor_corporation_id),
            date_founded: ActiveValue::Set(alliance.date_founded.naive_utc()),
            is_closed: ActiveValue::Set(alliance.executor_corporation_id.is_none()),
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
        alliance_id: i64,
    ) -> Result<Option<entity::eve_alliance::Model>, DbErr> {
        entity::prelude::EveAlliance::find_by_id(alliance_id)
            .one(self.db)
            .await
    }

    pub async fn find_by_ids(
        &self,
        alliance_ids: &[i64],
    ) -> Result<Vec<entity::eve_alliance::Model>, DbErr> {
        entity::prelude::EveAlliance::find()
            .filter(entity::eve_alliance::Column::Id.is_in(alliance_ids.to_vec()))
            .all(self.db)
            .await
    }

    /// Alliances whose cache expired before `now`, oldest first
    pub async fn find_expired(
        &self,
        now: i64,
        max_errors: i32,
        limit: u64,
    ) -> Result<Vec<entity::eve_alliance::Model>, DbErr> {
        entity::prelude::EveAlliance::find()
            .filter(entity::eve_alliance::Column::CachedUntil.lt(now))
            .filter(entity::eve_alliance::Column::UpdateError.lt(max_errors))
            .order_by_asc(entity::eve_alliance::Column::CachedUntil)
            .limit(limit)
            .all(self.db)
            .await
    }

    /// Overwrite an alliance with a fresh ESI payload
    pub async fn update_from_esi(
        &self,
        alliance_id: i64,
        alliance: EsiAlliance,
        state: RefreshState,
    ) -> Result<entity::eve_alliance::Model, DbErr> {
        entity::eve_alliance::ActiveModel {
            id: ActiveValue::Unchanged(alliance_id),
            name: ActiveValue::Set(alliance.name),
            ticker: ActiveValue::Set(alliance.ticker),
            creator_corporation_id: ActiveValue::Set(alliance.creator_corporation_id),
            executor_corporation_id: ActiveValue::Set(alliance.executor_corporation_id),
            date_founded: ActiveValue::Set(alliance.date_founded.naive_utc()),
            is_closed: ActiveValue::Set(alliance.executor_corporation_id.is_none()),
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

    /// Update only the refresh bookkeeping columns
    pub async fn update_refresh_state(
        &self,
        alliance_id: i64,
        state: RefreshState,
    ) -> Result<entity::eve_alliance::Model, DbErr> {
        entity::eve_alliance::ActiveModel {
            id: ActiveValue::Unchanged(alliance_id),
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

#[cfg(test)]
mod tests {
    use wreckage_test_utils::prelude::*;

    use super::*;
    use crate::data::eve::RefreshState;

    #[tokio::test]
    async fn find_expired_orders_oldest_first_and_skips_failing() {
        let test = TestBuilder::new()
            .with_table(entity::prelude::EveAlliance)
            .build()
            .await
            .unwrap();

        factory::insert_alliance(&test.db, 1, 300, None).await.unwrap();
        factory::insert_alliance(&test.db, 2, 100, None).await.unwrap();
        factory::insert_alliance(&test.db, 3, 5_000, None).await.unwrap();
        let failing = factory::insert_alliance(&test.db, 4, 50, None).await.unwrap();

        let repo = AllianceRepository::new(&test.db);
        repo.update_refresh_state(
            failing.id,
            RefreshState {
                cached_until: 50,
                etag: None,
                not_modified_count: 0,
                update_priority: 0,
                update_error: 3,
            },
        )
        .await
        .unwrap();

        let expired = repo.find_expired(1_000, 3, 1000).await.unwrap();
        let ids: Vec<i64> = expired.iter().map(|a| a.id).collect();

        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn update_refresh_state_keeps_payload() {
        let test = TestBuilder::new()
            .with_table(entity::prelude::EveAlliance)
            .build()
            .await
            .unwrap();
        let alliance = factory::insert_alliance(&test.db, 99000001, 0, Some("\"abc\""))
            .await
            .unwrap();

        let repo = AllianceRepository::new(&test.db);
        let updated = repo
            .update_refresh_state(
                alliance.id,
                RefreshState {
                    cached_until: 42,
                    etag: Some("\"def\"".to_string()),
                    not_modified_count: 1,
                    update_priority: 0,
                    update_error: 0,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, alliance.name);
        assert_eq!(updated.cached_until, 42);
        assert_eq!(updated.etag.as_deref(), Some("\"def\""));
        assert_eq!(updated.not_modified_count, 1);
    }
}

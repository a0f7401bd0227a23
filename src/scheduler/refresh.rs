//! Background refresh of expirable EVE entities.
//!
//! Alliances, corporations and characters carry a `cached_until` timestamp and the etag of the
//! last ESI response. One loop per entity kind picks up rows whose cache expired, asks ESI for
//! changes with the stored etag and applies the refresh policy:
//!
//! - `304 Not Modified` extends the cache by the entity's update priority in days. Entities that
//!   keep answering 304 are polled less often.
//! - `200 OK` overwrites the row with the fresh payload.
//! - Both evict the cached model.
//! - Any error retries the entity in two minutes and counts towards the error ceiling, entities
//!   at the ceiling are no longer picked up.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr};

use crate::{
    cache::{key, Cache},
    data::eve::{
        alliance::AllianceRepository, character::CharacterRepository,
        corporation::CorporationRepository, RefreshState,
    },
    error::{esi::EsiError, Error, ResultExt},
    esi::{
        character::{EsiAlliance, EsiCharacter, EsiCorporation},
        EsiClient, EsiMeta, EsiResponse,
    },
};

/// 304s in a row before an entity's update priority is raised
const NOT_MODIFIED_THRESHOLD: i32 = 2;
/// Highest update priority reached through repeated 304s
const MAX_UPDATE_PRIORITY: i32 = 2;
/// Delay before an entity that failed to refresh is retried
const FAILURE_RETRY_SECS: i64 = 120;

/// An entity kind the refresher keeps current.
#[async_trait]
pub trait RefreshTarget: Send + Sync {
    type Model: Send + Sync;
    type Payload: Send;

    /// Name used in logs
    const NAME: &'static str;

    fn id(model: &Self::Model) -> i64;

    fn state(model: &Self::Model) -> RefreshState;

    fn cache_key(id: i64) -> String;

    async fn find_expired(
        db: &DatabaseConnection,
        now: i64,
        max_errors: i32,
        limit: u64,
    ) -> Result<Vec<Self::Model>, DbErr>;

    async fn fetch(esi: &EsiClient, id: i64, etag: Option<&str>) -> EsiResponse<Self::Payload>;

    async fn overwrite(
        db: &DatabaseConnection,
        id: i64,
        payload: Self::Payload,
        state: RefreshState,
    ) -> Result<(), DbErr>;

    async fn update_state(
        db: &DatabaseConnection,
        id: i64,
        state: RefreshState,
    ) -> Result<(), DbErr>;
}

pub struct Alliances;
pub struct Corporations;
pub struct Characters;

macro_rules! refresh_target {
    ($target:ty, $name:literal, $model:ty, $payload:ty, $repo:ident, $fetch:ident, $key:path) => {
        #[async_trait]
        impl RefreshTarget for $target {
            type Model = $model;
            type Payload = $payload;

            const NAME: &'static str = $name;

            fn id(model: &Self::Model) -> i64 {
                model.id
            }

            fn state(model: &Self::Model) -> RefreshState {
                RefreshState {
                    cached_until: model.cached_until,
                    etag: model.etag.clone(),
                    not_modified_count: model.not_modified_count,
                    update_priority: model.update_priority,
                    update_error: model.update_error,
                }
            }

            fn cache_key(id: i64) -> String {
                $key(id)
            }

            async fn find_expired(
                db: &DatabaseConnection,
                now: i64,
                max_errors: i32,
                limit: u64,
            ) -> Result<Vec<Self::Model>, DbErr> {
                $repo::new(db).find_expired(now, max_errors, limit).await
            }

            async fn fetch(
                esi: &EsiClient,
                id: i64,
                etag: Option<&str>,
            ) -> EsiResponse<Self::Payload> {
                esi.$fetch(id, etag).await
            }

            async fn overwrite(
                db: &DatabaseConnection,
                id: i64,
                payload: Self::Payload,
                state: RefreshState,
            ) -> Result<(), DbErr> {
                $repo::new(db).update_from_esi(id, payload, state).await?;
                Ok(())
            }

            async fn update_state(
                db: &DatabaseConnection,
                id: i64,
                state: RefreshState,
            ) -> Result<(), DbErr> {
                $repo::new(db).update_refresh_state(id, state).await?;
                Ok(())
            }
        }
    };
}

refresh_target!(
    Alliances,
    "alliance",
    entity::eve_alliance::Model,
    EsiAlliance,
    AllianceRepository,
    get_alliance,
    key::alliance
);
refresh_target!(
    Corporations,
    "corporation",
    entity::eve_corporation::Model,
    EsiCorporation,
    CorporationRepository,
    get_corporation,
    key::corporation
);
refresh_target!(
    Characters,
    "character",
    entity::eve_character::Model,
    EsiCharacter,
    CharacterRepository,
    get_character,
    key::character
);

/// State after ESI confirmed the stored data is still current
pub fn not_modified_state(
    state: &RefreshState,
    meta: &EsiMeta,
    expires: DateTime<Utc>,
) -> RefreshState {
    let mut not_modified_count = state.not_modified_count + 1;
    let mut update_priority = state.update_priority;

    if not_modified_count >= NOT_MODIFIED_THRESHOLD && update_priority < MAX_UPDATE_PRIORITY {
        not_modified_count = 0;
        update_priority += 1;
    }

    let cached_until = expires + chrono::Duration::days(update_priority as i64);

    RefreshState {
        cached_until: cached_until.timestamp(),
        etag: meta.etag().or_else(|| state.etag.clone()),
        not_modified_count,
        update_priority,
        update_error: 0,
    }
}

/// State after ESI returned a fresh payload
pub fn refreshed_state(meta: &EsiMeta, expires: DateTime<Utc>) -> RefreshState {
    RefreshState {
        cached_until: expires.timestamp(),
        etag: meta.etag(),
        not_modified_count: 0,
        update_priority: 0,
        update_error: 0,
    }
}

/// State after a failed refresh
pub fn failed_state(state: &RefreshState, now: DateTime<Utc>) -> RefreshState {
    RefreshState {
        cached_until: now.timestamp() + FAILURE_RETRY_SECS,
        update_error: state.update_error + 1,
        ..state.clone()
    }
}

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Entities at or above this error count are skipped
    pub max_errors: i32,
    /// Entities refreshed per sweep
    pub batch_limit: u64,
    /// Pause between entities
    pub entity_delay: Duration,
    /// Pause when a sweep found nothing to refresh
    pub idle_delay: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_errors: 3,
            batch_limit: 1000,
            entity_delay: Duration::from_millis(25),
            idle_delay: Duration::from_secs(5 * 60),
        }
    }
}

/// Outcome counts of one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub updated: usize,
    pub not_modified: usize,
    pub failed: usize,
}

impl RefreshSummary {
    pub fn total(&self) -> usize {
        self.updated + self.not_modified + self.failed
    }
}

pub struct Refresher<'a> {
    db: &'a DatabaseConnection,
    cache: &'a dyn Cache,
    esi: &'a EsiClient,
    config: RefreshConfig,
}

impl<'a> Refresher<'a> {
    pub fn new(db: &'a DatabaseConnection, cache: &'a dyn Cache, esi: &'a EsiClient) -> Self {
        Self {
            db,
            cache,
            esi,
            config: RefreshConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RefreshConfig) -> Self {
        self.config = config;
        self
    }

    /// Refreshes `T` forever, sleeping when nothing is due
    pub async fn run<T: RefreshTarget>(&self) {
        tracing::info!(entity = T::NAME, "starting expired entity refresher");

        loop {
            match self.run_once::<T>().await {
                Ok(summary) if summary.total() > 0 => {
                    tracing::info!(
                        entity = T::NAME,
                        updated = summary.updated,
                        not_modified = summary.not_modified,
                        failed = summary.failed,
                        "refreshed expired entities"
                    );
                }
                Ok(_) => tokio::time::sleep(self.config.idle_delay).await,
                Err(e) => {
                    tracing::error!(entity = T::NAME, "entity refresh sweep failed: {}", e);
                    tokio::time::sleep(self.config.idle_delay).await;
                }
            }
        }
    }

    /// Refreshes every currently expired entity of kind `T` once
    pub async fn run_once<T: RefreshTarget>(&self) -> Result<RefreshSummary, Error> {
        let expired = T::find_expired(
            self.db,
            Utc::now().timestamp(),
            self.config.max_errors,
            self.config.batch_limit,
        )
        .await
        .context(format!("unable to find expired {}s", T::NAME))?;

        let mut summary = RefreshSummary::default();

        for (index, model) in expired.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.entity_delay).await;
            }

            self.refresh::<T>(model, &mut summary).await?;
        }

        Ok(summary)
    }

    async fn refresh<T: RefreshTarget>(
        &self,
        model: &T::Model,
        summary: &mut RefreshSummary,
    ) -> Result<(), Error> {
        let id = T::id(model);
        let state = T::state(model);

        let response = loop {
            self.esi.tracker().gate_keeper().await;

            let response = T::fetch(self.esi, id, state.etag.as_deref()).await;
            if !matches!(response.meta.error, Some(EsiError::Throttled { .. })) {
                break response;
            }
        };

        let EsiResponse { data, meta } = response;

        if meta.is_not_modified() {
            let next = not_modified_state(&state, &meta, meta.expires());
            T::update_state(self.db, id, next)
                .await
                .context(format!("unable to extend {} {} cache", T::NAME, id))?;
            self.evict::<T>(id).await?;
            summary.not_modified += 1;
            return Ok(());
        }

        match (data, meta.error.as_ref()) {
            (Some(payload), None) => {
                T::overwrite(self.db, id, payload, refreshed_state(&meta, meta.expires()))
                    .await
                    .context(format!("unable to update {} {}", T::NAME, id))?;
                self.evict::<T>(id).await?;
                summary.updated += 1;
            }
            (_, error) => {
                tracing::warn!(
                    entity = T::NAME,
                    id,
                    code = meta.code,
                    update_error = state.update_error + 1,
                    "entity refresh failed: {}",
                    error.map(|e| e.to_string()).unwrap_or_default()
                );
                T::update_state(self.db, id, failed_state(&state, Utc::now()))
                    .await
                    .context(format!("unable to record {} {} refresh failure", T::NAME, id))?;
                summary.failed += 1;
            }
        }

        Ok(())
    }

    /// Drops the cached model so readers pick up the new row
    async fn evict<T: RefreshTarget>(&self, id: i64) -> Result<(), Error> {
        self.cache
            .delete(&T::cache_key(id))
            .await
            .context(format!("unable to evict {} {} from redis", T::NAME, id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use reqwest::header::{HeaderMap, HeaderValue, ETAG};
    use wreckage_test_utils::{fixtures::eve::mockito, prelude::*};

    use super::*;
    use crate::{cache::MemoryCache, esi::test_client};

    fn state(not_modified_count: i32, update_priority: i32) -> RefreshState {
        RefreshState {
            cached_until: 0,
            etag: Some("\"old\"".to_string()),
            not_modified_count,
            update_priority,
            update_error: 2,
        }
    }

    fn meta(code: u16, etag: Option<&str>) -> EsiMeta {
        let mut headers = HeaderMap::new();
        if let Some(etag) = etag {
            headers.insert(ETAG, HeaderValue::from_str(etag).unwrap());
        }

        EsiMeta {
            path: "/alliances/1/".to_string(),
            code,
            headers,
            error: None,
        }
    }

    fn expires() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 14, 11, 5, 0).unwrap()
    }

    fn config() -> RefreshConfig {
        RefreshConfig {
            entity_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    mod policy {
        use super::*;

        #[test]
        fn first_not_modified_counts_only() {
            let next = not_modified_state(&state(0, 0), &meta(304, None), expires());

            assert_eq!(next.not_modified_count, 1);
            assert_eq!(next.update_priority, 0);
            assert_eq!(next.cached_until, expires().timestamp());
            assert_eq!(next.update_error, 0);
            assert_eq!(next.etag.as_deref(), Some("\"old\""));
        }

        /// Expect the second 304 in a row to slow polling by a day
        #[test]
        fn repeated_not_modified_raises_priority() {
            let next = not_modified_state(&state(1, 0), &meta(304, None), expires());

            assert_eq!(next.not_modified_count, 0);
            assert_eq!(next.update_priority, 1);
            assert_eq!(
                next.cached_until,
                (expires() + chrono::Duration::days(1)).timestamp()
            );
        }

        #[test]
        fn priority_capped() {
            let next = not_modified_state(&state(5, 2), &meta(304, None), expires());

            assert_eq!(next.update_priority, 2);
            assert_eq!(next.not_modified_count, 6);
            assert_eq!(
                next.cached_until,
                (expires() + chrono::Duration::days(2)).timestamp()
            );
        }

        #[test]
        fn refresh_resets_counters() {
            let next = refreshed_state(&meta(200, Some("\"new\"")), expires());

            assert_eq!(next.etag.as_deref(), Some("\"new\""));
            assert_eq!(next.cached_until, expires().timestamp());
            assert_eq!(
                (next.not_modified_count, next.update_priority, next.update_error),
                (0, 0, 0)
            );
        }

        #[test]
        fn failure_retries_in_two_minutes() {
            let now = expires();
            let next = failed_state(&state(1, 1), now);

            assert_eq!(next.cached_until, now.timestamp() + 120);
            assert_eq!(next.update_error, 3);
            assert_eq!(next.update_priority, 1);
        }
    }

    mod run_once {
        use super::*;

        const ALLIANCE_ID: i64 = 99000001;

        async fn stored_alliance(test: &TestContext) -> entity::eve_alliance::Model {
            AllianceRepository::new(&test.db)
                .find_by_id(ALLIANCE_ID)
                .await
                .unwrap()
                .unwrap()
        }

        /// Expect a 200 to overwrite the row and evict the cached copy
        #[tokio::test]
        async fn fresh_payload_overwrites() {
            let test = TestBuilder::new()
                .with_eve_tables()
                .with_json_endpoint(
                    &mockito::alliance_path(ALLIANCE_ID),
                    data::alliance("Renamed Alliance"),
                    1,
                )
                .build()
                .await
                .unwrap();
            factory::insert_alliance(&test.db, ALLIANCE_ID, 0, None)
                .await
                .unwrap();
            let cache = MemoryCache::new();
            cache
                .set(&key::alliance(ALLIANCE_ID), "{}".to_string(), key::VOLATILE_TTL)
                .await
                .unwrap();
            let esi = test_client(&test.server_url());

            let summary = Refresher::new(&test.db, &cache, &esi)
                .with_config(config())
                .run_once::<Alliances>()
                .await
                .unwrap();

            assert_eq!(summary.updated, 1);
            let alliance = stored_alliance(&test).await;
            assert_eq!(alliance.name, "Renamed Alliance");
            assert_eq!(alliance.etag.as_deref(), Some("\"fixture-etag\""));
            assert_eq!(alliance.cached_until, expires().timestamp());
            assert!(cache.get(&key::alliance(ALLIANCE_ID)).await.unwrap().is_none());
            test.assert_mocks();
        }

        /// Expect a 304 to extend the row's expiry and evict the cached copy
        #[tokio::test]
        async fn not_modified_extends_cache() {
            let test = TestBuilder::new()
                .with_eve_tables()
                .with_status_endpoint(&mockito::alliance_path(ALLIANCE_ID), 304, 1)
                .build()
                .await
                .unwrap();
            factory::insert_alliance(&test.db, ALLIANCE_ID, 0, Some("\"etag\""))
                .await
                .unwrap();
            let cache = MemoryCache::new();
            cache
                .set(&key::alliance(ALLIANCE_ID), "{}".to_string(), key::VOLATILE_TTL)
                .await
                .unwrap();
            let esi = test_client(&test.server_url());

            let summary = Refresher::new(&test.db, &cache, &esi)
                .with_config(config())
                .run_once::<Alliances>()
                .await
                .unwrap();

            assert_eq!(summary.not_modified, 1);
            let alliance = stored_alliance(&test).await;
            assert_eq!(alliance.not_modified_count, 1);
            assert_eq!(alliance.etag.as_deref(), Some("\"etag\""));
            assert!(alliance.cached_until > Utc::now().timestamp());
            assert!(cache.get(&key::alliance(ALLIANCE_ID)).await.unwrap().is_none());
            test.assert_mocks();
        }

        /// Expect server errors to schedule a quick retry and count towards the ceiling
        #[tokio::test]
        async fn failure_counts_towards_ceiling() {
            let test = TestBuilder::new()
                .with_eve_tables()
                .with_status_endpoint(&mockito::alliance_path(ALLIANCE_ID), 503, 3)
                .build()
                .await
                .unwrap();
            factory::insert_alliance(&test.db, ALLIANCE_ID, 0, None)
                .await
                .unwrap();
            let cache = MemoryCache::new();
            let esi = test_client(&test.server_url());

            let before = Utc::now().timestamp();
            let summary = Refresher::new(&test.db, &cache, &esi)
                .with_config(config())
                .run_once::<Alliances>()
                .await
                .unwrap();

            assert_eq!(summary.failed, 1);
            let alliance = stored_alliance(&test).await;
            assert_eq!(alliance.update_error, 1);
            assert!(alliance.cached_until >= before + 120);
            test.assert_mocks();
        }

        #[tokio::test]
        async fn current_entities_left_alone() {
            let test = TestBuilder::new()
                .with_eve_tables()
                .with_status_endpoint(&mockito::alliance_path(ALLIANCE_ID), 304, 0)
                .build()
                .await
                .unwrap();
            factory::insert_alliance(&test.db, ALLIANCE_ID, i64::MAX, None)
                .await
                .unwrap();
            let cache = MemoryCache::new();
            let esi = test_client(&test.server_url());

            let summary = Refresher::new(&test.db, &cache, &esi)
                .with_config(config())
                .run_once::<Alliances>()
                .await
                .unwrap();

            assert_eq!(summary.total(), 0);
            test.assert_mocks();
        }
    }
}

use wreckage_test_utils::{fixtures::eve::mockito, prelude::*};

use super::*;
use crate::{
    cache::MemoryCache,
    esi::test_client,
    service::killmail::{fixture::*, KillmailPipeline},
};

async fn import_fixture(test: &mut TestContext, cache: &MemoryCache) {
    seed_world(&test.db).await.unwrap();
    test.mock_endpoint(|server| mockito::json_endpoint(
        server,
        &mockito::killmail_path(KILLMAIL_ID, HASH),
        &killmail_body(vec![corp_mate_attacker()]),
        1,
    ))
    .await;

    let esi = test_client(&test.server_url());
    KillmailPipeline::new(&test.db, cache, &esi)
        .import(&KillmailReference::new(KILLMAIL_ID, HASH))
        .await
        .unwrap();
}

/// Expect stale values and flags to be rebuilt from current prices
#[tokio::test]
async fn restores_derived_fields() {
    let mut test = setup().await.unwrap();
    let cache = MemoryCache::new();
    import_fixture(&mut test, &cache).await;

    let repo = KillmailRepository::new(&test.db);
    repo.update_derived(KILLMAIL_ID, KillmailFlags::default(), KillmailValues::default())
        .await
        .unwrap();
    repo.update_ship_value(KILLMAIL_ID, 0.0).await.unwrap();
    for item in repo.find_items(KILLMAIL_ID).await.unwrap() {
        repo.update_item_value(item.id, 0.0, 0.0).await.unwrap();
    }

    let esi = test_client(&test.server_url());
    let updated = Recalculator::new(&test.db, &cache, &esi)
        .recalculate(&KillmailReference::new(KILLMAIL_ID, HASH))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.total_value, 1_250.0);
    assert_eq!(updated.fitted_value, 1_200.0);
    assert!(updated.is_solo);
    assert!(updated.is_awox);

    let victim = repo.find_victim(KILLMAIL_ID).await.unwrap().unwrap();
    assert_eq!(victim.ship_value, SHIP_PRICE);

    let module = repo
        .find_items(KILLMAIL_ID)
        .await
        .unwrap()
        .into_iter()
        .find(|item| item.item_type_id == MODULE_TYPE_ID)
        .unwrap();
    assert_eq!(module.item_value, MODULE_PRICE);
    assert_eq!(module.total_value, 2.0 * MODULE_PRICE);
}

#[tokio::test]
async fn recalculation_is_idempotent() {
    let mut test = setup().await.unwrap();
    let cache = MemoryCache::new();
    import_fixture(&mut test, &cache).await;

    let esi = test_client(&test.server_url());
    let recalculator = Recalculator::new(&test.db, &cache, &esi);
    let reference = KillmailReference::new(KILLMAIL_ID, HASH);

    let first = recalculator.recalculate(&reference).await.unwrap().unwrap();
    let second = recalculator.recalculate(&reference).await.unwrap().unwrap();

    assert_eq!(first.total_value, second.total_value);
    assert_eq!(first.destroyed_value, second.destroyed_value);
    assert_eq!(first.dropped_value, second.dropped_value);
    assert_eq!(
        (first.is_npc, first.is_solo, first.is_awox),
        (second.is_npc, second.is_solo, second.is_awox)
    );
}

#[tokio::test]
async fn missing_killmail_is_ignored() {
    let test = setup().await.unwrap();
    let cache = MemoryCache::new();
    let esi = test_client(&test.server_url());

    let result = Recalculator::new(&test.db, &cache, &esi)
        .recalculate(&KillmailReference::new(KILLMAIL_ID, HASH))
        .await
        .unwrap();

    assert!(result.is_none());
}

#[cfg(feature = "redis-test")]
mod dispatch {
    use super::*;
    use crate::worker::queue::KillmailQueueConfig;

    /// Expect every stored killmail to be queued across several pages
    #[tokio::test]
    async fn queues_every_killmail() {
        let test = setup().await.unwrap();
        for id in 1..=5 {
            killmail::insert_killmail(&test.db, id, &format!("hash{id}"))
                .await
                .unwrap();
        }

        let redis = RedisTest::new().await.unwrap();
        let queue = KillmailQueue::new(
            redis.redis_pool.clone(),
            KillmailQueueConfig::recalculate().with_namespace(redis.namespace()),
        );
        let config = DispatchConfig {
            page_size: 2,
            trigger: 100,
            after_id: 1,
            poll_interval: Duration::from_millis(10),
        };

        let dispatched = super::super::dispatch(&test.db, &queue, &config)
            .await
            .unwrap();

        assert_eq!(dispatched, 4);
        let popped = queue.pop(10).await.unwrap();
        let ids: Vec<i64> = popped.iter().map(|reference| reference.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 2]);

        redis.cleanup().await.unwrap();
    }
}

use std::{sync::Arc, time::Duration};

use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use wreckage::{
    cache::MemoryCache,
    esi::{EsiClient, EsiClientConfig, EsiTracker},
    model::killmail::KillmailReference,
    worker::{ImportHandler, KillmailQueue, KillmailQueueConfig, WorkerPool, WorkerPoolConfig},
};
use wreckage_test_utils::{fixtures::eve::mockito, prelude::*};

const STORED_ID: i64 = 117000010;
const INVALID_ID: i64 = 117000011;

/// Expect stored killmails to be drained and bad hashes parked by the import pool
#[tokio::test]
async fn import_pool_drains_processing_queue() {
    let test = TestBuilder::new()
        .with_status_endpoint(&mockito::killmail_path(INVALID_ID, "bad"), 422, 1)
        .build()
        .await
        .unwrap();
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    killmail::insert_killmail(&db, STORED_ID, "good").await.unwrap();

    let esi = EsiClient::with_config(
        &test.server_url(),
        TEST_USER_AGENT,
        EsiTracker::new(),
        EsiClientConfig {
            retry_backoff: Duration::from_millis(0),
            ..Default::default()
        },
    )
    .unwrap();

    let redis = RedisTest::new().await.unwrap();
    let queue = KillmailQueue::new(
        redis.redis_pool.clone(),
        KillmailQueueConfig::processing().with_namespace(redis.namespace()),
    );
    let stored = KillmailReference::new(STORED_ID, "good");
    let invalid = KillmailReference::new(INVALID_ID, "bad");
    queue.push(&stored, STORED_ID as f64).await.unwrap();
    queue.push(&invalid, INVALID_ID as f64).await.unwrap();

    let handler = ImportHandler::new(db, Arc::new(MemoryCache::new()), esi);
    let mut config = WorkerPoolConfig::new(2);
    config.poll_interval_ms = 10;
    let pool = WorkerPool::new(config, queue.clone(), Arc::new(handler));
    pool.start().await.unwrap();

    for _ in 0..200 {
        if queue.is_empty().await.unwrap() && pool.active_job_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    pool.stop().await.unwrap();

    assert!(queue.is_empty().await.unwrap());
    assert!(queue.is_invalid(&invalid).await.unwrap());
    assert!(!queue.is_invalid(&stored).await.unwrap());
    assert!(queue.dead_letters().await.unwrap().is_empty());
    test.assert_mocks();

    redis.cleanup().await.unwrap();
}

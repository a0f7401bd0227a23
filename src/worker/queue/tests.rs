use wreckage_test_utils::prelude::*;

use super::*;

fn setup_queue(redis: &RedisTest, max_attempts: u32) -> KillmailQueue {
    KillmailQueue::new(
        redis.redis_pool.clone(),
        KillmailQueueConfig::processing()
            .with_namespace(redis.namespace())
            .with_max_attempts(max_attempts),
    )
}

mod push {
    use super::*;

    /// Expect a reference already queued to be ignored
    #[tokio::test]
    async fn duplicate_reference_not_added() {
        let redis = RedisTest::new().await.unwrap();
        let queue = setup_queue(&redis, 5);
        let reference = KillmailReference::new(100, "abc");

        assert!(queue.push(&reference, 100.0).await.unwrap());
        assert!(!queue.push(&reference, 100.0).await.unwrap());
        assert_eq!(queue.len().await.unwrap(), 1);

        redis.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn batch_reports_new_entries() {
        let redis = RedisTest::new().await.unwrap();
        let queue = setup_queue(&redis, 5);

        let entries: Vec<(KillmailReference, f64)> = (1..=3)
            .map(|id| (KillmailReference::new(id, format!("hash{id}")), 0.0))
            .collect();

        assert_eq!(queue.push_batch(&entries).await.unwrap(), 3);
        assert_eq!(queue.push_batch(&entries).await.unwrap(), 0);
        assert_eq!(queue.push_batch(&[]).await.unwrap(), 0);

        redis.cleanup().await.unwrap();
    }
}

mod pop {
    use super::*;

    /// Expect the highest scores first
    #[tokio::test]
    async fn highest_score_first() {
        let redis = RedisTest::new().await.unwrap();
        let queue = setup_queue(&redis, 5);

        for id in [5, 9, 1] {
            queue
                .push(&KillmailReference::new(id, "hash"), id as f64)
                .await
                .unwrap();
        }

        let popped = queue.pop(2).await.unwrap();
        let ids: Vec<i64> = popped.iter().map(|reference| reference.id).collect();

        assert_eq!(ids, vec![9, 5]);
        assert_eq!(queue.len().await.unwrap(), 1);

        redis.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn empty_queue_pops_nothing() {
        let redis = RedisTest::new().await.unwrap();
        let queue = setup_queue(&redis, 5);

        assert!(queue.pop(10).await.unwrap().is_empty());
        assert!(queue.is_empty().await.unwrap());

        redis.cleanup().await.unwrap();
    }

    /// Expect entries written by a misbehaving producer to be parked in the invalid set
    #[tokio::test]
    async fn malformed_entry_moved_to_invalid_set() {
        let redis = RedisTest::new().await.unwrap();
        let queue = setup_queue(&redis, 5);
        let config = queue.config().clone();

        redis
            .redis_pool
            .zadd::<(), _, _>(
                config.queue_key(),
                None,
                None,
                false,
                false,
                (1.0, "not json"),
            )
            .await
            .unwrap();

        assert!(queue.pop(1).await.unwrap().is_empty());

        let parked: bool = redis
            .redis_pool
            .sismember(config.invalid_key(), "not json")
            .await
            .unwrap();
        assert!(parked);

        redis.cleanup().await.unwrap();
    }
}

mod requeue {
    use super::*;

    /// Expect retries at low priority until the attempt ceiling is reached
    #[tokio::test]
    async fn dead_letters_after_max_attempts() {
        let redis = RedisTest::new().await.unwrap();
        let queue = setup_queue(&redis, 3);
        let reference = KillmailReference::new(42, "abc");

        assert_eq!(
            queue.requeue(&reference).await.unwrap(),
            RequeueOutcome::Requeued { attempt: 1 }
        );
        assert_eq!(
            queue.requeue(&reference).await.unwrap(),
            RequeueOutcome::Requeued { attempt: 2 }
        );
        assert_eq!(queue.len().await.unwrap(), 1);

        assert_eq!(
            queue.requeue(&reference).await.unwrap(),
            RequeueOutcome::DeadLettered
        );
        assert_eq!(queue.dead_letters().await.unwrap(), vec![reference]);

        redis.cleanup().await.unwrap();
    }

    /// Expect a successful import to reset the attempt counter
    #[tokio::test]
    async fn complete_resets_attempts() {
        let redis = RedisTest::new().await.unwrap();
        let queue = setup_queue(&redis, 3);
        let reference = KillmailReference::new(42, "abc");

        queue.requeue(&reference).await.unwrap();
        queue.requeue(&reference).await.unwrap();
        queue.complete(&reference).await.unwrap();

        assert_eq!(
            queue.requeue(&reference).await.unwrap(),
            RequeueOutcome::Requeued { attempt: 1 }
        );

        redis.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn retries_yield_to_live_feed() {
        let redis = RedisTest::new().await.unwrap();
        let queue = setup_queue(&redis, 5);
        let failed = KillmailReference::new(500, "old");
        let live = KillmailReference::new(100, "new");

        queue.requeue(&failed).await.unwrap();
        queue.push(&live, live.id as f64).await.unwrap();

        assert_eq!(queue.pop(1).await.unwrap(), vec![live]);

        redis.cleanup().await.unwrap();
    }
}

#[tokio::test]
async fn mark_invalid_is_idempotent() {
    let redis = RedisTest::new().await.unwrap();
    let queue = setup_queue(&redis, 5);
    let reference = KillmailReference::new(7, "bad");

    assert!(queue.mark_invalid(&reference).await.unwrap());
    assert!(!queue.mark_invalid(&reference).await.unwrap());
    assert!(queue.is_invalid(&reference).await.unwrap());

    redis.cleanup().await.unwrap();
}

//! High value killmail notifications.
//!
//! The importer hands notifications to a bounded channel without waiting; a background task
//! drains the channel and publishes each one as JSON on [`NOTIFICATION_CHANNEL`]. When the
//! publisher falls behind and the channel is full, new notifications are dropped.

use std::sync::Arc;

use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

use crate::{cache::Publisher, model::killmail::KillmailNotification};

pub const NOTIFICATION_CHANNEL: &str = "killmail:notifications";
pub const NOTIFICATION_BUFFER: usize = 256;

const ISK_PER_MILLION: f64 = 1_000_000.0;

#[derive(Clone)]
pub struct Notifier {
    sender: mpsc::Sender<KillmailNotification>,
    /// Minimum total value in ISK
    threshold: f64,
}

impl Notifier {
    /// Starts the publisher task, `threshold_millions` is in millions of ISK
    pub fn spawn(publisher: Arc<dyn Publisher>, threshold_millions: f64) -> (Self, JoinHandle<()>) {
        Self::with_capacity(publisher, threshold_millions, NOTIFICATION_BUFFER)
    }

    pub fn with_capacity(
        publisher: Arc<dyn Publisher>,
        threshold_millions: f64,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let handle = tokio::spawn(publish_loop(publisher, receiver));

        (
            Self {
                sender,
                threshold: threshold_millions * ISK_PER_MILLION,
            },
            handle,
        )
    }

    /// Queues a notification when the killmail is worth at least the threshold.
    ///
    /// Returns whether a notification was queued.
    pub fn notify(&self, killmail: &entity::killmail::Model) -> bool {
        if killmail.total_value < self.threshold {
            return false;
        }

        let notification = KillmailNotification {
            id: killmail.id as u64,
            hash: killmail.hash.clone(),
        };

        match self.sender.try_send(notification) {
            Ok(()) => true,
            Err(TrySendError::Full(notification)) => {
                tracing::warn!(
                    killmail_id = notification.id,
                    "notification channel full, dropping notification"
                );
                false
            }
            Err(TrySendError::Closed(notification)) => {
                tracing::warn!(
                    killmail_id = notification.id,
                    "notification publisher stopped, dropping notification"
                );
                false
            }
        }
    }
}

async fn publish_loop(
    publisher: Arc<dyn Publisher>,
    mut receiver: mpsc::Receiver<KillmailNotification>,
) {
    while let Some(notification) = receiver.recv().await {
        let message = match serde_json::to_string(&notification) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(killmail_id = notification.id, "failed to encode notification: {}", e);
                continue;
            }
        };

        if let Err(e) = publisher.publish(NOTIFICATION_CHANNEL, message).await {
            tracing::error!(
                killmail_id = notification.id,
                "failed to publish notification: {}",
                e
            );
        }
    }

    tracing::debug!("notification publisher stopped");
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::cache::MemoryCache;

    fn killmail(id: i64, total_value: f64) -> entity::killmail::Model {
        let now = Utc::now().naive_utc();

        entity::killmail::Model {
            id,
            hash: format!("hash{}", id),
            solar_system_id: 30000142,
            moon_id: None,
            war_id: None,
            killmail_time: now,
            is_npc: false,
            is_awox: false,
            is_solo: false,
            dropped_value: 0.0,
            destroyed_value: total_value,
            fitted_value: 0.0,
            total_value,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn publishes_killmails_above_threshold() {
        let cache = MemoryCache::new();
        let (notifier, handle) = Notifier::spawn(Arc::new(cache.clone()), 10.0);

        assert!(notifier.notify(&killmail(1, 25_000_000.0)));
        assert!(!notifier.notify(&killmail(2, 9_999_999.0)));

        drop(notifier);
        handle.await.unwrap();

        let published = cache.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, NOTIFICATION_CHANNEL);
        assert_eq!(published[0].1, r#"{"id":1,"hash":"hash1"}"#);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn full_channel_drops_notifications() {
        let cache = MemoryCache::new();
        let (notifier, handle) = Notifier::with_capacity(Arc::new(cache.clone()), 0.0, 1);

        // The publisher task cannot run until this task yields, so the second send finds the
        // channel full
        assert!(notifier.notify(&killmail(1, 1.0)));
        assert!(!notifier.notify(&killmail(2, 1.0)));

        drop(notifier);
        handle.await.unwrap();

        assert_eq!(cache.published().await.len(), 1);
    }
}

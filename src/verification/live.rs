/// Change-feed driven refresh of the verification console
use crate::{
    metrics,
    verification::{
        coordinator::{ConsoleHandle, RefreshMode},
        source::{FeedItem, Subscription},
    },
};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Running change-feed listener
///
/// The subscription lives inside the listener task; stopping or dropping
/// this guard ends the task and releases it.
pub struct LiveUpdates {
    task: JoinHandle<()>,
}

impl LiveUpdates {
    /// Refresh `console` silently on every notification from `subscription`
    ///
    /// Notifications arriving during `debounce`, or while a refresh is being
    /// prepared, are collapsed into that refresh.
    pub fn spawn(console: ConsoleHandle, subscription: Subscription, debounce: Duration) -> Self {
        let task = tokio::spawn(listen(console, subscription, debounce));
        Self { task }
    }

    /// Stop listening. Safe to call more than once.
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for LiveUpdates {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn listen(console: ConsoleHandle, mut subscription: Subscription, debounce: Duration) {
    info!("verification live updates started");

    while let Some(item) = subscription.next().await {
        match item {
            FeedItem::Change(event) => {
                debug!(kind = event.kind.as_str(), request_id = %event.request_id, "verification change");
            }
            FeedItem::Lagged(skipped) => {
                warn!(skipped, "verification change feed lagged");
            }
        }

        if !debounce.is_zero() {
            sleep(debounce).await;
        }

        let collapsed = subscription.drain();
        if collapsed > 0 {
            metrics::record_collapsed_events("console", collapsed);
            debug!(collapsed, "collapsed queued verification changes");
        }

        // Failures are logged by the coordinator and leave prior data in place
        let _ = console.refresh(RefreshMode::Silent).await;
    }

    info!("verification live updates stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KlikResult;
    use crate::verification::coordinator::ViewCoordinator;
    use crate::verification::models::{VerificationRequest, VerificationStatus};
    use crate::verification::source::{ChangeEvent, ChangeFeed, ChangeKind, RecordSource};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory source whose snapshot tests mutate directly
    struct MemorySource {
        rows: Mutex<Vec<VerificationRequest>>,
        fetches: AtomicUsize,
        feed: ChangeFeed,
    }

    #[async_trait]
    impl RecordSource for MemorySource {
        async fn fetch_all(&self) -> KlikResult<Vec<VerificationRequest>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.lock().unwrap().clone())
        }

        fn subscribe(&self) -> Subscription {
            self.feed.subscribe()
        }

        async fn create(&self, user_id: &str, _document_url: &str) -> KlikResult<bool> {
            let id = format!("req-{}", user_id);
            self.rows.lock().unwrap().push(VerificationRequest {
                id: id.clone(),
                user_id: user_id.to_string(),
                status: VerificationStatus::Pending,
                created_at: Utc::now(),
                document_url: None,
                reviewed_by: None,
                reviewed_at: None,
                profile: None,
            });
            self.feed.publish(ChangeEvent {
                kind: ChangeKind::Insert,
                request_id: id,
            });
            Ok(true)
        }
    }

    fn memory_source() -> Arc<MemorySource> {
        Arc::new(MemorySource {
            rows: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
            feed: ChangeFeed::new(),
        })
    }

    async fn wait_for_total(console: &ConsoleHandle, total: usize) {
        for _ in 0..200 {
            if console.read().await.stats().total == total {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("console never reached {} requests", total);
    }

    #[tokio::test]
    async fn test_change_triggers_silent_refresh() {
        let source = memory_source();
        let console = ConsoleHandle::new(ViewCoordinator::new(source.clone()));
        console.load().await.unwrap();
        let mut notices = console.read().await.subscribe_notices();

        let live = LiveUpdates::spawn(console.clone(), source.subscribe(), Duration::ZERO);
        source.create("u1", "a.jpg").await.unwrap();

        wait_for_total(&console, 1).await;
        assert!(live.is_running());
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_burst_is_collapsed() {
        let source = memory_source();
        let console = ConsoleHandle::new(ViewCoordinator::new(source.clone()));
        console.load().await.unwrap();

        let _live = LiveUpdates::spawn(console.clone(), source.subscribe(), Duration::from_millis(50));
        for i in 0..10 {
            source.create(&i.to_string(), "a.jpg").await.unwrap();
        }

        wait_for_total(&console, 10).await;
        sleep(Duration::from_millis(100)).await;
        // One initial load plus far fewer refreshes than notifications
        assert!(source.fetches.load(Ordering::SeqCst) < 11);
    }

    #[tokio::test]
    async fn test_stop_releases_subscription() {
        let source = memory_source();
        let console = ConsoleHandle::new(ViewCoordinator::new(source.clone()));
        console.load().await.unwrap();

        let live = LiveUpdates::spawn(console.clone(), source.subscribe(), Duration::ZERO);
        assert_eq!(source.feed.subscriber_count(), 1);

        live.stop();
        live.stop();
        for _ in 0..100 {
            if source.feed.subscriber_count() == 0 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(source.feed.subscriber_count(), 0);

        source.create("late", "a.jpg").await.unwrap();
        sleep(Duration::from_millis(50)).await;
        assert_eq!(console.read().await.stats().total, 0);
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let source = memory_source();
        let console = ConsoleHandle::new(ViewCoordinator::new(source.clone()));

        {
            let _live = LiveUpdates::spawn(console.clone(), source.subscribe(), Duration::ZERO);
        }
        for _ in 0..100 {
            if source.feed.subscriber_count() == 0 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(source.feed.subscriber_count(), 0);
    }
}

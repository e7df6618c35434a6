/// Record source abstraction and its change feed
use crate::error::KlikResult;
use crate::verification::models::VerificationRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capacity of the change-feed channel before slow subscribers lag
const FEED_CAPACITY: usize = 256;

/// Kind of row change on the verification-request table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

/// Notification that a verification request may have changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub request_id: String,
}

/// Backend access used by the console
///
/// Implementations return full snapshots; the console never merges partial
/// results.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch every verification request, with the joined profile
    async fn fetch_all(&self) -> KlikResult<Vec<VerificationRequest>>;

    /// Subscribe to insert/update/delete notifications
    fn subscribe(&self) -> Subscription;

    /// Submit a new pending request
    async fn create(&self, user_id: &str, document_url: &str) -> KlikResult<bool>;
}

/// Publisher side of a change feed
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Notify every live subscriber. Returns how many received it.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: Some(self.tx.subscribe()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a change feed
///
/// Dropping the subscription releases it; `unsubscribe` does the same
/// explicitly and may be called any number of times.
pub struct Subscription {
    rx: Option<broadcast::Receiver<ChangeEvent>>,
}

/// What a subscription yielded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    Change(ChangeEvent),
    /// Events were dropped because the subscriber fell behind
    Lagged(u64),
}

impl Subscription {
    /// Wait for the next notification; `None` once released or the feed is gone
    pub async fn next(&mut self) -> Option<FeedItem> {
        let rx = self.rx.as_mut()?;
        match rx.recv().await {
            Ok(event) => Some(FeedItem::Change(event)),
            Err(broadcast::error::RecvError::Lagged(skipped)) => Some(FeedItem::Lagged(skipped)),
            Err(broadcast::error::RecvError::Closed) => {
                self.rx = None;
                None
            }
        }
    }

    /// Take everything already queued without waiting
    pub fn drain(&mut self) -> usize {
        let Some(rx) = self.rx.as_mut() else {
            return 0;
        };

        let mut drained = 0;
        loop {
            match rx.try_recv() {
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => drained += 1,
                Err(_) => break,
            }
        }
        drained
    }

    pub fn unsubscribe(&mut self) {
        self.rx = None;
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}

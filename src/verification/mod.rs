/// Identity-verification console
///
/// Observes verification requests through a `RecordSource`, derives stats
/// and the filtered request list, and keeps them fresh from the source's
/// change feed.

pub mod coordinator;
pub mod filter;
pub mod live;
pub mod models;
pub mod source;
pub mod stats;
pub mod store;

pub use coordinator::{
    ConsoleHandle, ConsoleNotice, ConsolePhase, ConsoleView, RefreshMode, ViewCoordinator,
};
pub use filter::filter_requests;
pub use live::LiveUpdates;
pub use models::*;
pub use source::{ChangeEvent, ChangeFeed, ChangeKind, FeedItem, RecordSource, Subscription};
pub use stats::{
    compute_stats, compute_stats_at, monthly_submissions, percentage, MonthlyBucket, StatCard,
    StatCards, Stats,
};
pub use store::VerificationStore;

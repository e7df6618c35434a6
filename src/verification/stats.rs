/// Aggregate counts over a verification-request snapshot
use crate::verification::models::{VerificationRequest, VerificationStatus};
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default length of the recent-submissions window
pub const LAST_WEEK_DAYS: i64 = 7;

/// Count summary of a snapshot
///
/// `pending + approved + rejected + other == total` for every snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Records whose status is none of the three known values
    pub other: usize,
    pub last_week: usize,
}

/// Stats computed against the current instant and the default window
pub fn compute_stats(snapshot: &[VerificationRequest]) -> Stats {
    compute_stats_at(snapshot, Utc::now(), Duration::days(LAST_WEEK_DAYS))
}

/// Stats computed against an explicit reference instant
///
/// A record counts toward `last_week` when `created_at >= now - window`.
pub fn compute_stats_at(
    snapshot: &[VerificationRequest],
    now: DateTime<Utc>,
    window: Duration,
) -> Stats {
    // A window reaching past the representable range covers everything
    let cutoff = now
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut stats = Stats {
        total: snapshot.len(),
        ..Stats::default()
    };

    for request in snapshot {
        match request.status {
            VerificationStatus::Pending => stats.pending += 1,
            VerificationStatus::Approved => stats.approved += 1,
            VerificationStatus::Rejected => stats.rejected += 1,
            VerificationStatus::Unrecognized(_) => stats.other += 1,
        }

        if request.created_at >= cutoff {
            stats.last_week += 1;
        }
    }

    stats
}

/// Rounded share of `part` in `total`, 0 when `total` is 0
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * part as f64 / total as f64).round() as u32
}

/// One stat card: a count and its share of the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCard {
    pub count: usize,
    pub percentage: u32,
}

/// The four cards rendered above the request list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCards {
    pub total: StatCard,
    pub pending: StatCard,
    pub approved: StatCard,
    pub rejected: StatCard,
}

impl Stats {
    pub fn cards(&self) -> StatCards {
        let card = |count| StatCard {
            count,
            percentage: percentage(count, self.total),
        };

        StatCards {
            total: card(self.total),
            pending: card(self.pending),
            approved: card(self.approved),
            rejected: card(self.rejected),
        }
    }
}

/// Submissions received in one calendar month (UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
}

fn month_index(at: DateTime<Utc>) -> i64 {
    at.year() as i64 * 12 + at.month0() as i64
}

/// Submissions per month for the trailing `months` months, oldest first
///
/// Empty months are included with a zero count; records outside the window
/// are ignored.
pub fn monthly_submissions(
    snapshot: &[VerificationRequest],
    months: u32,
    now: DateTime<Utc>,
) -> Vec<MonthlyBucket> {
    if months == 0 {
        return Vec::new();
    }

    let end = month_index(now);
    let start = end - (months as i64 - 1);

    let mut buckets: Vec<MonthlyBucket> = (start..=end)
        .map(|idx| MonthlyBucket {
            month: format!("{:04}-{:02}", idx.div_euclid(12), idx.rem_euclid(12) + 1),
            count: 0,
        })
        .collect();

    for request in snapshot {
        let idx = month_index(request.created_at);
        if (start..=end).contains(&idx) {
            buckets[(idx - start) as usize].count += 1;
        }
    }

    buckets
}

/// Verification request data models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review status of a verification request
///
/// Rows carrying a value outside the three known statuses are kept as
/// `Unrecognized` so aggregation can report them instead of dropping them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
    Unrecognized(String),
}

impl VerificationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
            VerificationStatus::Unrecognized(raw) => raw,
        }
    }

    /// Exact, case-sensitive match against the stored value
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => VerificationStatus::Pending,
            "approved" => VerificationStatus::Approved,
            "rejected" => VerificationStatus::Rejected,
            other => VerificationStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, VerificationStatus::Unrecognized(_))
    }
}

impl From<String> for VerificationStatus {
    fn from(raw: String) -> Self {
        VerificationStatus::parse(&raw)
    }
}

impl From<VerificationStatus> for String {
    fn from(status: VerificationStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Joined profile columns used for search and display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// One identity-verification submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: String,
    pub user_id: String,
    pub status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    pub document_url: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub profile: Option<Profile>,
}

impl VerificationRequest {
    /// Profile full name, empty when the join produced nothing
    pub fn full_name(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.full_name.as_deref())
            .unwrap_or("")
    }

    /// Profile phone number, empty when the join produced nothing
    pub fn phone(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.phone.as_deref())
            .unwrap_or("")
    }
}

/// Status selection of the console filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
    Rejected,
}

impl StatusFilter {
    /// Whether a record with `status` passes this filter
    pub fn matches(&self, status: &VerificationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => *status == VerificationStatus::Pending,
            StatusFilter::Approved => *status == VerificationStatus::Approved,
            StatusFilter::Rejected => *status == VerificationStatus::Rejected,
        }
    }
}

/// User-controlled search text and status selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub search_query: String,
    pub status_filter: StatusFilter,
}

impl FilterState {
    pub fn new(search_query: impl Into<String>, status_filter: StatusFilter) -> Self {
        Self {
            search_query: search_query.into(),
            status_filter,
        }
    }

    pub fn has_active_filters(&self) -> bool {
        !self.search_query.is_empty() || self.status_filter != StatusFilter::All
    }
}

/// Outcome of an administrator review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn status(&self) -> VerificationStatus {
        match self {
            ReviewDecision::Approve => VerificationStatus::Approved,
            ReviewDecision::Reject => VerificationStatus::Rejected,
        }
    }
}

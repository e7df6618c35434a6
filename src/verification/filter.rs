/// Search and status filtering over a snapshot
use crate::verification::models::{FilterState, VerificationRequest};

/// Narrow `snapshot` to the records passing `filter`, preserving input order
pub fn filter_requests(
    snapshot: &[VerificationRequest],
    filter: &FilterState,
) -> Vec<VerificationRequest> {
    let query = filter.search_query.trim().to_lowercase();

    snapshot
        .iter()
        .filter(|request| filter.status_filter.matches(&request.status))
        .filter(|request| query.is_empty() || matches_search(request, &query))
        .cloned()
        .collect()
}

/// `query` must already be trimmed and lower-cased
fn matches_search(request: &VerificationRequest, query: &str) -> bool {
    request.full_name().to_lowercase().contains(query)
        || request.phone().to_lowercase().contains(query)
}

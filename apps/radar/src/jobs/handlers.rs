use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};

use crate::errors::AppError;
use crate::jobs::fetcher::FetchSummary;
use crate::jobs::source::JobQueryOverrides;
use crate::state::JobFetcherState;

/// POST /fetch-jobs
/// Body is optional; any field present overrides the configured search.
pub async fn handle_fetch_jobs(
    State(state): State<JobFetcherState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<FetchSummary>, AppError> {
    let overrides = parse_overrides(&headers, &body)?;
    let query = state.default_query.with_overrides(overrides);

    let summary = state
        .fetcher
        .run_once(&query)
        .await
        .map_err(|e| AppError::Upstream(format!("Job search failed: {e}")))?;
    Ok(Json(summary))
}

/// An empty body or one sent without a content type means "no overrides".
/// Anything else must be a well-formed overrides object.
fn parse_overrides(headers: &HeaderMap, body: &[u8]) -> Result<JobQueryOverrides, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) || !headers.contains_key(header::CONTENT_TYPE) {
        return Ok(JobQueryOverrides::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid fetch-jobs body: {e}")))
}

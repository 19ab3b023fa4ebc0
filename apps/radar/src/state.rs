use std::sync::Arc;

use crate::jobs::{JobFetcher, JobQuery};
use crate::resumes::ResumeAnalyzer;

/// State for the job fetcher's routes.
#[derive(Clone)]
pub struct JobFetcherState {
    pub fetcher: Arc<JobFetcher>,
    /// Search used when a request does not override it.
    pub default_query: JobQuery,
}

/// State for the resume analyzer's routes.
#[derive(Clone)]
pub struct ResumeAnalyzerState {
    pub analyzer: Arc<ResumeAnalyzer>,
}
